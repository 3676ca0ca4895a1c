//! Equated monthly instalment arithmetic.

use bankchat_types::banking::EmiBreakdown;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reducing-balance EMI for `principal` at `annual_rate` percent over
/// `tenure_months`.
///
/// A zero rate divides the principal evenly. A zero tenure yields a
/// breakdown with every amount zero except the principal.
pub fn calculate_emi(principal: f64, annual_rate: f64, tenure_months: u32) -> EmiBreakdown {
    if tenure_months == 0 || principal <= 0.0 {
        return EmiBreakdown {
            principal,
            annual_rate,
            tenure_months,
            emi: 0.0,
            total_amount: 0.0,
            total_interest: 0.0,
        };
    }

    let n = tenure_months as f64;
    let emi = if annual_rate <= 0.0 {
        principal / n
    } else {
        let r = annual_rate / 12.0 / 100.0;
        let growth = (1.0 + r).powf(n);
        principal * r * growth / (growth - 1.0)
    };
    let emi = round2(emi);
    let total_amount = round2(emi * n);

    EmiBreakdown {
        principal,
        annual_rate,
        tenure_months,
        emi,
        total_amount,
        total_interest: round2(total_amount - principal),
    }
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleRow {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

/// Month-by-month split of each instalment into interest and principal.
///
/// The final row absorbs rounding so the balance ends at zero.
pub fn amortization_schedule(principal: f64, annual_rate: f64, tenure_months: u32) -> Vec<ScheduleRow> {
    let breakdown = calculate_emi(principal, annual_rate, tenure_months);
    let r = annual_rate.max(0.0) / 12.0 / 100.0;

    let mut balance = principal;
    let mut rows = Vec::with_capacity(tenure_months as usize);
    for month in 1..=tenure_months {
        let interest = round2(balance * r);
        let mut principal_part = round2(breakdown.emi - interest);
        if month == tenure_months || principal_part > balance {
            principal_part = round2(balance);
        }
        balance = round2(balance - principal_part);
        rows.push(ScheduleRow {
            month,
            payment: round2(principal_part + interest),
            principal: principal_part,
            interest,
            balance,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_lakh_at_twelve_percent_for_a_year() {
        let b = calculate_emi(100_000.0, 12.0, 12);
        assert_eq!(b.emi, 8884.88);
        assert_eq!(b.total_amount, 106_618.56);
        assert_eq!(b.total_interest, 6618.56);
    }

    #[test]
    fn zero_rate_splits_evenly() {
        let b = calculate_emi(12_000.0, 0.0, 12);
        assert_eq!(b.emi, 1000.0);
        assert_eq!(b.total_interest, 0.0);
    }

    #[test]
    fn zero_tenure_is_all_zero() {
        let b = calculate_emi(50_000.0, 10.0, 0);
        assert_eq!(b.emi, 0.0);
        assert_eq!(b.total_amount, 0.0);
    }

    #[test]
    fn schedule_pays_down_to_zero() {
        let rows = amortization_schedule(100_000.0, 12.0, 12);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].interest, 1000.0);
        assert_eq!(rows[0].principal, 7884.88);
        assert_eq!(rows.last().unwrap().balance, 0.0);
        let paid: f64 = rows.iter().map(|r| r.principal).sum();
        assert!((paid - 100_000.0).abs() < 0.01);
    }
}
