//! Transfer fee schedule and per-method amount limits.

use bankchat_types::banking::TransferMethod;

pub const UPI_MAX: f64 = 100_000.0;
pub const RTGS_MIN: f64 = 200_000.0;

/// Flat fee charged for sending `amount` with `method`.
pub fn transfer_fee(method: TransferMethod, amount: f64) -> f64 {
    match method {
        TransferMethod::Upi => 0.0,
        TransferMethod::Imps => {
            if amount <= 10_000.0 {
                5.0
            } else if amount <= 100_000.0 {
                15.0
            } else {
                25.0
            }
        }
        TransferMethod::Neft => {
            if amount <= 10_000.0 {
                2.5
            } else if amount <= 100_000.0 {
                5.0
            } else {
                15.0
            }
        }
        TransferMethod::Rtgs => {
            if amount <= 200_000.0 {
                25.0
            } else {
                50.0
            }
        }
    }
}

/// Reason `amount` cannot go through `method`, if any.
pub fn check_limits(method: TransferMethod, amount: f64) -> Result<(), String> {
    if amount <= 0.0 {
        return Err("Amount must be greater than zero.".to_string());
    }
    match method {
        TransferMethod::Upi if amount > UPI_MAX => Err(format!(
            "UPI transfers are limited to ₹{UPI_MAX:.0}. Please choose IMPS, NEFT or RTGS."
        )),
        TransferMethod::Rtgs if amount < RTGS_MIN => Err(format!(
            "RTGS requires a minimum of ₹{RTGS_MIN:.0}. Please choose UPI, IMPS or NEFT."
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_tiers() {
        assert_eq!(transfer_fee(TransferMethod::Upi, 50_000.0), 0.0);
        assert_eq!(transfer_fee(TransferMethod::Imps, 10_000.0), 5.0);
        assert_eq!(transfer_fee(TransferMethod::Imps, 10_000.01), 15.0);
        assert_eq!(transfer_fee(TransferMethod::Imps, 500_000.0), 25.0);
        assert_eq!(transfer_fee(TransferMethod::Neft, 500.0), 2.5);
        assert_eq!(transfer_fee(TransferMethod::Neft, 150_000.0), 15.0);
        assert_eq!(transfer_fee(TransferMethod::Rtgs, 200_000.0), 25.0);
        assert_eq!(transfer_fee(TransferMethod::Rtgs, 300_000.0), 50.0);
    }

    #[test]
    fn limits_per_method() {
        assert!(check_limits(TransferMethod::Upi, 100_000.0).is_ok());
        assert!(check_limits(TransferMethod::Upi, 100_001.0).is_err());
        assert!(check_limits(TransferMethod::Rtgs, 199_999.0).is_err());
        assert!(check_limits(TransferMethod::Neft, 5.0).is_ok());
        assert!(check_limits(TransferMethod::Imps, 0.0).is_err());
    }
}
