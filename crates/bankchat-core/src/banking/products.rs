//! The loan product catalog.

use bankchat_types::banking::{LoanProduct, LoanType};

/// Tenure used when the customer does not name one.
pub const DEFAULT_TENURE_MONTHS: u32 = 24;

pub fn loan_product(loan_type: LoanType) -> LoanProduct {
    let (name, min_amount, max_amount, interest_rate, max_tenure_months, processing_fee) =
        match loan_type {
            LoanType::Personal => ("Personal Loan", 50_000.0, 2_500_000.0, 12.0, 60, 2.0),
            LoanType::Home => ("Home Loan", 500_000.0, 50_000_000.0, 8.5, 300, 0.5),
            LoanType::Car => ("Car Loan", 100_000.0, 5_000_000.0, 9.5, 84, 1.0),
            LoanType::Education => ("Education Loan", 50_000.0, 7_500_000.0, 10.5, 120, 1.0),
        };
    LoanProduct {
        loan_type,
        name: name.to_string(),
        min_amount,
        max_amount,
        interest_rate,
        max_tenure_months,
        processing_fee,
    }
}

pub fn all_products() -> Vec<LoanProduct> {
    LoanType::ALL.into_iter().map(loan_product).collect()
}

/// Reason a request falls outside the product's bounds, if any.
pub fn check_bounds(product: &LoanProduct, amount: f64, tenure_months: u32) -> Result<(), String> {
    if amount < product.min_amount || amount > product.max_amount {
        return Err(format!(
            "{} amounts range from ₹{:.0} to ₹{:.0}.",
            product.name, product.min_amount, product.max_amount
        ));
    }
    if tenure_months == 0 || tenure_months > product.max_tenure_months {
        return Err(format!(
            "{} tenure can be 1 to {} months.",
            product.name, product.max_tenure_months
        ));
    }
    Ok(())
}
