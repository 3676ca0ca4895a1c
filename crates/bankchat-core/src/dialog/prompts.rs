//! Fixed follow-up questions, keyed by intent and parameter.

use bankchat_types::intent::names;

/// Question asking for `param` while completing `intent`.
pub fn question_for(intent: &str, param: &str) -> String {
    let known = match (intent, param) {
        (names::FUND_TRANSFER, "amount") => "How much would you like to transfer?",
        (names::FUND_TRANSFER, "method") => {
            "Which transfer method would you prefer?\n1. UPI (Instant)\n2. IMPS (Instant)\n3. NEFT (Up to 2 hours)\n4. RTGS (Real-time for large amounts)"
        }
        (names::FUND_TRANSFER, "recipient") => {
            "Who would you like to transfer money to? (Payee name or account number)"
        }
        (names::ADD_PAYEE, "payee_name") => "What's the payee's name?",
        (names::ADD_PAYEE, "account_number") => "Please provide the payee's account number.",
        (names::ADD_PAYEE, "ifsc_code") => "What's the IFSC code of the payee's bank branch?",
        (names::LOAN_APPLICATION, "loan_type") => {
            "Which type of loan are you interested in?\n1. Personal Loan\n2. Home Loan\n3. Car Loan\n4. Education Loan"
        }
        (names::LOAN_APPLICATION, "amount") => "What loan amount would you like?",
        (names::LOAN_APPLICATION, "tenure") => "What loan tenure (in months) would you prefer?",
        (names::LOAN_APPLICATION, "interest_rate") => "What's the annual interest rate for this loan?",
        _ => return generic_question(param),
    };
    known.to_string()
}

/// Question used when a supplied value for `param` was rejected.
pub fn invalid_value_question(intent: &str, param: &str) -> String {
    let known = match (intent, param) {
        (_, "amount") => "Please enter a valid amount greater than 0.",
        (_, "method") => "Please choose a valid transfer method: UPI, IMPS, NEFT or RTGS.",
        (_, "ifsc_code") => "Please provide a valid IFSC code (e.g., SBIN0001234).",
        (_, "account_number") => "Please provide a valid account number (9 to 18 digits).",
        (_, "loan_type") => "Please choose a loan type: personal, home, car or education.",
        (_, "tenure") => "Please provide the tenure as a whole number of months.",
        _ => {
            return format!(
                "The {} you gave doesn't look right. {}",
                humanize(param),
                question_for(intent, param)
            );
        }
    };
    known.to_string()
}

fn generic_question(param: &str) -> String {
    format!("Please provide the {}.", humanize(param))
}

fn humanize(param: &str) -> String {
    param.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pairs_have_specific_questions() {
        assert!(question_for("fund_transfer", "method").contains("UPI"));
        assert!(question_for("add_payee", "ifsc_code").contains("IFSC"));
        assert!(question_for("loan_application", "loan_type").contains("Home Loan"));
    }

    #[test]
    fn same_param_differs_by_intent() {
        assert_ne!(
            question_for("fund_transfer", "amount"),
            question_for("loan_application", "amount")
        );
    }

    #[test]
    fn unknown_pair_falls_back_to_generic() {
        assert_eq!(question_for("check_balance", "pin"), "Please provide the pin.");
        assert_eq!(question_for("nope", "branch_code"), "Please provide the branch code.");
    }

    #[test]
    fn invalid_question_for_unknown_param_repeats_question() {
        let q = invalid_value_question("add_payee", "payee_name");
        assert!(q.starts_with("The payee name you gave"));
        assert!(q.ends_with("What's the payee's name?"));
    }
}
