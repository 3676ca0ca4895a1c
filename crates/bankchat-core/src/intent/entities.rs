//! Regex entity extraction, specific to each intent.
//!
//! Absence of a match omits the key; extraction never fails once the
//! extractor is built.

use std::collections::BTreeMap;

use bankchat_types::banking::LoanType;
use bankchat_types::intent::names;
use regex::Regex;

/// Words that end a free-text name capture.
const NAME_STOPWORDS: &[&str] = &[
    "account", "acc", "a/c", "with", "ifsc", "number", "bank", "and", "for", "to", "via", "code",
];

/// Words that cannot be a transfer recipient.
const RECIPIENT_STOPWORDS: &[&str] = &["account", "via", "using", "through", "me"];

/// Compiled extraction patterns.
#[derive(Debug)]
pub struct EntityExtractor {
    amount: Regex,
    recipient: Regex,
    method: Regex,
    payee_name: Regex,
    account_number: Regex,
    source_account: Regex,
    balance_account: Regex,
    ifsc: Regex,
    loan_type: Regex,
    tenure: Regex,
    interest_rate: Regex,
    account_type: Regex,
}

impl EntityExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            amount: Regex::new(r"(?i)(₹|\brs\.?|\binr)?\s*(\d[\d,]*)(\.\d{1,2})?")?,
            recipient: Regex::new(r"(?i)\b(?:to|for)\s+(?:(?:my|the|a|an)\s+)?([a-z0-9@._-]+)")?,
            method: Regex::new(r"(?i)\b(upi|imps|neft|rtgs)\b")?,
            payee_name: Regex::new(
                r"(?i)\b(?:payee|beneficiary|name\s+is)\s+(?:named\s+|called\s+)?([a-z][a-z.'-]*(?:\s+[a-z][a-z.'-]*){0,3})",
            )?,
            account_number: Regex::new(r"\b(\d{9,18})\b")?,
            source_account: Regex::new(
                r"(?i)\bfrom\s+(?:my\s+|the\s+)?(?:(savings|current)\b|(?:account\s+(?:number\s+|no\.?\s*)?)?(\d{9,18}|acc_\d+)\b)",
            )?,
            balance_account: Regex::new(r"(?i)\baccount\s+(?:number\s+|no\.?\s*)?(\d{4,18})\b")?,
            ifsc: Regex::new(r"(?i)\b([a-z]{4}0[a-z0-9]{6})\b")?,
            loan_type: Regex::new(
                r"(?i)\b(personal|home|housing|car|auto|vehicle|education|student)\b",
            )?,
            tenure: Regex::new(r"(?i)\b(\d{1,3})\s*(months?|mos?|years?|yrs?)\b")?,
            interest_rate: Regex::new(r"(\d{1,2}(?:\.\d{1,2})?)\s*%")?,
            account_type: Regex::new(r"(?i)\b(savings|current)\b")?,
        })
    }

    /// Extract the entities relevant to `intent` from `utterance`.
    pub fn extract(&self, utterance: &str, intent: &str) -> BTreeMap<String, String> {
        let mut entities = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                entities.insert(key.to_string(), value);
            }
        };

        match intent {
            names::FUND_TRANSFER => {
                put("amount", self.amount(utterance));
                put("recipient", self.recipient(utterance));
                put("method", self.method(utterance));
                let source = self.source_account(utterance);
                let destination = self
                    .account_number
                    .captures_iter(utterance)
                    .filter_map(|caps| caps.get(1))
                    .map(|m| m.as_str())
                    .find(|number| source.as_deref() != Some(*number))
                    .map(str::to_string);
                put("account_number", destination);
                put("from_account", source);
            }
            names::CHECK_BALANCE => {
                put("account_number", self.first(&self.balance_account, utterance));
                put("account_type", self.first(&self.account_type, utterance).map(|t| t.to_lowercase()));
            }
            names::ADD_PAYEE => {
                put("payee_name", self.payee_name(utterance));
                put("account_number", self.first(&self.account_number, utterance));
                put("ifsc_code", self.first(&self.ifsc, utterance).map(|c| c.to_uppercase()));
            }
            names::LOAN_APPLICATION => {
                put("loan_type", self.loan_type(utterance));
                put("amount", self.amount(utterance));
                put("tenure", self.tenure(utterance));
                put("interest_rate", self.first(&self.interest_rate, utterance));
                put("action", loan_action(utterance));
            }
            _ => {}
        }
        entities
    }

    fn first(&self, re: &Regex, text: &str) -> Option<String> {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// First number that reads as a money amount.
    ///
    /// Skips digits glued to letters (IFSC codes), bare runs of nine or more
    /// digits (account numbers), and numbers followed by a time unit or `%`.
    /// Understands `k`, `lakh` and `crore` suffixes.
    fn amount(&self, text: &str) -> Option<String> {
        for caps in self.amount.captures_iter(text) {
            let Some(digits) = caps.get(2) else { continue };
            let has_currency = caps.get(1).is_some();

            let glued = text[..digits.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if glued && !has_currency {
                continue;
            }

            let raw: String = digits.as_str().chars().filter(|c| *c != ',').collect();
            if raw.is_empty() || (!has_currency && raw.len() >= 9) {
                continue;
            }

            let rest = text[caps.get(0).map_or(digits.end(), |m| m.end())..]
                .trim_start()
                .to_lowercase();
            if ["month", "mo ", "mos", "year", "yr", "%", "day"]
                .iter()
                .any(|unit| rest.starts_with(unit))
                || rest == "mo"
            {
                continue;
            }

            let fraction = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            let value = format!("{raw}{fraction}");
            return Some(apply_multiplier(&value, &rest));
        }
        None
    }

    fn recipient(&self, text: &str) -> Option<String> {
        self.recipient
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|word| !RECIPIENT_STOPWORDS.contains(&word.to_lowercase().as_str()))
            .map(str::to_string)
    }

    /// Account to debit: an account type, number or id after "from".
    fn source_account(&self, text: &str) -> Option<String> {
        let caps = self.source_account.captures(text)?;
        caps.get(1)
            .map(|kind| kind.as_str().to_lowercase())
            .or_else(|| caps.get(2).map(|id| id.as_str().to_uppercase()))
    }

    fn method(&self, text: &str) -> Option<String> {
        self.first(&self.method, text).map(|m| m.to_uppercase())
    }

    fn payee_name(&self, text: &str) -> Option<String> {
        let captured = self.first(&self.payee_name, text)?;
        let words: Vec<&str> = captured
            .split_whitespace()
            .take_while(|w| !NAME_STOPWORDS.contains(&w.to_lowercase().as_str()))
            .collect();
        if words.is_empty() {
            None
        } else {
            Some(words.join(" "))
        }
    }

    fn loan_type(&self, text: &str) -> Option<String> {
        self.first(&self.loan_type, text)
            .and_then(|t| t.parse::<LoanType>().ok())
            .map(|t| t.to_string())
    }

    /// Tenure normalized to months.
    fn tenure(&self, text: &str) -> Option<String> {
        let caps = self.tenure.captures(text)?;
        let count: u32 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_lowercase();
        let months = if unit.starts_with('y') { count * 12 } else { count };
        Some(months.to_string())
    }
}

fn apply_multiplier(value: &str, rest: &str) -> String {
    let factor = if rest.starts_with("lakh") || rest.starts_with("lac") {
        100_000.0
    } else if rest.starts_with("crore") || rest.starts_with("cr ") || rest == "cr" {
        10_000_000.0
    } else if rest == "k" || rest.starts_with("k ") {
        1_000.0
    } else {
        return value.to_string();
    };
    match value.parse::<f64>() {
        Ok(n) => {
            let scaled = n * factor;
            if scaled.fract() == 0.0 {
                format!("{scaled:.0}")
            } else {
                format!("{scaled:.2}")
            }
        }
        Err(_) => value.to_string(),
    }
}

fn loan_action(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let action = if lower.contains("eligib") {
        "eligibility"
    } else if lower.contains("emi") || lower.contains("calculat") {
        "calculate"
    } else if lower.contains("apply") || lower.contains("application") {
        "apply"
    } else if lower.contains("rate") || lower.contains("info") || lower.contains("details") {
        "info"
    } else {
        return None;
    };
    Some(action.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new().unwrap()
    }

    #[test]
    fn transfer_amount_recipient_method() {
        let e = extractor().extract("transfer 500 to john via upi", names::FUND_TRANSFER);
        assert_eq!(e["amount"], "500");
        assert_eq!(e["recipient"], "john");
        assert_eq!(e["method"], "UPI");
        assert!(!e.contains_key("account_number"));
    }

    #[test]
    fn transfer_source_account() {
        let x = extractor();
        let e = x.extract("transfer 500 to john from my current account", names::FUND_TRANSFER);
        assert_eq!(e["from_account"], "current");
        assert_eq!(e["recipient"], "john");

        let e = x.extract(
            "send 1000 to 123456789012 from account 0987654321 via neft",
            names::FUND_TRANSFER,
        );
        assert_eq!(e["from_account"], "0987654321");
        assert_eq!(e["account_number"], "123456789012");

        let e = x.extract("from acc_002 send 250 to sam", names::FUND_TRANSFER);
        assert_eq!(e["from_account"], "ACC_002");
        assert_eq!(e["amount"], "250");
    }

    #[test]
    fn amount_with_currency_commas_and_decimals() {
        let x = extractor();
        assert_eq!(x.extract("send ₹1,500.50 to amy", names::FUND_TRANSFER)["amount"], "1500.50");
        assert_eq!(x.extract("pay Rs. 2000 to bob", names::FUND_TRANSFER)["amount"], "2000");
        assert_eq!(x.extract("500", names::FUND_TRANSFER)["amount"], "500");
    }

    #[test]
    fn amount_multipliers() {
        let x = extractor();
        assert_eq!(x.extract("home loan of 5 lakh", names::LOAN_APPLICATION)["amount"], "500000");
        assert_eq!(x.extract("send 2k to sam", names::FUND_TRANSFER)["amount"], "2000");
        assert_eq!(x.extract("loan of 1.5 crore", names::LOAN_APPLICATION)["amount"], "15000000");
    }

    #[test]
    fn amount_skips_account_numbers_and_tenures() {
        let x = extractor();
        let e = x.extract("transfer to 1234567890 amount 750", names::FUND_TRANSFER);
        assert_eq!(e["amount"], "750");
        assert_eq!(e["account_number"], "1234567890");

        let e = x.extract("24 months car loan of 300000 at 9.5%", names::LOAN_APPLICATION);
        assert_eq!(e["amount"], "300000");
        assert_eq!(e["tenure"], "24");
        assert_eq!(e["interest_rate"], "9.5");
        assert_eq!(e["loan_type"], "car");
    }

    #[test]
    fn recipient_skips_stopwords() {
        let e = extractor().extract("send 100 to my friend", names::FUND_TRANSFER);
        assert_eq!(e["recipient"], "friend");

        let e = extractor().extract("send 100 to account 1234567890", names::FUND_TRANSFER);
        assert!(!e.contains_key("recipient"));
    }

    #[test]
    fn payee_details() {
        let e = extractor().extract(
            "add payee John Smith account 123456789012 ifsc sbin0001234",
            names::ADD_PAYEE,
        );
        assert_eq!(e["payee_name"], "John Smith");
        assert_eq!(e["account_number"], "123456789012");
        assert_eq!(e["ifsc_code"], "SBIN0001234");
        assert!(!e.contains_key("amount"));
    }

    #[test]
    fn payee_without_name_omits_key() {
        let e = extractor().extract("add a new beneficiary", names::ADD_PAYEE);
        assert!(e.is_empty());
    }

    #[test]
    fn ifsc_digits_are_not_amounts() {
        let e = extractor().extract("send via SBIN0001234", names::FUND_TRANSFER);
        assert!(!e.contains_key("amount"));
    }

    #[test]
    fn loan_tenure_in_years_and_action() {
        let e = extractor().extract("calculate emi for home loan 2500000 for 20 years", names::LOAN_APPLICATION);
        assert_eq!(e["tenure"], "240");
        assert_eq!(e["action"], "calculate");
        assert_eq!(e["loan_type"], "home");
        assert_eq!(e["amount"], "2500000");
    }

    #[test]
    fn loan_type_aliases_normalize() {
        let e = extractor().extract("I want to apply for a housing loan", names::LOAN_APPLICATION);
        assert_eq!(e["loan_type"], "home");
        assert_eq!(e["action"], "apply");
    }

    #[test]
    fn balance_account_reference() {
        let e = extractor().extract("show balance of savings account 1234567890", names::CHECK_BALANCE);
        assert_eq!(e["account_number"], "1234567890");
        assert_eq!(e["account_type"], "savings");
    }

    #[test]
    fn general_intent_extracts_nothing() {
        assert!(extractor().extract("transfer 500", names::GENERAL).is_empty());
    }
}
