//! Format checks for account identifiers.

use std::sync::LazyLock;

const BANKS: &[(&str, &str)] = &[
    ("SBIN", "State Bank of India"),
    ("HDFC", "HDFC Bank"),
    ("ICIC", "ICICI Bank"),
    ("AXIS", "Axis Bank"),
    ("UTIB", "Axis Bank"),
    ("PUNB", "Punjab National Bank"),
    ("UBIN", "Union Bank of India"),
    ("CNRB", "Canara Bank"),
    ("BARB", "Bank of Baroda"),
    ("KKBK", "Kotak Mahindra Bank"),
];

static IFSC: LazyLock<Option<regex::Regex>> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Z]{4}[0-9A-Z]{7}$").ok());

/// Four letters followed by seven letters or digits, upper case.
pub fn is_valid_ifsc(code: &str) -> bool {
    IFSC.as_ref().is_some_and(|re| re.is_match(code))
}

/// Nine to eighteen ASCII digits.
pub fn is_valid_account_number(number: &str) -> bool {
    (9..=18).contains(&number.len()) && number.bytes().all(|b| b.is_ascii_digit())
}

/// Bank name for a known IFSC prefix.
pub fn bank_name(ifsc: &str) -> String {
    let prefix = ifsc.get(..4).unwrap_or_default();
    BANKS
        .iter()
        .find(|(code, _)| *code == prefix)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| "Unknown Bank".to_string())
}

/// Parse a user-typed amount, tolerating currency marks and separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('₹')
        .trim_start_matches("Rs.")
        .trim_start_matches("Rs")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
