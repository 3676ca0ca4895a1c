//! Banking records exchanged with the collaborator stores.
//!
//! Amounts are rupees held as `f64`, matching the arithmetic the agents
//! perform. Formatting rounds to two decimals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// A customer bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub account_number: String,
    pub account_type: String,
    pub balance: f64,
    pub currency: String,
    pub is_active: bool,
}

impl Account {
    /// Account number with all but the last four digits hidden.
    pub fn masked_number(&self) -> String {
        mask_account_number(&self.account_number)
    }
}

/// Hide all but the last four characters of an account number.
pub fn mask_account_number(number: &str) -> String {
    let len = number.chars().count();
    if len <= 4 {
        return number.to_string();
    }
    let visible: String = number.chars().skip(len - 4).collect();
    format!("{}{}", "X".repeat(len - 4), visible)
}

/// A registered transfer beneficiary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payee {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub bank_name: String,
    pub created_at: DateTime<Utc>,
}

/// Interbank transfer rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferMethod {
    Upi,
    Imps,
    Neft,
    Rtgs,
}

impl TransferMethod {
    pub const ALL: [TransferMethod; 4] = [
        TransferMethod::Upi,
        TransferMethod::Imps,
        TransferMethod::Neft,
        TransferMethod::Rtgs,
    ];

    pub fn settlement(&self) -> &'static str {
        match self {
            TransferMethod::Upi | TransferMethod::Imps => "Instant",
            TransferMethod::Neft => "Up to 2 hours",
            TransferMethod::Rtgs => "Real-time",
        }
    }
}

impl fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMethod::Upi => write!(f, "UPI"),
            TransferMethod::Imps => write!(f, "IMPS"),
            TransferMethod::Neft => write!(f, "NEFT"),
            TransferMethod::Rtgs => write!(f, "RTGS"),
        }
    }
}

impl FromStr for TransferMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UPI" | "1" => Ok(TransferMethod::Upi),
            "IMPS" | "2" => Ok(TransferMethod::Imps),
            "NEFT" | "3" => Ok(TransferMethod::Neft),
            "RTGS" | "4" => Ok(TransferMethod::Rtgs),
            other => Err(format!("invalid transfer method: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Completed,
    Failed,
}

/// A recorded outgoing transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub user_id: String,
    pub from_account: String,
    pub to: String,
    pub amount: f64,
    pub fees: f64,
    pub method: TransferMethod,
    pub status: TransferStatus,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

/// Loan product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Personal,
    Home,
    Car,
    Education,
}

impl LoanType {
    pub const ALL: [LoanType; 4] = [
        LoanType::Personal,
        LoanType::Home,
        LoanType::Car,
        LoanType::Education,
    ];
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanType::Personal => write!(f, "personal"),
            LoanType::Home => write!(f, "home"),
            LoanType::Car => write!(f, "car"),
            LoanType::Education => write!(f, "education"),
        }
    }
}

impl FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" | "1" => Ok(LoanType::Personal),
            "home" | "housing" | "2" => Ok(LoanType::Home),
            "car" | "auto" | "vehicle" | "3" => Ok(LoanType::Car),
            "education" | "student" | "4" => Ok(LoanType::Education),
            other => Err(format!("invalid loan type: '{other}'")),
        }
    }
}

/// Terms for one loan category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub loan_type: LoanType,
    pub name: String,
    pub min_amount: f64,
    pub max_amount: f64,
    /// Annual interest rate in percent.
    pub interest_rate: f64,
    pub max_tenure_months: u32,
    /// Processing fee in percent of principal.
    pub processing_fee: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

/// A submitted loan application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: String,
    pub user_id: String,
    pub loan_type: LoanType,
    pub amount: f64,
    pub tenure_months: u32,
    pub interest_rate: f64,
    pub emi: f64,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

/// Result of an amortizing-loan calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmiBreakdown {
    pub principal: f64,
    pub annual_rate: f64,
    pub tenure_months: u32,
    pub emi: f64,
    pub total_amount: f64,
    pub total_interest: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_account_number() {
        assert_eq!(mask_account_number("1234567890"), "XXXXXX7890");
        assert_eq!(mask_account_number("123"), "123");
    }

    #[test]
    fn test_transfer_method_from_str_and_display() {
        assert_eq!("upi".parse::<TransferMethod>().unwrap(), TransferMethod::Upi);
        assert_eq!(" NEFT ".parse::<TransferMethod>().unwrap(), TransferMethod::Neft);
        assert_eq!("3".parse::<TransferMethod>().unwrap(), TransferMethod::Neft);
        assert!("swift".parse::<TransferMethod>().is_err());
        assert_eq!(TransferMethod::Rtgs.to_string(), "RTGS");
    }

    #[test]
    fn test_transfer_method_serde_uppercase() {
        let json = serde_json::to_string(&TransferMethod::Imps).unwrap();
        assert_eq!(json, "\"IMPS\"");
    }

    #[test]
    fn test_loan_type_aliases() {
        assert_eq!("Housing".parse::<LoanType>().unwrap(), LoanType::Home);
        assert_eq!("vehicle".parse::<LoanType>().unwrap(), LoanType::Car);
        assert!("gold".parse::<LoanType>().is_err());
    }
}
