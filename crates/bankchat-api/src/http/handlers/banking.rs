//! Read-only banking resources and loan calculators.
//!
//! Endpoints:
//! - GET  /api/v1/accounts           - Accounts of the session's user
//! - GET  /api/v1/accounts/{id}      - One of the session user's accounts
//! - GET  /api/v1/payees             - Registered payees
//! - GET  /api/v1/transfers?limit=N  - Recent transfers, newest first
//! - GET  /api/v1/loans/applications - Submitted loan applications
//! - GET  /api/v1/loans/products     - Loan product catalogue (no auth)
//! - POST /api/v1/loans/emi          - EMI calculation (no auth)

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use bankchat_core::banking::emi::calculate_emi;
use bankchat_core::banking::products::{DEFAULT_TENURE_MONTHS, all_products, loan_product};
use bankchat_types::banking::{Account, EmiBreakdown, LoanApplication, LoanProduct, LoanType, Payee, Transfer};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Account as shown to clients, with the number masked.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: String,
    pub account_number: String,
    pub account_type: String,
    pub balance: f64,
    pub currency: String,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            account_number: account.masked_number(),
            id: account.id,
            account_type: account.account_type,
            balance: account.balance,
            currency: account.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Request body for the EMI calculator.
///
/// `annual_rate` defaults to the product rate when `loan_type` is given.
#[derive(Debug, Deserialize)]
pub struct EmiRequest {
    pub principal: f64,
    pub annual_rate: Option<f64>,
    pub loan_type: Option<String>,
    pub tenure_months: Option<u32>,
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<ApiResponse<Vec<AccountView>>>, AppError> {
    let start = Instant::now();
    let accounts = state
        .stores
        .accounts
        .accounts_for(&session.account_ref)?
        .into_iter()
        .map(AccountView::from)
        .collect();
    Ok(Json(ApiResponse::timed(accounts, start)))
}

pub async fn get_account(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AccountView>>, AppError> {
    let start = Instant::now();
    let account = state.stores.accounts.get_account(&session.account_ref, &id)?;
    Ok(Json(ApiResponse::timed(account.into(), start)))
}

pub async fn list_payees(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<ApiResponse<Vec<Payee>>>, AppError> {
    let start = Instant::now();
    let payees = state.stores.payees.list(&session.account_ref)?;
    Ok(Json(ApiResponse::timed(payees, start)))
}

pub async fn list_transfers(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
    Query(query): Query<TransferQuery>,
) -> Result<Json<ApiResponse<Vec<Transfer>>>, AppError> {
    let start = Instant::now();
    let transfers = state
        .stores
        .transfers
        .list(&session.account_ref, query.limit.clamp(1, 100))?;
    Ok(Json(ApiResponse::timed(transfers, start)))
}

pub async fn list_loan_applications(
    State(state): State<AppState>,
    Authenticated(session): Authenticated,
) -> Result<Json<ApiResponse<Vec<LoanApplication>>>, AppError> {
    let start = Instant::now();
    let applications = state.stores.loans.applications(&session.account_ref)?;
    Ok(Json(ApiResponse::timed(applications, start)))
}

pub async fn loan_products() -> Json<ApiResponse<Vec<LoanProduct>>> {
    let start = Instant::now();
    Json(ApiResponse::timed(all_products(), start))
}

pub async fn calculate(
    body: Result<Json<EmiRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<EmiBreakdown>>, AppError> {
    let start = Instant::now();
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    if request.principal <= 0.0 {
        return Err(AppError::Validation("principal must be positive".to_string()));
    }
    let tenure = request.tenure_months.unwrap_or(DEFAULT_TENURE_MONTHS);
    if tenure == 0 {
        return Err(AppError::Validation("tenure_months must be positive".to_string()));
    }

    let product_rate = match request.loan_type.as_deref() {
        Some(raw) => Some(
            raw.parse::<LoanType>()
                .map(|t| loan_product(t).interest_rate)
                .map_err(AppError::Validation)?,
        ),
        None => None,
    };
    let rate = request
        .annual_rate
        .or(product_rate)
        .ok_or_else(|| AppError::Validation("annual_rate or loan_type is required".to_string()))?;
    if rate < 0.0 {
        return Err(AppError::Validation("annual_rate must not be negative".to_string()));
    }

    Ok(Json(ApiResponse::timed(calculate_emi(request.principal, rate, tenure), start)))
}
