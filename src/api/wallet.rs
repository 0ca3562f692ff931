// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet endpoints: balance, transaction history, deposits, transfers.
//!
//! Amounts cross this boundary in major units (naira); everything behind
//! it is minor units (kobo).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Auth,
    error::ApiError,
    ledger::{deposit, transfer, StoredTransaction, TxKind, TxMetadata, TxStatus},
    money::Money,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub wallet_id: String,
    pub wallet_number: String,
    /// Major-unit decimal string, always two decimal places.
    pub balance: String,
    pub balance_minor: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub tx_id: String,
    pub kind: TxKind,
    pub status: TxStatus,
    pub amount: String,
    pub amount_minor: i64,
    pub reference: String,
    pub metadata: TxMetadata,
    pub created_at: DateTime<Utc>,
}

impl From<StoredTransaction> for TransactionView {
    fn from(tx: StoredTransaction) -> Self {
        Self {
            tx_id: tx.tx_id,
            kind: tx.kind,
            status: tx.status,
            amount: tx.amount.to_major_string(),
            amount_minor: tx.amount.minor_units(),
            reference: tx.reference,
            metadata: tx.metadata,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    /// Major-unit amount (e.g. `5000.0` naira).
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct DepositStatusResponse {
    pub reference: String,
    pub status: TxStatus,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Recipient's 10-digit wallet number.
    pub wallet_number: String,
    /// Major-unit amount.
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub status: String,
    pub message: String,
    pub reference: String,
}

/// `GET /v1/wallet/balance`
///
/// Creates the caller's wallet on first access.
pub async fn get_balance(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<BalanceResponse>, ApiError> {
    let wallet = state.ledger.get_or_create_wallet(&user.user_id)?;
    Ok(Json(BalanceResponse {
        wallet_id: wallet.wallet_id,
        wallet_number: wallet.wallet_number,
        balance: wallet.balance.to_major_string(),
        balance_minor: wallet.balance.minor_units(),
    }))
}

/// `GET /v1/wallet/transactions`
///
/// Newest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let wallet = state.ledger.get_or_create_wallet(&user.user_id)?;
    let transactions = state
        .ledger
        .transactions_for_wallet(&wallet.wallet_id)
        .map_err(crate::ledger::LedgerError::from)?
        .into_iter()
        .map(TransactionView::from)
        .collect();
    Ok(Json(TransactionsResponse { transactions }))
}

/// `POST /v1/wallet/deposit`
pub async fn initiate_deposit(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<DepositRequest>,
) -> Result<(StatusCode, Json<DepositResponse>), ApiError> {
    let email = user
        .email
        .ok_or_else(|| ApiError::bad_request("x-user-email header is required for deposits"))?;
    let amount = Money::from_major_f64(request.amount)
        .map_err(|e| ApiError::bad_request(format!("invalid amount: {e}")))?;

    let initiated =
        deposit::initiate_deposit(&state.ledger, &state.paystack, &user.user_id, &email, amount)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(DepositResponse {
            authorization_url: initiated.authorization_url,
            access_code: initiated.access_code,
            reference: initiated.reference,
        }),
    ))
}

/// `GET /v1/wallet/deposit/{reference}`
pub async fn deposit_status(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(reference): Path<String>,
) -> Result<Json<DepositStatusResponse>, ApiError> {
    let status = deposit::deposit_status(&state.ledger, &reference)?;
    Ok(Json(DepositStatusResponse {
        reference: status.reference,
        status: status.status,
        amount: status.amount,
    }))
}

/// `POST /v1/wallet/transfer`
pub async fn transfer(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let amount = Money::from_major_f64(request.amount)
        .map_err(|e| ApiError::bad_request(format!("invalid amount: {e}")))?;

    let receipt = transfer::transfer_funds(
        &state.ledger,
        &user.user_id,
        &request.wallet_number,
        amount,
    )?;

    Ok(Json(TransferResponse {
        status: receipt.status,
        message: receipt.message,
        reference: receipt.reference,
    }))
}
