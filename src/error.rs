// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ledger::LedgerError;
use crate::providers::paystack::ProviderError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::InvalidAmount
            | LedgerError::InsufficientFunds
            | LedgerError::SelfTransferRejected
            | LedgerError::InvalidSignature
            | LedgerError::AmountMismatch { .. } => Self::bad_request(error.to_string()),
            LedgerError::RecipientNotFound
            | LedgerError::WalletNotFound
            | LedgerError::TransactionNotFound => Self::not_found(error.to_string()),
            LedgerError::ProviderUnavailable(provider) => provider.into(),
            LedgerError::Storage(e) => Self::internal(format!("ledger storage failure: {e}")),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(error: ProviderError) -> Self {
        match error {
            // Propagate the provider's own message and HTTP-equivalent
            // status, defaulting to a generic client error.
            ProviderError::Api { status, message } => Self::new(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
                message,
            ),
            ProviderError::Request(message) | ProviderError::InvalidResponse(message) => {
                Self::service_unavailable(format!("payment provider unavailable: {message}"))
            }
        }
    }
}
