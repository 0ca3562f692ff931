// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Trusted caller identity
//!
//! Credential checking lives outside this service: an upstream gateway
//! authenticates the caller (API key or JWT login) and forwards the
//! resolved identity in headers. The ledger trusts that identity without
//! re-validating it.
//!
//! - `x-user-id` (required): canonical user ID
//! - `x-user-email` (optional): contact address used for provider checkout
//!
//! Use the `Auth` extractor in handlers to require an identified caller:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.user_id is the authenticated user's ID
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

const USER_ID_HEADER: &str = "x-user-id";
const USER_EMAIL_HEADER: &str = "x-user-email";

/// Identity forwarded by the gateway.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No user identity header present
    MissingUserHeader,
    /// Identity header was empty or not valid UTF-8
    InvalidUserHeader,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingUserHeader => "missing_user_header",
            AuthError::InvalidUserHeader => "invalid_user_header",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingUserHeader => write!(f, "x-user-id header is required"),
            AuthError::InvalidUserHeader => write!(f, "x-user-id header is invalid"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Extractor for the gateway-authenticated caller.
#[derive(Debug)]
pub struct Auth(pub AuthenticatedUser);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AuthError::MissingUserHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidUserHeader)?
            .trim()
            .to_string();

        if user_id.is_empty() {
            return Err(AuthError::InvalidUserHeader);
        }

        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Auth(AuthenticatedUser { user_id, email }))
    }
}
