// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paystack integration for wallet deposits.
//!
//! Outbound calls authenticate with the secret key as a bearer token; inbound
//! webhooks are authenticated by an HMAC-SHA512 signature of the exact raw
//! payload bytes, keyed with the same secret. Amounts cross this boundary in
//! minor units (kobo) only.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::{json, Value};
use sha2::Sha512;

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_CURRENCY: &str = "NGN";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Paystack request failed: {0}")]
    Request(String),

    #[error("Paystack returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Paystack response was invalid: {0}")]
    InvalidResponse(String),
}

/// Handle returned by a successful deposit initialization.
#[derive(Debug, Clone)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct PaystackClient {
    base_url: String,
    secret_key: String,
    http: Client,
}

impl PaystackClient {
    /// Build a client. The secret key is passed explicitly; nothing here
    /// reads the environment.
    pub fn new(secret_key: String, base_url: String) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
            http,
        })
    }

    /// Start a hosted-checkout deposit for `amount_minor` kobo.
    pub async fn initialize_transaction(
        &self,
        email: &str,
        amount_minor: i64,
        reference: &str,
    ) -> Result<InitializedTransaction, ProviderError> {
        let payload = json!({
            "email": email,
            "amount": amount_minor,
            "reference": reference,
            "currency": DEFAULT_CURRENCY,
        });

        let data = self.post_json("/transaction/initialize", &payload).await?;

        let authorization_url = required_str(&data, "authorization_url")?;
        let access_code = required_str(&data, "access_code")?;
        let reference = data
            .get("reference")
            .and_then(Value::as_str)
            .unwrap_or(reference)
            .to_string();

        Ok(InitializedTransaction {
            authorization_url,
            access_code,
            reference,
        })
    }

    /// Fetch the provider's view of a transaction by reference.
    pub async fn verify_transaction(&self, reference: &str) -> Result<Value, ProviderError> {
        self.get_json(&format!("/transaction/verify/{reference}"))
            .await
    }

    /// Check a webhook signature against the exact serialized bytes the
    /// provider signed. Signature is lowercase hex of HMAC-SHA512(body).
    pub fn verify_webhook_signature(&self, signature: &str, raw_body: &[u8]) -> bool {
        let mut mac = match HmacSha512::new_from_slice(self.secret_key.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(raw_body);
        let expected = hex::encode(mac.finalize().into_bytes());
        // Hex decode normalizes case; compare digests, not strings.
        match hex::decode(signature.trim()) {
            Ok(provided) => provided == hex::decode(expected).unwrap_or_default(),
            Err(_) => false,
        }
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, ProviderError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("POST {path} failed: {e}")))?;

        Self::extract_data(path, response).await
    }

    async fn get_json(&self, path: &str) -> Result<Value, ProviderError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("GET {path} failed: {e}")))?;

        Self::extract_data(path, response).await
    }

    /// Unwrap Paystack's `{status, message, data}` envelope, surfacing the
    /// provider's message and HTTP status on failure.
    async fn extract_data(path: &str, response: reqwest::Response) -> Result<Value, ProviderError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{path} invalid JSON: {e}")))?;

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Paystack request failed")
                .to_string();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        body.get("data")
            .cloned()
            .ok_or_else(|| ProviderError::InvalidResponse(format!("{path} missing data field")))
    }
}

fn required_str(data: &Value, field: &str) -> Result<String, ProviderError> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::InvalidResponse(format!("missing {field} in response")))
}
