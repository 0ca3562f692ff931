// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment provider webhook endpoint.
//!
//! The body is taken as raw bytes so the signature check runs over the
//! exact payload the provider signed.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::{error::ApiError, ledger::reconcile, state::AppState};

const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// `POST /v1/wallet/paystack/webhook`
///
/// Returns 200 for every authenticated delivery, settled or not; only a
/// bad signature (400) or a storage failure (500) is surfaced, and the
/// provider retries on the latter.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("missing x-paystack-signature header"))?;

    reconcile::reconcile_webhook(&state.ledger, &state.paystack, signature, &body)?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerDb;
    use crate::providers::paystack::{PaystackClient, DEFAULT_BASE_URL};
    use hmac::{Hmac, Mac};
    use sha2::Sha512;

    const SECRET: &str = "sk_test_webhook";

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = LedgerDb::open(&dir.path().join("ledger.redb")).expect("open ledger");
        let paystack =
            PaystackClient::new(SECRET.into(), DEFAULT_BASE_URL.into()).expect("client");
        (AppState::new(ledger, paystack), dir)
    }

    fn sign(body: &[u8]) -> String {
        let mut mac =
            Hmac::<Sha512>::new_from_slice(SECRET.as_bytes()).expect("hmac accepts any key size");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[tokio::test]
    async fn missing_signature_header_is_400() {
        let (state, _dir) = test_state();

        let err = paystack_webhook(State(state), HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn forged_signature_is_400() {
        let (state, _dir) = test_state();
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, "deadbeef".parse().unwrap());

        let err = paystack_webhook(State(state), headers, Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_unknown_event_is_acknowledged() {
        let (state, _dir) = test_state();
        let body = br#"{"event":"transfer.success","data":{}}"#;
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, sign(body).parse().unwrap());

        let status = paystack_webhook(State(state), headers, Bytes::from_static(body))
            .await
            .expect("acknowledged");
        assert_eq!(status, StatusCode::OK);
    }
}
