// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

pub mod health;
pub mod wallet;
pub mod webhook;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallet/balance", get(wallet::get_balance))
        .route("/wallet/transactions", get(wallet::list_transactions))
        .route("/wallet/deposit", post(wallet::initiate_deposit))
        .route("/wallet/deposit/{reference}", get(wallet::deposit_status))
        .route("/wallet/transfer", post(wallet::transfer))
        .route("/wallet/paystack/webhook", post(webhook::paystack_webhook))
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerDb;
    use crate::providers::paystack::{PaystackClient, DEFAULT_BASE_URL};

    #[test]
    fn router_builds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = LedgerDb::open(&dir.path().join("ledger.redb")).expect("open ledger");
        let paystack =
            PaystackClient::new("sk_test_x".into(), DEFAULT_BASE_URL.into()).expect("client");
        let _app = router(AppState::new(ledger, paystack));
    }
}
