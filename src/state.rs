// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::ledger::LedgerDb;
use crate::providers::paystack::PaystackClient;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerDb>,
    pub paystack: Arc<PaystackClient>,
}

impl AppState {
    pub fn new(ledger: LedgerDb, paystack: PaystackClient) -> Self {
        Self {
            ledger: Arc::new(ledger),
            paystack: Arc::new(paystack),
        }
    }
}
