// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Webhook reconciliation: provider callbacks → exactly-once settlement.
//!
//! The provider may deliver the same webhook more than once. The single
//! idempotency checkpoint is the pending→success transition, re-checked
//! inside the settlement write transaction; transport-level deduplication
//! is deliberately not relied on.
//!
//! Conditions the provider cannot fix by retrying (unknown reference,
//! amount mismatch, foreign event types, malformed payloads) are logged and
//! acknowledged so a retry storm never builds up. Only a bad signature and
//! transient store failures surface as errors.

use serde_json::Value;
use tracing::{error, info, warn};

use super::db::{LedgerDb, SettleOutcome};
use super::records::TxStatus;
use super::LedgerError;
use crate::providers::paystack::PaystackClient;

/// Event type that settles a deposit. Everything else is acknowledged
/// untouched, for forward compatibility with new provider events.
const CHARGE_SUCCESS_EVENT: &str = "charge.success";

/// Read a minor-unit amount from the payload. The provider serializes
/// integers, but some JSON stacks re-encode them as floats (`500000.0`);
/// a whole-valued float is still an exact amount.
fn as_minor_units(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Reconcile one webhook delivery.
///
/// `raw_body` must be the exact bytes the provider signed; verifying a
/// re-serialization would break bit-exact signature checks.
pub fn reconcile_webhook(
    db: &LedgerDb,
    paystack: &PaystackClient,
    signature: &str,
    raw_body: &[u8],
) -> Result<(), LedgerError> {
    if !paystack.verify_webhook_signature(signature, raw_body) {
        error!("invalid webhook signature");
        return Err(LedgerError::InvalidSignature);
    }

    let payload: Value = match serde_json::from_slice(raw_body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "webhook payload was not valid JSON; acknowledging");
            return Ok(());
        }
    };

    let event = payload.get("event").and_then(Value::as_str).unwrap_or("");
    info!(event = %event, "received webhook event");
    if event != CHARGE_SUCCESS_EVENT {
        return Ok(());
    }

    let data = payload.get("data").cloned().unwrap_or(Value::Null);
    let Some(reference) = data.get("reference").and_then(Value::as_str).map(str::to_owned)
    else {
        warn!("charge.success webhook missing reference; acknowledging");
        return Ok(());
    };
    let Some(reported_minor) = data.get("amount").and_then(as_minor_units) else {
        warn!(reference = %reference, "charge.success webhook missing amount; acknowledging");
        return Ok(());
    };

    let tx = match db.transaction_by_reference(&reference)? {
        Some(tx) => tx,
        None => {
            warn!(reference = %reference, "webhook for unknown transaction reference");
            return Ok(());
        }
    };

    if tx.status == TxStatus::Success {
        info!(reference = %reference, "transaction already settled; skipping");
        return Ok(());
    }

    let expected_minor = tx.amount.minor_units();
    if expected_minor != reported_minor {
        // Tamper/fraud signal: never settle, never retry.
        let mismatch = LedgerError::AmountMismatch {
            expected: expected_minor,
            reported: reported_minor,
        };
        error!(reference = %reference, error = %mismatch, "not settling");
        return Ok(());
    }

    match db.settle_deposit(&reference, data) {
        Ok(SettleOutcome::Settled { wallet }) => {
            info!(
                reference = %reference,
                wallet_id = %wallet.wallet_id,
                balance_minor = wallet.balance.minor_units(),
                "deposit settled"
            );
            Ok(())
        }
        Ok(SettleOutcome::AlreadySettled) => {
            // Lost the race with a duplicate delivery; nothing to do.
            info!(reference = %reference, "deposit settled by concurrent delivery");
            Ok(())
        }
        Err(LedgerError::WalletNotFound) => {
            error!(
                reference = %reference,
                wallet_id = %tx.wallet_id,
                "transaction references a missing wallet; acknowledging"
            );
            Ok(())
        }
        // Transient store failures bubble up so the provider retries.
        Err(e) => Err(e),
    }
}
