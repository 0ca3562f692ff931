// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deposit initiation against the payment provider.
//!
//! Initiation never touches the balance: it records a `pending` ledger entry
//! carrying the provider's authorization handle, and the balance only moves
//! when the reconciler settles the matching webhook. The pending row is
//! written after the provider call succeeds, so a provider failure or
//! timeout leaves no ledger residue.

use tracing::info;
use uuid::Uuid;

use super::db::LedgerDb;
use super::records::{TxMetadata, TxStatus};
use super::LedgerError;
use crate::money::Money;
use crate::providers::paystack::PaystackClient;

/// Authorization handle returned to the depositor.
#[derive(Debug, Clone)]
pub struct DepositInitiated {
    pub authorization_url: String,
    pub reference: String,
    pub access_code: String,
}

/// Point-in-time view of a deposit, for status polling.
#[derive(Debug, Clone)]
pub struct DepositStatus {
    pub reference: String,
    pub status: TxStatus,
    /// Major-unit decimal string.
    pub amount: String,
}

/// Start a deposit of `amount` for `user_id`, returning the provider's
/// hosted-checkout handle.
pub async fn initiate_deposit(
    db: &LedgerDb,
    paystack: &PaystackClient,
    user_id: &str,
    email: &str,
    amount: Money,
) -> Result<DepositInitiated, LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount);
    }

    let wallet = db.get_or_create_wallet(user_id)?;
    let reference = format!("dep_{}", Uuid::new_v4());

    info!(
        wallet_id = %wallet.wallet_id,
        reference = %reference,
        amount_minor = amount.minor_units(),
        "initiating deposit"
    );

    let initialized = paystack
        .initialize_transaction(email, amount.minor_units(), &reference)
        .await?;

    let tx = db.create_pending_deposit(
        &wallet.wallet_id,
        amount,
        &reference,
        TxMetadata {
            authorization_url: Some(initialized.authorization_url.clone()),
            ..TxMetadata::default()
        },
    )?;

    info!(
        tx_id = %tx.tx_id,
        wallet_id = %wallet.wallet_id,
        reference = %reference,
        "created pending deposit"
    );

    Ok(DepositInitiated {
        authorization_url: initialized.authorization_url,
        reference,
        access_code: initialized.access_code,
    })
}

/// Look up a deposit by reference for status polling.
pub fn deposit_status(db: &LedgerDb, reference: &str) -> Result<DepositStatus, LedgerError> {
    let tx = db
        .transaction_by_reference(reference)?
        .ok_or(LedgerError::TransactionNotFound)?;

    Ok(DepositStatus {
        reference: tx.reference,
        status: tx.status,
        amount: tx.amount.to_major_string(),
    })
}
