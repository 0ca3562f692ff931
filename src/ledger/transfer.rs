// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet-to-wallet transfer protocol.
//!
//! A transfer is one atomic unit of work producing two ledger legs
//! (`<ref>_dr` on the sender, `<ref>_cr` on the recipient) and two balance
//! deltas that sum to zero. There is no API that creates one leg without
//! the other.

use tracing::{debug, info};
use uuid::Uuid;

use super::db::LedgerDb;
use super::LedgerError;
use crate::money::Money;

/// Outcome returned to the caller of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub status: String,
    pub message: String,
    /// Base reference shared by both legs.
    pub reference: String,
}

/// Move `amount` from the sender's wallet to the wallet addressed by
/// `recipient_wallet_number`.
///
/// The sender's wallet is created lazily if this is their first operation.
/// Sufficiency is re-checked against the balance read inside the write
/// transaction, so concurrent transfers from the same sender serialize and
/// can never jointly overdraw.
pub fn transfer_funds(
    db: &LedgerDb,
    sender_user_id: &str,
    recipient_wallet_number: &str,
    amount: Money,
) -> Result<TransferReceipt, LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount);
    }

    info!(
        sender = %sender_user_id,
        recipient = %recipient_wallet_number,
        amount_minor = amount.minor_units(),
        "attempting transfer"
    );

    // Lazy wallet creation is its own unit of work; the transfer below
    // re-reads the sender under the write transaction regardless.
    db.get_or_create_wallet(sender_user_id)?;

    let reference = format!("trf_{}", Uuid::new_v4());
    let completed = db.transfer(sender_user_id, recipient_wallet_number, amount, &reference)?;

    debug!(
        reference = %reference,
        sender_balance_minor = completed.sender.balance.minor_units(),
        recipient_balance_minor = completed.recipient.balance.minor_units(),
        "transfer legs committed"
    );
    info!(reference = %reference, "transfer completed");

    Ok(TransferReceipt {
        status: "success".to_string(),
        message: "Transfer completed".to_string(),
        reference,
    })
}
