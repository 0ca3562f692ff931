// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger & payment reconciliation engine.
//!
//! Money is never created, destroyed, or double-counted: every balance
//! mutation happens inside a single atomic unit of work on [`db::LedgerDb`],
//! and deposit settlement is idempotent across duplicate webhook deliveries.
//!
//! - `records` - persisted wallet and transaction records
//! - `db` - redb-backed durable store and its atomic units of work
//! - `transfer` - two-legged wallet-to-wallet transfer protocol
//! - `deposit` - deposit initiation against the payment provider
//! - `reconcile` - webhook verification and exactly-once settlement

pub mod db;
pub mod deposit;
pub mod records;
pub mod reconcile;
pub mod transfer;

pub use db::{LedgerDb, LedgerDbError, SettleOutcome};
pub use records::{
    StoredTransaction, StoredWallet, TransferDirection, TxKind, TxMetadata, TxStatus,
};

use crate::providers::paystack::ProviderError;

/// Business-rule and storage failures surfaced by ledger operations.
///
/// Validation failures commit nothing: the surrounding unit of work is
/// rolled back before any of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("amount must be greater than 0")]
    InvalidAmount,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("cannot transfer to self")]
    SelfTransferRejected,

    #[error("recipient wallet not found")]
    RecipientNotFound,

    #[error("wallet not found")]
    WalletNotFound,

    #[error("transaction not found")]
    TransactionNotFound,

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("webhook reported {reported} minor units but ledger expects {expected}")]
    AmountMismatch { expected: i64, reported: i64 },

    #[error("payment provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] LedgerDbError),
}
