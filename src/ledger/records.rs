// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted ledger records.
//!
//! A wallet holds exactly one balance per user. Transactions are the
//! append-oriented ledger: a deposit is one entry that starts `pending` and
//! settles once; a transfer is two entries (debit leg + credit leg) created
//! already `success` inside the same unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Ledger entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// Provider-funded deposit into a wallet.
    Deposit,
    /// Internal wallet-to-wallet transfer leg.
    Transfer,
}

/// Ledger entry status. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Success,
    Failed,
}

impl Default for TxStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Direction tag carried by transfer legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Debit,
    Credit,
}

/// Free-form transaction metadata. Write-once except for the reconciler's
/// single provider-payload merge at settlement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxMetadata {
    /// Paystack authorization URL handed back to the depositor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    /// Debit or credit, for transfer legs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<TransferDirection>,
    /// Wallet number on the other side of a transfer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty_wallet: Option<String>,
    /// Raw provider payload merged in at settlement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_data: Option<serde_json::Value>,
}

/// Stored wallet record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredWallet {
    /// Unique wallet identifier (UUID).
    pub wallet_id: String,
    /// Owning user ID (1:1).
    pub user_id: String,
    /// Externally-facing 10-digit wallet number, globally unique.
    pub wallet_number: String,
    /// Current balance in minor units. Never negative.
    pub balance: Money,
    /// When the wallet was created.
    pub created_at: DateTime<Utc>,
    /// When the balance was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl StoredWallet {
    /// Create a fresh zero-balance wallet.
    pub fn new(wallet_id: String, user_id: String, wallet_number: String) -> Self {
        let now = Utc::now();
        Self {
            wallet_id,
            user_id,
            wallet_number,
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Stored ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// Unique transaction identifier (UUID).
    pub tx_id: String,
    /// Owning wallet.
    pub wallet_id: String,
    /// Deposit or transfer.
    pub kind: TxKind,
    /// Current status.
    pub status: TxStatus,
    /// Amount moved, in minor units. Always the positive magnitude;
    /// direction lives in metadata, not in the sign.
    pub amount: Money,
    /// Unique idempotency reference (`dep_<uuid>`, `trf_<uuid>_dr` / `_cr`).
    pub reference: String,
    /// Attached metadata.
    #[serde(default)]
    pub metadata: TxMetadata,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl StoredTransaction {
    /// Create a pending deposit entry.
    pub fn new_pending_deposit(
        tx_id: String,
        wallet_id: String,
        amount: Money,
        reference: String,
        metadata: TxMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            tx_id,
            wallet_id,
            kind: TxKind::Deposit,
            status: TxStatus::Pending,
            amount,
            reference,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create one already-settled transfer leg.
    pub fn new_transfer_leg(
        tx_id: String,
        wallet_id: String,
        amount: Money,
        reference: String,
        direction: TransferDirection,
        counterparty_wallet: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            tx_id,
            wallet_id,
            kind: TxKind::Transfer,
            status: TxStatus::Success,
            amount,
            reference,
            metadata: TxMetadata {
                direction: Some(direction),
                counterparty_wallet: Some(counterparty_wallet),
                ..TxMetadata::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition pending → success, merging provider data into metadata.
    pub fn mark_settled(&mut self, provider_data: serde_json::Value) {
        self.status = TxStatus::Success;
        self.metadata.provider_data = Some(provider_data);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_deposit_starts_pending() {
        let tx = StoredTransaction::new_pending_deposit(
            "tx-1".into(),
            "wallet-1".into(),
            Money::from_minor(5000),
            "dep_abc".into(),
            TxMetadata::default(),
        );
        assert_eq!(tx.status, TxStatus::Pending);
        assert_eq!(tx.kind, TxKind::Deposit);
        assert_eq!(tx.amount.minor_units(), 5000);
    }

    #[test]
    fn transfer_leg_is_settled_at_creation_with_counterparty() {
        let leg = StoredTransaction::new_transfer_leg(
            "tx-2".into(),
            "wallet-1".into(),
            Money::from_minor(400),
            "trf_abc_dr".into(),
            TransferDirection::Debit,
            "1234567890".into(),
        );
        assert_eq!(leg.status, TxStatus::Success);
        assert_eq!(leg.metadata.direction, Some(TransferDirection::Debit));
        assert_eq!(leg.metadata.counterparty_wallet.as_deref(), Some("1234567890"));
    }

    #[test]
    fn mark_settled_merges_provider_payload() {
        let mut tx = StoredTransaction::new_pending_deposit(
            "tx-3".into(),
            "wallet-1".into(),
            Money::from_minor(100),
            "dep_xyz".into(),
            TxMetadata {
                authorization_url: Some("https://checkout.paystack.com/abc".into()),
                ..TxMetadata::default()
            },
        );
        tx.mark_settled(serde_json::json!({"reference": "dep_xyz"}));
        assert_eq!(tx.status, TxStatus::Success);
        // The settlement merge must not clobber earlier metadata.
        assert!(tx.metadata.authorization_url.is_some());
        assert!(tx.metadata.provider_data.is_some());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TxStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&TxStatus::Success).unwrap(), "\"success\"");
        assert_eq!(serde_json::to_string(&TxKind::Deposit).unwrap(), "\"deposit\"");
    }
}
