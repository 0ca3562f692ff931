// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable ledger store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallets`: wallet_id → serialized StoredWallet
//! - `user_wallets`: user_id → wallet_id
//! - `wallet_numbers`: 10-digit wallet number → wallet_id
//! - `transactions`: tx_id → serialized StoredTransaction
//! - `tx_refs`: idempotency reference → tx_id
//! - `wallet_tx_index`: composite key (wallet_id|!timestamp|tx_id) → tx_id
//!
//! ## Concurrency
//!
//! redb admits exactly one write transaction at a time, so every compound
//! operation here (wallet creation, transfer, settlement) runs as a fully
//! serialized unit of work: balances are re-read inside the write
//! transaction before any sufficiency check, and either every write in the
//! unit commits or none do. This is the row-lock discipline of a relational
//! engine pushed down to the store, with no lock-ordering concerns because
//! the writer is global.

use std::path::Path;

use rand::Rng;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::info;
use uuid::Uuid;

use super::records::{
    StoredTransaction, StoredWallet, TransferDirection, TxMetadata, TxStatus,
};
use super::LedgerError;
use crate::money::Money;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary wallet table: wallet_id → StoredWallet (JSON bytes).
const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

/// Owner index: user_id → wallet_id (1:1).
const USER_WALLETS: TableDefinition<&str, &str> = TableDefinition::new("user_wallets");

/// Public-number index: wallet_number → wallet_id.
const WALLET_NUMBERS: TableDefinition<&str, &str> = TableDefinition::new("wallet_numbers");

/// Primary ledger table: tx_id → StoredTransaction (JSON bytes).
const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

/// Reference index: idempotency reference → tx_id.
const TX_REFS: TableDefinition<&str, &str> = TableDefinition::new("tx_refs");

/// Per-wallet history index: `wallet_id|!timestamp_be|tx_id` → tx_id.
/// The inverted timestamp makes forward scans return newest entries first.
const WALLET_TX_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("wallet_tx_index");

/// Attempts at generating an unused wallet number before giving up.
const WALLET_NUMBER_ATTEMPTS: u32 = 8;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("balance overflow for wallet {0}")]
    BalanceOverflow(String),

    #[error("could not allocate an unused wallet number")]
    WalletNumberExhausted,

    #[error("ledger index inconsistency: {0}")]
    Inconsistent(String),
}

pub type LedgerDbResult<T> = Result<T, LedgerDbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the wallet_tx_index table.
///
/// Format: `wallet_id | inverted_timestamp_be_bytes | tx_id`
fn make_index_key(wallet_id: &str, timestamp_millis: i64, tx_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(wallet_id.len() + 1 + 8 + 1 + tx_id.len());
    key.extend_from_slice(wallet_id.as_bytes());
    key.push(b'|');
    // Invert timestamp for descending order (newest first)
    key.extend_from_slice(&(!timestamp_millis as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(tx_id.as_bytes());
    key
}

/// Build a prefix key for range scanning all entries of a wallet.
fn make_prefix(wallet_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(wallet_id.len() + 1);
    prefix.extend_from_slice(wallet_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a range scan (prefix with 0xFF bytes appended).
fn make_prefix_end(wallet_id: &str) -> Vec<u8> {
    let mut end = make_prefix(wallet_id);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

/// Generate a candidate 10-digit wallet number.
fn random_wallet_number() -> String {
    rand::thread_rng()
        .gen_range(1_000_000_000u64..10_000_000_000u64)
        .to_string()
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a committed transfer unit of work.
#[derive(Debug, Clone)]
pub struct TransferCompleted {
    pub sender: StoredWallet,
    pub recipient: StoredWallet,
    pub debit_leg: StoredTransaction,
    pub credit_leg: StoredTransaction,
}

/// Result of a settlement unit of work.
#[derive(Debug, Clone)]
pub enum SettleOutcome {
    /// The pending deposit was settled and the wallet credited.
    Settled { wallet: StoredWallet },
    /// The deposit had already been settled; nothing changed.
    AlreadySettled,
}

// =============================================================================
// LedgerDb
// =============================================================================

/// Embedded ACID ledger database.
pub struct LedgerDb {
    db: Database,
}

impl LedgerDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LedgerDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(USER_WALLETS)?;
            let _ = write_txn.open_table(WALLET_NUMBERS)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(TX_REFS)?;
            let _ = write_txn.open_table(WALLET_TX_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Wallet Store
    // =========================================================================

    /// Return the wallet owned by `user_id`, creating it on first access.
    ///
    /// Creation picks a fresh 10-digit wallet number and retries on a
    /// uniqueness collision; numbers are chosen independently of existing
    /// records, so a collision is expected-rare but not fatal.
    pub fn get_or_create_wallet(&self, user_id: &str) -> Result<StoredWallet, LedgerError> {
        if let Some(wallet) = self.wallet_for_user(user_id)? {
            return Ok(wallet);
        }

        let write_txn = self.db.begin_write().map_err(LedgerDbError::from)?;
        let wallet = {
            let mut wallets = write_txn.open_table(WALLETS).map_err(LedgerDbError::from)?;
            let mut user_index = write_txn
                .open_table(USER_WALLETS)
                .map_err(LedgerDbError::from)?;
            let mut number_index = write_txn
                .open_table(WALLET_NUMBERS)
                .map_err(LedgerDbError::from)?;

            // Another request may have created the wallet between our read
            // and this write transaction.
            let existing_id = user_index
                .get(user_id)
                .map_err(LedgerDbError::from)?
                .map(|v| v.value().to_string());
            if let Some(wallet_id) = existing_id {
                let bytes = wallets
                    .get(wallet_id.as_str())
                    .map_err(LedgerDbError::from)?
                    .ok_or_else(|| {
                        LedgerDbError::Inconsistent(format!(
                            "user {user_id} maps to missing wallet {wallet_id}"
                        ))
                    })?
                    .value()
                    .to_vec();
                serde_json::from_slice(&bytes).map_err(LedgerDbError::from)?
            } else {
                let wallet_number = Self::unused_wallet_number(&number_index)?;
                let wallet = StoredWallet::new(
                    Uuid::new_v4().to_string(),
                    user_id.to_string(),
                    wallet_number,
                );

                let json = serde_json::to_vec(&wallet).map_err(LedgerDbError::from)?;
                wallets
                    .insert(wallet.wallet_id.as_str(), json.as_slice())
                    .map_err(LedgerDbError::from)?;
                user_index
                    .insert(user_id, wallet.wallet_id.as_str())
                    .map_err(LedgerDbError::from)?;
                number_index
                    .insert(wallet.wallet_number.as_str(), wallet.wallet_id.as_str())
                    .map_err(LedgerDbError::from)?;

                info!(
                    wallet_id = %wallet.wallet_id,
                    wallet_number = %wallet.wallet_number,
                    user_id = %user_id,
                    "created wallet"
                );
                wallet
            }
        };
        write_txn.commit().map_err(LedgerDbError::from)?;
        Ok(wallet)
    }

    fn unused_wallet_number(
        number_index: &impl ReadableTable<&'static str, &'static str>,
    ) -> LedgerDbResult<String> {
        for _ in 0..WALLET_NUMBER_ATTEMPTS {
            let candidate = random_wallet_number();
            if number_index.get(candidate.as_str())?.is_none() {
                return Ok(candidate);
            }
        }
        Err(LedgerDbError::WalletNumberExhausted)
    }

    /// Look up the wallet owned by a user, if any.
    pub fn wallet_for_user(&self, user_id: &str) -> LedgerDbResult<Option<StoredWallet>> {
        let read_txn = self.db.begin_read()?;
        let user_index = read_txn.open_table(USER_WALLETS)?;
        let Some(wallet_id) = user_index.get(user_id)?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };
        let wallets = read_txn.open_table(WALLETS)?;
        match wallets.get(wallet_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(LedgerDbError::Inconsistent(format!(
                "user {user_id} maps to missing wallet {wallet_id}"
            ))),
        }
    }

    /// Look up a wallet by its public 10-digit number.
    pub fn find_wallet_by_number(&self, wallet_number: &str) -> LedgerDbResult<Option<StoredWallet>> {
        let read_txn = self.db.begin_read()?;
        let number_index = read_txn.open_table(WALLET_NUMBERS)?;
        let Some(wallet_id) = number_index.get(wallet_number)?.map(|v| v.value().to_string())
        else {
            return Ok(None);
        };
        let wallets = read_txn.open_table(WALLETS)?;
        match wallets.get(wallet_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(LedgerDbError::Inconsistent(format!(
                "number {wallet_number} maps to missing wallet {wallet_id}"
            ))),
        }
    }

    // =========================================================================
    // Transaction Log
    // =========================================================================

    /// Append a new `pending` deposit entry.
    pub fn create_pending_deposit(
        &self,
        wallet_id: &str,
        amount: Money,
        reference: &str,
        metadata: TxMetadata,
    ) -> LedgerDbResult<StoredTransaction> {
        let tx = StoredTransaction::new_pending_deposit(
            Uuid::new_v4().to_string(),
            wallet_id.to_string(),
            amount,
            reference.to_string(),
            metadata,
        );

        let write_txn = self.db.begin_write()?;
        {
            let mut tx_table = write_txn.open_table(TRANSACTIONS)?;
            let mut ref_index = write_txn.open_table(TX_REFS)?;
            let mut wallet_index = write_txn.open_table(WALLET_TX_INDEX)?;
            Self::insert_transaction(&mut tx_table, &mut ref_index, &mut wallet_index, &tx)?;
        }
        write_txn.commit()?;
        Ok(tx)
    }

    fn insert_transaction(
        tx_table: &mut redb::Table<&str, &[u8]>,
        ref_index: &mut redb::Table<&str, &str>,
        wallet_index: &mut redb::Table<&[u8], &str>,
        tx: &StoredTransaction,
    ) -> LedgerDbResult<()> {
        let json = serde_json::to_vec(tx)?;
        tx_table.insert(tx.tx_id.as_str(), json.as_slice())?;
        ref_index.insert(tx.reference.as_str(), tx.tx_id.as_str())?;
        let key = make_index_key(&tx.wallet_id, tx.created_at.timestamp_millis(), &tx.tx_id);
        wallet_index.insert(key.as_slice(), tx.tx_id.as_str())?;
        Ok(())
    }

    /// Look up a ledger entry by its idempotency reference.
    pub fn transaction_by_reference(
        &self,
        reference: &str,
    ) -> LedgerDbResult<Option<StoredTransaction>> {
        let read_txn = self.db.begin_read()?;
        let ref_index = read_txn.open_table(TX_REFS)?;
        let Some(tx_id) = ref_index.get(reference)?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };
        let tx_table = read_txn.open_table(TRANSACTIONS)?;
        match tx_table.get(tx_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(LedgerDbError::Inconsistent(format!(
                "reference {reference} maps to missing transaction {tx_id}"
            ))),
        }
    }

    /// List all ledger entries for a wallet, newest first.
    pub fn transactions_for_wallet(
        &self,
        wallet_id: &str,
    ) -> LedgerDbResult<Vec<StoredTransaction>> {
        let read_txn = self.db.begin_read()?;
        let wallet_index = read_txn.open_table(WALLET_TX_INDEX)?;
        let tx_table = read_txn.open_table(TRANSACTIONS)?;

        let prefix = make_prefix(wallet_id);
        let prefix_end = make_prefix_end(wallet_id);

        let mut results = Vec::new();
        for entry in wallet_index.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let tx_id = entry.1.value().to_string();
            if let Some(value) = tx_table.get(tx_id.as_str())? {
                results.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(results)
    }

    // =========================================================================
    // Transfer unit of work
    // =========================================================================

    /// Execute a transfer as one atomic unit of work.
    ///
    /// The sender's balance is re-read inside the write transaction before
    /// the sufficiency check, so two concurrent transfers from the same
    /// wallet can never both pass the check on a stale balance. The debit,
    /// credit, and both ledger legs commit together or not at all.
    pub fn transfer(
        &self,
        sender_user_id: &str,
        recipient_wallet_number: &str,
        amount: Money,
        reference_base: &str,
    ) -> Result<TransferCompleted, LedgerError> {
        let write_txn = self.db.begin_write().map_err(LedgerDbError::from)?;
        let completed = {
            let mut wallets = write_txn.open_table(WALLETS).map_err(LedgerDbError::from)?;
            let user_index = write_txn
                .open_table(USER_WALLETS)
                .map_err(LedgerDbError::from)?;
            let number_index = write_txn
                .open_table(WALLET_NUMBERS)
                .map_err(LedgerDbError::from)?;

            let mut sender = Self::load_wallet_by_user(&wallets, &user_index, sender_user_id)?
                .ok_or(LedgerError::WalletNotFound)?;

            let recipient_id = number_index
                .get(recipient_wallet_number)
                .map_err(LedgerDbError::from)?
                .map(|v| v.value().to_string())
                .ok_or(LedgerError::RecipientNotFound)?;
            let mut recipient = Self::load_wallet(&wallets, &recipient_id)?
                .ok_or(LedgerError::RecipientNotFound)?;

            if recipient.wallet_id == sender.wallet_id {
                return Err(LedgerError::SelfTransferRejected);
            }

            if sender.balance < amount {
                return Err(LedgerError::InsufficientFunds);
            }

            sender.balance = sender
                .balance
                .checked_sub(amount)
                .filter(|b| b.minor_units() >= 0)
                .ok_or(LedgerError::InsufficientFunds)?;
            recipient.balance = recipient
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerDbError::BalanceOverflow(recipient.wallet_id.clone()))?;

            let now = chrono::Utc::now();
            sender.updated_at = now;
            recipient.updated_at = now;

            Self::store_wallet(&mut wallets, &sender)?;
            Self::store_wallet(&mut wallets, &recipient)?;

            let debit_leg = StoredTransaction::new_transfer_leg(
                Uuid::new_v4().to_string(),
                sender.wallet_id.clone(),
                amount,
                format!("{reference_base}_dr"),
                TransferDirection::Debit,
                recipient.wallet_number.clone(),
            );
            let credit_leg = StoredTransaction::new_transfer_leg(
                Uuid::new_v4().to_string(),
                recipient.wallet_id.clone(),
                amount,
                format!("{reference_base}_cr"),
                TransferDirection::Credit,
                sender.wallet_number.clone(),
            );

            let mut tx_table = write_txn
                .open_table(TRANSACTIONS)
                .map_err(LedgerDbError::from)?;
            let mut ref_index = write_txn.open_table(TX_REFS).map_err(LedgerDbError::from)?;
            let mut wallet_index = write_txn
                .open_table(WALLET_TX_INDEX)
                .map_err(LedgerDbError::from)?;
            Self::insert_transaction(&mut tx_table, &mut ref_index, &mut wallet_index, &debit_leg)?;
            Self::insert_transaction(&mut tx_table, &mut ref_index, &mut wallet_index, &credit_leg)?;

            TransferCompleted {
                sender,
                recipient,
                debit_leg,
                credit_leg,
            }
        };
        write_txn.commit().map_err(LedgerDbError::from)?;
        Ok(completed)
    }

    // =========================================================================
    // Settlement unit of work
    // =========================================================================

    /// Settle a pending deposit exactly once.
    ///
    /// The pending→success transition is re-checked inside the write
    /// transaction; a deposit that is already `success` is left untouched,
    /// which makes duplicate webhook deliveries harmless.
    pub fn settle_deposit(
        &self,
        reference: &str,
        provider_payload: serde_json::Value,
    ) -> Result<SettleOutcome, LedgerError> {
        let write_txn = self.db.begin_write().map_err(LedgerDbError::from)?;
        let outcome = {
            let mut tx_table = write_txn
                .open_table(TRANSACTIONS)
                .map_err(LedgerDbError::from)?;
            let ref_index = write_txn.open_table(TX_REFS).map_err(LedgerDbError::from)?;

            let tx_id = ref_index
                .get(reference)
                .map_err(LedgerDbError::from)?
                .map(|v| v.value().to_string())
                .ok_or(LedgerError::TransactionNotFound)?;

            let bytes = tx_table
                .get(tx_id.as_str())
                .map_err(LedgerDbError::from)?
                .ok_or_else(|| {
                    LedgerDbError::Inconsistent(format!(
                        "reference {reference} maps to missing transaction {tx_id}"
                    ))
                })?
                .value()
                .to_vec();
            let mut tx: StoredTransaction =
                serde_json::from_slice(&bytes).map_err(LedgerDbError::from)?;

            if tx.status == TxStatus::Success {
                SettleOutcome::AlreadySettled
            } else {
                tx.mark_settled(provider_payload);

                let mut wallets = write_txn.open_table(WALLETS).map_err(LedgerDbError::from)?;
                let mut wallet = Self::load_wallet(&wallets, &tx.wallet_id)?
                    .ok_or(LedgerError::WalletNotFound)?;
                wallet.balance = wallet
                    .balance
                    .checked_add(tx.amount)
                    .ok_or_else(|| LedgerDbError::BalanceOverflow(wallet.wallet_id.clone()))?;
                wallet.updated_at = chrono::Utc::now();

                Self::store_wallet(&mut wallets, &wallet)?;
                let json = serde_json::to_vec(&tx).map_err(LedgerDbError::from)?;
                tx_table
                    .insert(tx.tx_id.as_str(), json.as_slice())
                    .map_err(LedgerDbError::from)?;

                SettleOutcome::Settled { wallet }
            }
        };
        write_txn.commit().map_err(LedgerDbError::from)?;
        Ok(outcome)
    }

    // =========================================================================
    // Table helpers
    // =========================================================================

    fn load_wallet(
        wallets: &impl ReadableTable<&'static str, &'static [u8]>,
        wallet_id: &str,
    ) -> LedgerDbResult<Option<StoredWallet>> {
        match wallets.get(wallet_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn load_wallet_by_user(
        wallets: &impl ReadableTable<&'static str, &'static [u8]>,
        user_index: &impl ReadableTable<&'static str, &'static str>,
        user_id: &str,
    ) -> LedgerDbResult<Option<StoredWallet>> {
        let Some(wallet_id) = user_index.get(user_id)?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };
        Self::load_wallet(wallets, &wallet_id)
    }

    fn store_wallet(
        wallets: &mut redb::Table<&str, &[u8]>,
        wallet: &StoredWallet,
    ) -> LedgerDbResult<()> {
        let json = serde_json::to_vec(wallet)?;
        wallets.insert(wallet.wallet_id.as_str(), json.as_slice())?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("ledger.redb")).unwrap();
        (db, dir)
    }

    /// Seed a wallet with a balance by settling a synthetic deposit.
    fn fund_wallet(db: &LedgerDb, user_id: &str, minor: i64) -> StoredWallet {
        let wallet = db.get_or_create_wallet(user_id).unwrap();
        let reference = format!("dep_seed_{user_id}");
        db.create_pending_deposit(
            &wallet.wallet_id,
            Money::from_minor(minor),
            &reference,
            TxMetadata::default(),
        )
        .unwrap();
        db.settle_deposit(&reference, serde_json::json!({})).unwrap();
        db.get_or_create_wallet(user_id).unwrap()
    }

    #[test]
    fn wallet_is_created_lazily_with_zero_balance() {
        let (db, _dir) = temp_db();
        let wallet = db.get_or_create_wallet("user-1").unwrap();
        assert_eq!(wallet.balance, Money::ZERO);
        assert_eq!(wallet.wallet_number.len(), 10);
        assert!(wallet.wallet_number.chars().all(|c| c.is_ascii_digit()));

        // Second access returns the same wallet, not a new one.
        let again = db.get_or_create_wallet("user-1").unwrap();
        assert_eq!(again.wallet_id, wallet.wallet_id);
        assert_eq!(again.wallet_number, wallet.wallet_number);
    }

    #[test]
    fn wallets_are_found_by_number() {
        let (db, _dir) = temp_db();
        let wallet = db.get_or_create_wallet("user-1").unwrap();
        let found = db.find_wallet_by_number(&wallet.wallet_number).unwrap().unwrap();
        assert_eq!(found.wallet_id, wallet.wallet_id);
        assert!(db.find_wallet_by_number("0000000000").unwrap().is_none());
    }

    #[test]
    fn transfer_moves_funds_and_writes_two_legs() {
        let (db, _dir) = temp_db();
        let sender = fund_wallet(&db, "alice", 1000);
        let recipient = db.get_or_create_wallet("bob").unwrap();

        let completed = db
            .transfer("alice", &recipient.wallet_number, Money::from_minor(400), "trf_t1")
            .unwrap();

        assert_eq!(completed.sender.balance, Money::from_minor(600));
        assert_eq!(completed.recipient.balance, Money::from_minor(400));

        let debit = db.transaction_by_reference("trf_t1_dr").unwrap().unwrap();
        let credit = db.transaction_by_reference("trf_t1_cr").unwrap().unwrap();
        assert_eq!(debit.status, TxStatus::Success);
        assert_eq!(credit.status, TxStatus::Success);
        assert_eq!(debit.amount, Money::from_minor(400));
        assert_eq!(credit.amount, Money::from_minor(400));
        assert_eq!(debit.metadata.direction, Some(TransferDirection::Debit));
        assert_eq!(credit.metadata.direction, Some(TransferDirection::Credit));
        assert_eq!(
            debit.metadata.counterparty_wallet.as_deref(),
            Some(recipient.wallet_number.as_str())
        );
        assert_eq!(
            credit.metadata.counterparty_wallet.as_deref(),
            Some(sender.wallet_number.as_str())
        );
    }

    #[test]
    fn insufficient_funds_leaves_no_residue() {
        let (db, _dir) = temp_db();
        fund_wallet(&db, "alice", 300);
        let recipient = db.get_or_create_wallet("bob").unwrap();

        let err = db
            .transfer("alice", &recipient.wallet_number, Money::from_minor(400), "trf_t2")
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds));

        // No balance change, no ledger legs.
        let sender = db.get_or_create_wallet("alice").unwrap();
        assert_eq!(sender.balance, Money::from_minor(300));
        assert!(db.transaction_by_reference("trf_t2_dr").unwrap().is_none());
        assert!(db.transaction_by_reference("trf_t2_cr").unwrap().is_none());
    }

    #[test]
    fn self_transfer_is_rejected() {
        let (db, _dir) = temp_db();
        let wallet = fund_wallet(&db, "alice", 1000);
        let err = db
            .transfer("alice", &wallet.wallet_number, Money::from_minor(10), "trf_t3")
            .unwrap_err();
        assert!(matches!(err, LedgerError::SelfTransferRejected));
        let after = db.get_or_create_wallet("alice").unwrap();
        assert_eq!(after.balance, Money::from_minor(1000));
    }

    #[test]
    fn unknown_recipient_is_rejected() {
        let (db, _dir) = temp_db();
        fund_wallet(&db, "alice", 1000);
        let err = db
            .transfer("alice", "9999999999", Money::from_minor(10), "trf_t4")
            .unwrap_err();
        assert!(matches!(err, LedgerError::RecipientNotFound));
    }

    #[test]
    fn settle_deposit_credits_exactly_once() {
        let (db, _dir) = temp_db();
        let wallet = db.get_or_create_wallet("carol").unwrap();
        db.create_pending_deposit(
            &wallet.wallet_id,
            Money::from_minor(500_000),
            "dep_abc",
            TxMetadata::default(),
        )
        .unwrap();

        let first = db
            .settle_deposit("dep_abc", serde_json::json!({"amount": 500_000}))
            .unwrap();
        match first {
            SettleOutcome::Settled { ref wallet } => {
                assert_eq!(wallet.balance, Money::from_minor(500_000));
            }
            SettleOutcome::AlreadySettled => panic!("first settlement must credit"),
        }

        // Duplicate delivery: transaction stays success, balance unchanged.
        let second = db.settle_deposit("dep_abc", serde_json::json!({})).unwrap();
        assert!(matches!(second, SettleOutcome::AlreadySettled));
        let after = db.get_or_create_wallet("carol").unwrap();
        assert_eq!(after.balance, Money::from_minor(500_000));

        let tx = db.transaction_by_reference("dep_abc").unwrap().unwrap();
        assert_eq!(tx.status, TxStatus::Success);
    }

    #[test]
    fn settle_unknown_reference_fails() {
        let (db, _dir) = temp_db();
        let err = db
            .settle_deposit("dep_missing", serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, LedgerError::TransactionNotFound));
    }

    #[test]
    fn transactions_list_newest_first() {
        let (db, _dir) = temp_db();
        let wallet = db.get_or_create_wallet("dave").unwrap();
        for i in 0..3 {
            let mut tx = StoredTransaction::new_pending_deposit(
                format!("tx-{i}"),
                wallet.wallet_id.clone(),
                Money::from_minor(100),
                format!("dep_{i}"),
                TxMetadata::default(),
            );
            // Space entries a second apart so ordering is unambiguous.
            tx.created_at = chrono::Utc::now() - chrono::Duration::seconds(3 - i);
            let write_txn = db.db.begin_write().unwrap();
            {
                let mut tx_table = write_txn.open_table(TRANSACTIONS).unwrap();
                let mut ref_index = write_txn.open_table(TX_REFS).unwrap();
                let mut wallet_index = write_txn.open_table(WALLET_TX_INDEX).unwrap();
                LedgerDb::insert_transaction(
                    &mut tx_table,
                    &mut ref_index,
                    &mut wallet_index,
                    &tx,
                )
                .unwrap();
            }
            write_txn.commit().unwrap();
        }

        let listed = db.transactions_for_wallet(&wallet.wallet_id).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].reference, "dep_2");
        assert_eq!(listed[2].reference, "dep_0");
    }

    #[test]
    fn concurrent_transfers_never_overdraw() {
        let (db, _dir) = temp_db();
        fund_wallet(&db, "alice", 1000);
        let recipient = db.get_or_create_wallet("bob").unwrap();
        let number = recipient.wallet_number.clone();

        // Two transfers that individually fit but jointly exceed the balance.
        let db = Arc::new(db);
        let mut handles = Vec::new();
        for i in 0..2 {
            let db = Arc::clone(&db);
            let number = number.clone();
            handles.push(std::thread::spawn(move || {
                db.transfer("alice", &number, Money::from_minor(700), &format!("trf_race_{i}"))
                    .is_ok()
            }));
        }
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1, "exactly one racing transfer may win");
        let sender = db.get_or_create_wallet("alice").unwrap();
        let recipient = db.get_or_create_wallet("bob").unwrap();
        assert_eq!(sender.balance, Money::from_minor(300));
        assert_eq!(recipient.balance, Money::from_minor(700));
        assert!(sender.balance.minor_units() >= 0);
    }

    #[test]
    fn make_index_key_orders_newest_first() {
        let key_old = make_index_key("wallet", 1000, "tx1");
        let key_new = make_index_key("wallet", 2000, "tx2");
        assert!(key_new < key_old, "newer timestamps should sort first");
    }
}
