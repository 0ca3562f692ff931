// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Koru Wallet - Custodial Ledger & Payment Reconciliation Service
//!
//! This crate provides a custodial wallet ledger with atomic wallet-to-wallet
//! transfers and idempotent reconciliation of Paystack deposit webhooks.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Trusted caller identity forwarded by the gateway
//! - `ledger` - Durable ledger: wallets, transactions, transfers, settlement
//! - `providers` - Payment provider clients (Paystack)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod ledger;
pub mod money;
pub mod providers;
pub mod state;
