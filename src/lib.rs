// ABOUTME: Main library entry point for the tab ledger data layer
// ABOUTME: Provides groups, items, and transaction recording over SQLite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

#![deny(unsafe_code)]

//! # Tab Ledger
//!
//! A transactional data layer for shared tabs. Groups of users buy items
//! from shared stock, deposit money, and restock, and every event is an
//! immutable transaction from which balances, stock levels, and purchase
//! counters are derived.
//!
//! ## Features
//!
//! - **Atomic operations**: Every multi-statement flow commits whole or
//!   leaves no trace
//! - **Soft removal**: Transactions are flagged out of the derived numbers,
//!   never deleted
//! - **Purchase snapshots**: Lines copy the item's name, icon, and chosen
//!   price, so history survives item edits and deletions
//! - **Derived state**: Balances, stock, and purchase counters come from
//!   views over the log, never from stored counters
//!
//! ## Architecture
//!
//! - **Models**: Domain entities and request types
//! - **Database**: Connection handling, schema, and per-entity repositories
//! - **Ledger**: Use cases composing repositories into atomic operations
//! - **Pagination**: Offset windows over the transaction log
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tab_ledger::database::Database;
//! use tab_ledger::errors::LedgerResult;
//!
//! #[tokio::main]
//! async fn main() -> LedgerResult<()> {
//!     let db = Database::connect("sqlite:./data/ledger.db").await?;
//!     db.ensure_schema().await?;
//!
//!     let user = db
//!         .soft_create_group_and_user(uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
//!         .await?;
//!     println!("user {} starts at {:.2}", user.id, user.balance);
//!
//!     Ok(())
//! }
//! ```

/// Configuration management from environment variables
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Connection handling, schema management, and per-entity repositories
pub mod database;

/// Unified error handling for the data layer
pub mod errors;

/// Bit flag layouts for items and transactions
pub mod flags;

/// Ledger use cases composing repositories into atomic operations
pub mod ledger;

/// Production logging and structured output
pub mod logging;

/// Domain entities, request types, and sorting
pub mod models;

/// Offset windows and page links for log listings
pub mod pagination;
