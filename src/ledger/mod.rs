// ABOUTME: Ledger operations composing repository calls into atomic use cases
// ABOUTME: Each operation runs inside one transaction and returns full entities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Ledger operations.
//!
//! These compose the repository queries in `database` into the use cases of
//! the tab: managing items, recording purchases, deposits, and stock
//! updates, and listing the transaction log. Every multi-statement flow runs
//! inside one store transaction and either commits whole or leaves no trace.

mod deposits;
mod items;
mod purchases;
mod stock;
mod transactions;

pub use transactions::TransactionPage;

use sqlx::SqliteConnection;
use tracing::warn;

use crate::database::{transactions as transaction_queries, TransactionGuard};
use crate::errors::{LedgerError, LedgerResult};
use crate::models::{Transaction, TransactionKind};

/// Roll back a failed operation. The caller keeps its original error even if
/// the rollback itself fails, which is only worth a warning.
pub(crate) async fn rollback_quietly(guard: TransactionGuard<'_>) {
    if let Err(error) = guard.rollback().await {
        warn!(%error, "Rollback after a failed operation also failed");
    }
}

/// Re-read a transaction just written in the current store transaction and
/// check it came back as the expected kind.
pub(crate) async fn read_back(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    expected: TransactionKind,
) -> LedgerResult<Transaction> {
    let transaction = transaction_queries::get_transaction(conn, transaction_id)
        .await?
        .ok_or_else(|| {
            LedgerError::Integrity(format!("transaction {transaction_id} missing after write"))
        })?;

    if transaction.kind() != expected {
        return Err(LedgerError::Integrity(format!(
            "transaction {transaction_id} came back as {} rather than {expected}",
            transaction.kind()
        )));
    }

    Ok(transaction)
}
