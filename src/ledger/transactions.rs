// ABOUTME: Transaction log use cases over the repository layer
// ABOUTME: Paged newest-first listing and the soft-removal flag update
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::error;

use super::rollback_quietly;
use crate::database::{transactions as transaction_queries, Database};
use crate::errors::{LedgerError, LedgerResult};
use crate::flags::TransactionFlags;
use crate::models::Transaction;
use crate::pagination::{page_links, Window};

/// One page of a group's transaction log, newest first, with windows for
/// the neighboring pages where they exist.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    /// Transactions of this page, newest first.
    pub transactions: Vec<Transaction>,
    /// Window of the previous page, absent on the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Window>,
    /// Window of the next page, absent when the log ends inside this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Window>,
}

impl Database {
    /// List one page of a group's transaction log, newest first.
    ///
    /// Removed transactions stay in the log, flagged, so clients can show
    /// them struck through. The count behind the page windows includes
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails or a listed transaction
    /// cannot be assembled.
    pub async fn get_transactions_in_group(
        &self,
        group_id: i64,
        window: Window,
    ) -> LedgerResult<TransactionPage> {
        let mut conn = self.pool().acquire().await?;

        let count = transaction_queries::count_transactions_in_group(&mut conn, group_id).await?;
        let ids = transaction_queries::get_transaction_ids_in_group(
            &mut conn,
            group_id,
            window.limit,
            window.offset,
        )
        .await?;

        let mut transactions = Vec::with_capacity(ids.len());
        for id in ids {
            let transaction = transaction_queries::get_transaction(&mut conn, id)
                .await?
                .ok_or_else(|| {
                    LedgerError::Integrity(format!("transaction {id} vanished during listing"))
                })?;
            transactions.push(transaction);
        }

        let links = page_links(window.offset, window.limit, count);
        Ok(TransactionPage {
            transactions,
            previous: links.previous,
            next: links.next,
        })
    }

    /// Update a transaction's removed flag and return its new state.
    ///
    /// Removal is soft. A removed transaction keeps its rows but stops
    /// counting toward balances, stock, and purchase counters. Passing
    /// `None` changes nothing and returns the current state.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if the transaction does not exist,
    /// and [`LedgerError::OperationFailed`] for any other failure, with the
    /// cause logged.
    pub async fn update_transaction(
        &self,
        transaction_id: i64,
        removed: Option<bool>,
    ) -> LedgerResult<Transaction> {
        let mut guard = self.begin().await?;
        let result = apply_transaction_update(guard.executor()?, transaction_id, removed).await;
        let transaction = match result {
            Ok(transaction) => transaction,
            Err(error) if error.is_not_found() => {
                rollback_quietly(guard).await;
                return Err(error);
            }
            Err(error) => {
                error!(transaction_id, %error, "Transaction update failed");
                rollback_quietly(guard).await;
                return Err(LedgerError::OperationFailed {
                    operation: "update transaction",
                });
            }
        };
        guard.commit().await?;

        Ok(transaction)
    }
}

async fn apply_transaction_update(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    removed: Option<bool>,
) -> LedgerResult<Transaction> {
    if transaction_queries::get_transaction_flags(conn, transaction_id)
        .await?
        .is_none()
    {
        return Err(LedgerError::not_found("transaction", transaction_id));
    }

    match removed {
        Some(true) => {
            transaction_queries::set_transaction_flag(
                conn,
                transaction_id,
                TransactionFlags::REMOVED.bits(),
            )
            .await?;
        }
        Some(false) => {
            transaction_queries::clear_transaction_flag(
                conn,
                transaction_id,
                TransactionFlags::REMOVED.bits(),
            )
            .await?;
        }
        None => {}
    }

    transaction_queries::get_transaction(conn, transaction_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("transaction", transaction_id))
}
