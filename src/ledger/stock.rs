// ABOUTME: Stock update recording over the repository layer
// ABOUTME: Resolves relative adjustments against current stock inside the transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use sqlx::SqliteConnection;
use tracing::debug;

use super::{read_back, rollback_quietly};
use crate::database::{items, transactions as transaction_queries, Database};
use crate::errors::{LedgerError, LedgerResult};
use crate::models::{normalize_comment, StockUpdateRequestItem, Transaction, TransactionKind};

impl Database {
    /// Record a stock update for one or more items and return the stored
    /// transaction.
    ///
    /// Absolute lines set the stock to the given quantity. Relative lines
    /// add the quantity, negative included, to the item's current stock.
    /// Either way the line stores the resulting absolute stock, so later
    /// updates never change what was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Integrity`] if `items` is empty,
    /// [`LedgerError::NotFound`] if a line names an item not in the group,
    /// or an error if the store fails. On any failure nothing is recorded.
    pub async fn create_stock_update(
        &self,
        group_id: i64,
        created_by: i64,
        comment: Option<&str>,
        items: &[StockUpdateRequestItem],
    ) -> LedgerResult<Transaction> {
        if items.is_empty() {
            return Err(LedgerError::Integrity(
                "a stock update needs at least one item".into(),
            ));
        }
        let comment = normalize_comment(comment);

        let mut guard = self.begin().await?;
        let transaction = match insert_stock_update(
            guard.executor()?,
            group_id,
            created_by,
            comment.as_deref(),
            items,
        )
        .await
        {
            Ok(transaction) => transaction,
            Err(error) => {
                rollback_quietly(guard).await;
                return Err(error);
            }
        };
        guard.commit().await?;

        debug!(
            transaction_id = transaction.id(),
            group_id,
            lines = items.len(),
            "Recorded stock update"
        );
        Ok(transaction)
    }
}

async fn insert_stock_update(
    conn: &mut SqliteConnection,
    group_id: i64,
    created_by: i64,
    comment: Option<&str>,
    lines: &[StockUpdateRequestItem],
) -> LedgerResult<Transaction> {
    let transaction_id = transaction_queries::create_transaction(
        conn,
        group_id,
        TransactionKind::StockUpdate,
        created_by,
        None,
        comment,
    )
    .await?;

    for line in lines {
        if !items::item_exists_in_group(conn, line.item_id, group_id).await? {
            return Err(LedgerError::not_found("item", line.item_id));
        }

        // Earlier lines of this same update are already visible here, so
        // repeated lines for one item chain their adjustments.
        let after = if line.absolute {
            line.quantity
        } else {
            let current = items::get_item_stock(conn, line.item_id).await?.unwrap_or(0);
            current + line.quantity
        };

        transaction_queries::add_item_stock_update(conn, transaction_id, line.item_id, after)
            .await?;
    }

    read_back(conn, transaction_id, TransactionKind::StockUpdate).await
}
