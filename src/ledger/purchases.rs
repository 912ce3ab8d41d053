// ABOUTME: Purchase recording over the repository layer
// ABOUTME: Copies item name, icon, and chosen price into immutable lines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use sqlx::SqliteConnection;
use tracing::debug;

use super::{read_back, rollback_quietly};
use crate::database::{items, transactions as transaction_queries, Database};
use crate::errors::{LedgerError, LedgerResult};
use crate::models::{normalize_comment, PurchaseRequestItem, Transaction, TransactionKind};

impl Database {
    /// Record a purchase of one or more items and return the stored
    /// transaction.
    ///
    /// Each line copies the item's current name and icon together with the
    /// price the caller picked, so later item edits or deletions never
    /// change what was bought. Comments longer than the limit are stored as
    /// absent. `created_for` names the user whose tab is charged when
    /// someone else records the purchase; absent, the creator is charged.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Integrity`] if `items` is empty,
    /// [`LedgerError::NotFound`] if a line names an item not in the group,
    /// or an error if the store fails. On any failure nothing is recorded.
    pub async fn create_purchase(
        &self,
        group_id: i64,
        created_by: i64,
        created_for: Option<i64>,
        comment: Option<&str>,
        items: &[PurchaseRequestItem],
    ) -> LedgerResult<Transaction> {
        if items.is_empty() {
            return Err(LedgerError::Integrity(
                "a purchase needs at least one item".into(),
            ));
        }
        let comment = normalize_comment(comment);

        let mut guard = self.begin().await?;
        let transaction = match insert_purchase(
            guard.executor()?,
            group_id,
            created_by,
            created_for,
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
            "Recorded purchase"
        );
        Ok(transaction)
    }
}

async fn insert_purchase(
    conn: &mut SqliteConnection,
    group_id: i64,
    created_by: i64,
    created_for: Option<i64>,
    comment: Option<&str>,
    lines: &[PurchaseRequestItem],
) -> LedgerResult<Transaction> {
    let transaction_id = transaction_queries::create_transaction(
        conn,
        group_id,
        TransactionKind::Purchase,
        created_by,
        created_for,
        comment,
    )
    .await?;

    for line in lines {
        let item = items::get_item(conn, line.item_id)
            .await?
            .filter(|item| item.group_id == group_id)
            .ok_or_else(|| LedgerError::not_found("item", line.item_id))?;

        transaction_queries::add_purchased_item(
            conn,
            transaction_id,
            item.id,
            &item.display_name,
            item.icon_url.as_deref(),
            line.quantity,
            &line.purchase_price,
        )
        .await?;
    }

    read_back(conn, transaction_id, TransactionKind::Purchase).await
}
