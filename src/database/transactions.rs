// ABOUTME: Transaction repository operations
// ABOUTME: Handles transaction headers, per-kind line rows, and the dispatching reader
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use super::{convert, Database};
use crate::errors::{LedgerError, LedgerResult};
use crate::models::{Price, Transaction, TransactionKind};

/// Insert a transaction header and return its id. Line rows are added
/// separately within the same enclosing transaction.
///
/// `created_for` is resolved at write time: an absent value is stored as
/// the creator, so the balance views never see an unattributed row.
pub async fn create_transaction(
    conn: &mut SqliteConnection,
    group_id: i64,
    kind: TransactionKind,
    created_by: i64,
    created_for: Option<i64>,
    comment: Option<&str>,
) -> LedgerResult<i64> {
    let row = sqlx::query(
        "INSERT INTO transactions (group_id, kind, created_by, created_for, comment, created_time) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(group_id)
    .bind(kind.as_str())
    .bind(created_by)
    .bind(created_for.unwrap_or(created_by))
    .bind(comment)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.get("id"))
}

/// Insert a purchased line. Name, icon, and price are copied into the row so
/// the line stays intact when the item later changes or disappears.
pub async fn add_purchased_item(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    item_id: i64,
    display_name: &str,
    icon_url: Option<&str>,
    quantity: i64,
    purchase_price: &Price,
) -> LedgerResult<()> {
    sqlx::query(
        "INSERT INTO purchased_items \
         (transaction_id, item_id, display_name, icon_url, quantity, purchase_price, purchase_price_name) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(transaction_id)
    .bind(item_id)
    .bind(display_name)
    .bind(icon_url)
    .bind(quantity)
    .bind(purchase_price.price)
    .bind(&purchase_price.display_name)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Insert a stock line holding the absolute stock after the update.
pub async fn add_item_stock_update(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    item_id: i64,
    stock: i64,
) -> LedgerResult<()> {
    sqlx::query(
        "INSERT INTO item_stock_updates (transaction_id, item_id, stock) VALUES ($1, $2, $3)",
    )
    .bind(transaction_id)
    .bind(item_id)
    .bind(stock)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Read one transaction, dispatching on its stored kind to the matching
/// line query and converter.
pub async fn get_transaction(
    conn: &mut SqliteConnection,
    transaction_id: i64,
) -> LedgerResult<Option<Transaction>> {
    let header = sqlx::query("SELECT kind FROM transactions WHERE id = $1")
        .bind(transaction_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(header) = header else {
        return Ok(None);
    };
    let kind: String = header.get("kind");

    let transaction = match kind.parse::<TransactionKind>()? {
        TransactionKind::Purchase => {
            let rows = sqlx::query(
                "SELECT id, created_by, created_for, created_time, flags, comment, \
                        line_id, item_id, display_name, icon_url, quantity, \
                        purchase_price, purchase_price_name \
                 FROM full_purchases WHERE id = $1 ORDER BY line_id",
            )
            .bind(transaction_id)
            .fetch_all(&mut *conn)
            .await?;
            Transaction::Purchase(convert::purchase_from_rows(&rows)?)
        }
        TransactionKind::Deposit => {
            let row = sqlx::query(
                "SELECT t.id, t.created_by, t.created_for, t.created_time, t.flags, \
                        t.comment, d.total \
                 FROM transactions t JOIN deposits d ON d.transaction_id = t.id \
                 WHERE t.id = $1",
            )
            .bind(transaction_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| {
                LedgerError::Integrity(format!(
                    "deposit transaction {transaction_id} has no deposit row"
                ))
            })?;
            Transaction::Deposit(convert::deposit_from_row(&row)?)
        }
        TransactionKind::StockUpdate => {
            let rows = sqlx::query(
                "SELECT id, created_by, created_time, flags, comment, \
                        line_id, item_id, before_stock, after_stock \
                 FROM full_stock_updates WHERE id = $1 ORDER BY line_id",
            )
            .bind(transaction_id)
            .fetch_all(&mut *conn)
            .await?;
            Transaction::StockUpdate(convert::stock_update_from_rows(&rows)?)
        }
    };

    Ok(Some(transaction))
}

pub async fn transaction_exists_in_group(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    group_id: i64,
) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT 1 FROM transactions WHERE id = $1 AND group_id = $2")
        .bind(transaction_id)
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

pub async fn count_transactions_in_group(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> LedgerResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE group_id = $1")
        .bind(group_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

/// One page of transaction ids, newest first.
pub async fn get_transaction_ids_in_group(
    conn: &mut SqliteConnection,
    group_id: i64,
    limit: i64,
    offset: i64,
) -> LedgerResult<Vec<i64>> {
    let ids = sqlx::query_scalar(
        "SELECT id FROM transactions WHERE group_id = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
    )
    .bind(group_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

pub async fn get_transaction_flags(
    conn: &mut SqliteConnection,
    transaction_id: i64,
) -> LedgerResult<Option<i64>> {
    let flags = sqlx::query_scalar("SELECT flags FROM transactions WHERE id = $1")
        .bind(transaction_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(flags)
}

/// Set the bits of `mask` on a transaction, leaving all other bits untouched.
pub async fn set_transaction_flag(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    mask: i64,
) -> LedgerResult<()> {
    sqlx::query("UPDATE transactions SET flags = flags | $2 WHERE id = $1")
        .bind(transaction_id)
        .bind(mask)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Clear the bits of `mask` on a transaction, leaving all other bits
/// untouched.
pub async fn clear_transaction_flag(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    mask: i64,
) -> LedgerResult<()> {
    sqlx::query("UPDATE transactions SET flags = flags & ~$2 WHERE id = $1")
        .bind(transaction_id)
        .bind(mask)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

impl Database {
    /// Read one transaction of any kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails or the stored rows are
    /// inconsistent.
    pub async fn get_transaction(&self, transaction_id: i64) -> LedgerResult<Option<Transaction>> {
        let mut conn = self.pool().acquire().await?;
        get_transaction(&mut conn, transaction_id).await
    }

    /// Check whether a transaction belongs to a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn transaction_exists_in_group(
        &self,
        transaction_id: i64,
        group_id: i64,
    ) -> LedgerResult<bool> {
        let mut conn = self.pool().acquire().await?;
        transaction_exists_in_group(&mut conn, transaction_id, group_id).await
    }

    /// Total number of transactions recorded for a group, removed ones
    /// included.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn count_transactions_in_group(&self, group_id: i64) -> LedgerResult<i64> {
        let mut conn = self.pool().acquire().await?;
        count_transactions_in_group(&mut conn, group_id).await
    }

    /// Raw flag bits of a transaction, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_transaction_flags(&self, transaction_id: i64) -> LedgerResult<Option<i64>> {
        let mut conn = self.pool().acquire().await?;
        get_transaction_flags(&mut conn, transaction_id).await
    }

    /// Set flag bits on a transaction without touching the rest of the mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn set_transaction_flag(&self, transaction_id: i64, mask: i64) -> LedgerResult<()> {
        let mut conn = self.pool().acquire().await?;
        set_transaction_flag(&mut conn, transaction_id, mask).await
    }

    /// Clear flag bits on a transaction without touching the rest of the
    /// mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn clear_transaction_flag(&self, transaction_id: i64, mask: i64) -> LedgerResult<()> {
        let mut conn = self.pool().acquire().await?;
        clear_transaction_flag(&mut conn, transaction_id, mask).await
    }
}
