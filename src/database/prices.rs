// ABOUTME: Price repository operations
// ABOUTME: Handles the price variants attached to an item
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use sqlx::{Row, SqliteConnection};

use super::Database;
use crate::errors::LedgerResult;
use crate::models::Price;

pub async fn add_price(
    conn: &mut SqliteConnection,
    item_id: i64,
    price: &Price,
) -> LedgerResult<()> {
    sqlx::query("INSERT INTO prices (item_id, price, display_name) VALUES ($1, $2, $3)")
        .bind(item_id)
        .bind(price.price)
        .bind(&price.display_name)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn get_prices_for_item(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> LedgerResult<Vec<Price>> {
    let rows = sqlx::query(
        "SELECT price, display_name FROM prices WHERE item_id = $1 ORDER BY id",
    )
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Price {
            price: row.get("price"),
            display_name: row.get("display_name"),
        })
        .collect())
}

/// Remove every price of an item, returning the number of rows removed.
/// Replacing a price list is delete-then-insert inside one transaction.
pub async fn remove_prices_for_item(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> LedgerResult<u64> {
    let result = sqlx::query("DELETE FROM prices WHERE item_id = $1")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

impl Database {
    /// List the price variants of an item in definition order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_prices_for_item(&self, item_id: i64) -> LedgerResult<Vec<Price>> {
        let mut conn = self.pool().acquire().await?;
        get_prices_for_item(&mut conn, item_id).await
    }
}
