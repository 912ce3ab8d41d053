// ABOUTME: Item repository operations
// ABOUTME: Handles item rows, flag masks, and the price-joined full item reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::Database;
use crate::errors::LedgerResult;
use crate::flags::ItemFlags;

/// Bare item row without derived columns, used for snapshots and ownership
/// checks inside transactional flows.
#[derive(Debug, Clone)]
pub struct ItemRow {
    pub id: i64,
    pub group_id: i64,
    pub display_name: String,
    pub icon_url: Option<String>,
}

/// Columns selected for every full item read. One row per price, so
/// converters regroup them by item id.
const FULL_ITEM_COLUMNS: &str = "i.id, i.group_id, i.display_name, i.icon_url, i.created_time, \
     i.flags, i.stock, i.times_purchased, p.price, p.display_name AS price_name, \
     EXISTS(SELECT 1 FROM favorite_items f WHERE f.user_id = $2 AND f.item_id = i.id) AS favorite";

pub async fn create_bare_item(
    conn: &mut SqliteConnection,
    group_id: i64,
    display_name: &str,
    icon_url: Option<&str>,
) -> LedgerResult<i64> {
    let row = sqlx::query(
        "INSERT INTO items (group_id, display_name, icon_url, created_time) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(group_id)
    .bind(display_name)
    .bind(icon_url)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.get("id"))
}

pub async fn get_item(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> LedgerResult<Option<ItemRow>> {
    let row = sqlx::query("SELECT id, group_id, display_name, icon_url FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|row| ItemRow {
        id: row.get("id"),
        group_id: row.get("group_id"),
        display_name: row.get("display_name"),
        icon_url: row.get("icon_url"),
    }))
}

/// Latest recorded stock of an item, `None` if the item does not exist.
pub async fn get_item_stock(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> LedgerResult<Option<i64>> {
    let stock = sqlx::query_scalar("SELECT stock FROM item_stock WHERE item_id = $1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(stock)
}

/// One row per price for a single item, with the caller's favorite marker.
pub async fn get_full_item_with_prices(
    conn: &mut SqliteConnection,
    item_id: i64,
    user_id: i64,
) -> LedgerResult<Vec<SqliteRow>> {
    let sql = format!(
        "SELECT {FULL_ITEM_COLUMNS} FROM full_items i \
         JOIN prices p ON p.item_id = i.id \
         WHERE i.id = $1 ORDER BY p.id"
    );
    let rows = sqlx::query(&sql)
        .bind(item_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// One row per item and price across a group, grouped back into items by the
/// converter. Items keep their creation order here; sorting is a caller
/// concern.
pub async fn get_full_items_with_prices_in_group(
    conn: &mut SqliteConnection,
    group_id: i64,
    user_id: i64,
) -> LedgerResult<Vec<SqliteRow>> {
    let sql = format!(
        "SELECT {FULL_ITEM_COLUMNS} FROM full_items i \
         JOIN prices p ON p.item_id = i.id \
         WHERE i.group_id = $1 ORDER BY i.id, p.id"
    );
    let rows = sqlx::query(&sql)
        .bind(group_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

pub async fn item_exists_in_group(
    conn: &mut SqliteConnection,
    item_id: i64,
    group_id: i64,
) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT 1 FROM items WHERE id = $1 AND group_id = $2")
        .bind(item_id)
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

/// Case-sensitive name check, matching the unique index on
/// `(group_id, display_name)`.
pub async fn item_name_exists_in_group(
    conn: &mut SqliteConnection,
    display_name: &str,
    group_id: i64,
) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT 1 FROM items WHERE group_id = $1 AND display_name = $2")
        .bind(group_id)
        .bind(display_name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

pub async fn is_item_visible(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> LedgerResult<Option<bool>> {
    let flags = get_item_flags(conn, item_id).await?;
    Ok(flags.map(|flags| !ItemFlags::is_invisible(flags)))
}

pub async fn set_item_display_name(
    conn: &mut SqliteConnection,
    item_id: i64,
    display_name: &str,
) -> LedgerResult<()> {
    sqlx::query("UPDATE items SET display_name = $2 WHERE id = $1")
        .bind(item_id)
        .bind(display_name)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn set_item_icon_url(
    conn: &mut SqliteConnection,
    item_id: i64,
    icon_url: Option<&str>,
) -> LedgerResult<()> {
    sqlx::query("UPDATE items SET icon_url = $2 WHERE id = $1")
        .bind(item_id)
        .bind(icon_url)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Delete an item row, returning the number of rows removed. Prices and
/// favorites cascade; purchased line snapshots keep their copied fields with
/// the item reference set to null.
pub async fn delete_item(conn: &mut SqliteConnection, item_id: i64) -> LedgerResult<u64> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn get_item_flags(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> LedgerResult<Option<i64>> {
    let flags = sqlx::query_scalar("SELECT flags FROM items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(flags)
}

/// Set the bits of `mask` on an item, leaving all other bits untouched.
pub async fn set_item_flag(
    conn: &mut SqliteConnection,
    item_id: i64,
    mask: i64,
) -> LedgerResult<()> {
    sqlx::query("UPDATE items SET flags = flags | $2 WHERE id = $1")
        .bind(item_id)
        .bind(mask)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Clear the bits of `mask` on an item, leaving all other bits untouched.
pub async fn clear_item_flag(
    conn: &mut SqliteConnection,
    item_id: i64,
    mask: i64,
) -> LedgerResult<()> {
    sqlx::query("UPDATE items SET flags = flags & ~$2 WHERE id = $1")
        .bind(item_id)
        .bind(mask)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

impl Database {
    /// Check whether an item belongs to a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn item_exists_in_group(&self, item_id: i64, group_id: i64) -> LedgerResult<bool> {
        let mut conn = self.pool().acquire().await?;
        item_exists_in_group(&mut conn, item_id, group_id).await
    }

    /// Check whether a group already has an item with this exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn item_name_exists_in_group(
        &self,
        display_name: &str,
        group_id: i64,
    ) -> LedgerResult<bool> {
        let mut conn = self.pool().acquire().await?;
        item_name_exists_in_group(&mut conn, display_name, group_id).await
    }

    /// Check whether an item is visible, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn is_item_visible(&self, item_id: i64) -> LedgerResult<Option<bool>> {
        let mut conn = self.pool().acquire().await?;
        is_item_visible(&mut conn, item_id).await
    }

    /// Raw flag bits of an item, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_item_flags(&self, item_id: i64) -> LedgerResult<Option<i64>> {
        let mut conn = self.pool().acquire().await?;
        get_item_flags(&mut conn, item_id).await
    }

    /// Set flag bits on an item without touching the rest of the mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn set_item_flag(&self, item_id: i64, mask: i64) -> LedgerResult<()> {
        let mut conn = self.pool().acquire().await?;
        set_item_flag(&mut conn, item_id, mask).await
    }

    /// Clear flag bits on an item without touching the rest of the mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn clear_item_flag(&self, item_id: i64, mask: i64) -> LedgerResult<()> {
        let mut conn = self.pool().acquire().await?;
        clear_item_flag(&mut conn, item_id, mask).await
    }
}
