// ABOUTME: Favorite item repository operations
// ABOUTME: Handles the per-user favorite relation over items
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use sqlx::SqliteConnection;

use super::Database;
use crate::errors::LedgerResult;

/// Mark an item as a favorite of a user. Idempotent.
pub async fn add_favorite(
    conn: &mut SqliteConnection,
    user_id: i64,
    item_id: i64,
) -> LedgerResult<()> {
    sqlx::query(
        "INSERT INTO favorite_items (user_id, item_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, item_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(item_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Remove a favorite marker. Removing an absent marker is a no-op.
pub async fn remove_favorite(
    conn: &mut SqliteConnection,
    user_id: i64,
    item_id: i64,
) -> LedgerResult<()> {
    sqlx::query("DELETE FROM favorite_items WHERE user_id = $1 AND item_id = $2")
        .bind(user_id)
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn is_favorite(
    conn: &mut SqliteConnection,
    user_id: i64,
    item_id: i64,
) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT 1 FROM favorite_items WHERE user_id = $1 AND item_id = $2")
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

impl Database {
    /// Mark an item as a favorite of a user. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the user or item does not exist, or the store
    /// fails.
    pub async fn add_favorite(&self, user_id: i64, item_id: i64) -> LedgerResult<()> {
        let mut conn = self.pool().acquire().await?;
        add_favorite(&mut conn, user_id, item_id).await
    }

    /// Remove a favorite marker. Removing an absent marker is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn remove_favorite(&self, user_id: i64, item_id: i64) -> LedgerResult<()> {
        let mut conn = self.pool().acquire().await?;
        remove_favorite(&mut conn, user_id, item_id).await
    }

    /// Check whether a user has marked an item as a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn is_favorite(&self, user_id: i64, item_id: i64) -> LedgerResult<bool> {
        let mut conn = self.pool().acquire().await?;
        is_favorite(&mut conn, user_id, item_id).await
    }
}
