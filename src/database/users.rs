// ABOUTME: User repository operations
// ABOUTME: Handles user creation, lookups, and balance-bearing full user reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{convert, Database};
use crate::errors::LedgerResult;
use crate::models::{FullUser, User};

pub async fn create_user(
    conn: &mut SqliteConnection,
    external_id: Uuid,
    group_id: i64,
) -> LedgerResult<User> {
    let row = sqlx::query(
        "INSERT INTO users (external_id, group_id) VALUES ($1, $2) \
         RETURNING id, group_id, external_id",
    )
    .bind(external_id.to_string())
    .bind(group_id)
    .fetch_one(&mut *conn)
    .await?;

    convert::user_from_row(&row)
}

pub async fn get_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> LedgerResult<Option<User>> {
    let row = sqlx::query("SELECT id, group_id, external_id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(convert::user_from_row).transpose()
}

pub async fn get_full_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> LedgerResult<Option<FullUser>> {
    let row = sqlx::query(
        "SELECT id, group_id, external_id, group_external_id, balance \
         FROM full_users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(convert::full_user_from_row).transpose()
}

pub async fn get_users_in_group(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> LedgerResult<Vec<User>> {
    let rows = sqlx::query(
        "SELECT id, group_id, external_id FROM users WHERE group_id = $1 ORDER BY id",
    )
    .bind(group_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(convert::user_from_row).collect()
}

pub async fn get_full_users_in_group(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> LedgerResult<Vec<FullUser>> {
    let rows = sqlx::query(
        "SELECT id, group_id, external_id, group_external_id, balance \
         FROM full_users WHERE group_id = $1 ORDER BY id",
    )
    .bind(group_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(convert::full_user_from_row).collect()
}

pub async fn user_exists_in_group(
    conn: &mut SqliteConnection,
    user_id: i64,
    group_id: i64,
) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT 1 FROM users WHERE id = $1 AND group_id = $2")
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

impl Database {
    /// Create a user in a group for a federated user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already registered, the group does not
    /// exist, or the store fails.
    pub async fn create_user(&self, external_id: Uuid, group_id: i64) -> LedgerResult<User> {
        let mut conn = self.pool().acquire().await?;
        create_user(&mut conn, external_id, group_id).await
    }

    /// Get a user by local id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_user(&self, user_id: i64) -> LedgerResult<Option<User>> {
        let mut conn = self.pool().acquire().await?;
        get_user(&mut conn, user_id).await
    }

    /// Get a user together with their derived balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_full_user(&self, user_id: i64) -> LedgerResult<Option<FullUser>> {
        let mut conn = self.pool().acquire().await?;
        get_full_user(&mut conn, user_id).await
    }

    /// List the users of a group in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_users_in_group(&self, group_id: i64) -> LedgerResult<Vec<User>> {
        let mut conn = self.pool().acquire().await?;
        get_users_in_group(&mut conn, group_id).await
    }

    /// List the users of a group with their derived balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_full_users_in_group(&self, group_id: i64) -> LedgerResult<Vec<FullUser>> {
        let mut conn = self.pool().acquire().await?;
        get_full_users_in_group(&mut conn, group_id).await
    }

    /// Check whether a user belongs to a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn user_exists_in_group(&self, user_id: i64, group_id: i64) -> LedgerResult<bool> {
        let mut conn = self.pool().acquire().await?;
        user_exists_in_group(&mut conn, user_id, group_id).await
    }
}
