// ABOUTME: Group repository operations
// ABOUTME: Handles group creation, lookups, and the idempotent login soft-create
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use sqlx::SqliteConnection;
use tracing::error;
use uuid::Uuid;

use super::{convert, Database, Statement};
use crate::errors::{LedgerError, LedgerResult};
use crate::models::{FullUser, Group};

pub async fn create_group(
    conn: &mut SqliteConnection,
    external_id: Uuid,
) -> LedgerResult<Group> {
    let row = sqlx::query("INSERT INTO groups (external_id) VALUES ($1) RETURNING id, external_id")
        .bind(external_id.to_string())
        .fetch_one(&mut *conn)
        .await?;

    convert::group_from_row(&row)
}

pub async fn get_group(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> LedgerResult<Option<Group>> {
    let row = sqlx::query("SELECT id, external_id FROM groups WHERE id = $1")
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(convert::group_from_row).transpose()
}

pub async fn group_exists(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT 1 FROM groups WHERE id = $1")
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

pub async fn external_group_exists(
    conn: &mut SqliteConnection,
    external_id: Uuid,
) -> LedgerResult<bool> {
    let row = sqlx::query("SELECT 1 FROM groups WHERE external_id = $1")
        .bind(external_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.is_some())
}

impl Database {
    /// Create a group for a federated group id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already registered or the store fails.
    pub async fn create_group(&self, external_id: Uuid) -> LedgerResult<Group> {
        let mut conn = self.pool().acquire().await?;
        create_group(&mut conn, external_id).await
    }

    /// Get a group by local id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn get_group(&self, group_id: i64) -> LedgerResult<Option<Group>> {
        let mut conn = self.pool().acquire().await?;
        get_group(&mut conn, group_id).await
    }

    /// Check whether a group exists by local id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn group_exists(&self, group_id: i64) -> LedgerResult<bool> {
        let mut conn = self.pool().acquire().await?;
        group_exists(&mut conn, group_id).await
    }

    /// Check whether a group exists for a federated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn external_group_exists(&self, external_id: Uuid) -> LedgerResult<bool> {
        let mut conn = self.pool().acquire().await?;
        external_group_exists(&mut conn, external_id).await
    }

    /// Create the group and user for an authenticated login if either is
    /// absent, then return the full user.
    ///
    /// Idempotent: repeated calls for the same identifiers return the same
    /// user. Runs as one atomic script, so a half-created pair is never
    /// observable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, or
    /// [`LedgerError::OperationFailed`] if the user cannot be read back
    /// afterwards.
    pub async fn soft_create_group_and_user(
        &self,
        external_group_id: Uuid,
        external_user_id: Uuid,
    ) -> LedgerResult<FullUser> {
        let statements = [
            Statement::new(
                "INSERT INTO groups (external_id) VALUES ($1) \
                 ON CONFLICT (external_id) DO NOTHING",
            )
            .bind(external_group_id),
            Statement::new(
                "INSERT INTO users (external_id, group_id) \
                 SELECT $1, id FROM groups WHERE external_id = $2 \
                 ON CONFLICT (external_id) DO NOTHING",
            )
            .bind(external_user_id)
            .bind(external_group_id),
            Statement::new(
                "SELECT id, group_id, external_id, group_external_id, balance \
                 FROM full_users WHERE external_id = $1",
            )
            .bind(external_user_id),
        ];

        let rows = self.execute_script(&statements).await?.unwrap_or_default();
        match rows.first() {
            Some(row) => convert::full_user_from_row(row),
            None => {
                error!(
                    group = %external_group_id,
                    user = %external_user_id,
                    "Soft-create committed but the user could not be read back"
                );
                Err(LedgerError::OperationFailed {
                    operation: "soft-create group and user",
                })
            }
        }
    }
}
