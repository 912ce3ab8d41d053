// ABOUTME: Database handle owning the connection pool and store lifecycle
// ABOUTME: Per-entity repositories extend this handle from their own modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! # Database Management
//!
//! [`Database`] wraps the connection pool and is the single entry point to
//! the store. Repositories extend it with entity operations from sibling
//! modules; composite ledger operations live in [`crate::ledger`].
//!
//! Construction is explicit: [`Database::new`] connects and validates that
//! the required relations exist, failing fast with the missing names.
//! Schema management is external; [`Database::ensure_schema`] provisions the
//! reference schema for tests and fresh deployments.

pub mod convert;
mod executor;
pub(crate) mod favorites;
pub(crate) mod groups;
pub(crate) mod items;
pub(crate) mod prices;
mod schema;
pub mod test_utils;
pub(crate) mod transactions;
pub(crate) mod users;

pub use executor::{Arg, Statement, TransactionGuard};

use std::collections::HashSet;
use std::str::FromStr as _;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::constants::limits;
use crate::errors::{LedgerError, LedgerResult};

/// Handle to the ledger store.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and validate the schema, failing fast if relations are
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or required tables/views
    /// are absent.
    pub async fn new(database_url: &str) -> LedgerResult<Self> {
        let db = Self::connect(database_url).await?;
        db.validate_schema().await?;
        info!("Database ready");
        Ok(db)
    }

    /// Connect without validating the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the connection
    /// fails.
    pub async fn connect(database_url: &str) -> LedgerResult<Self> {
        Self::connect_with(database_url, limits::DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect and validate using an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or required tables/views
    /// are absent.
    pub async fn from_config(config: &DatabaseConfig) -> LedgerResult<Self> {
        let db =
            Self::connect_with(&config.url.to_connection_string(), config.max_connections).await?;
        db.validate_schema().await?;
        info!(url = %config.url, "Database ready");
        Ok(db)
    }

    async fn connect_with(database_url: &str, max_connections: u32) -> LedgerResult<Self> {
        // Foreign keys are off by default in SQLite; the schema's cascade
        // and set-null actions depend on them.
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // A pooled in-memory database is per-connection; pin a single
        // permanent connection so every caller sees the same store.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        debug!(url = database_url, "Connected to database");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool for advanced operations.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the reference schema: tables, indexes, and derived views.
    ///
    /// Statements are idempotent; an already-provisioned store is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails.
    pub async fn ensure_schema(&self) -> LedgerResult<()> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Reference schema ensured");
        Ok(())
    }

    /// Check that every required table and view exists.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SchemaValidation`] naming the missing
    /// relations, or the store error if the catalog query fails.
    pub async fn validate_schema(&self) -> LedgerResult<()> {
        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type IN ('table', 'view')")
            .fetch_all(&self.pool)
            .await?;

        let present: HashSet<String> = rows.iter().map(|row| row.get("name")).collect();
        let missing = schema::missing_relations(&present);

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::SchemaValidation { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn validate_schema_reports_missing_relations() {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect to in-memory database");

        match db.validate_schema().await {
            Err(LedgerError::SchemaValidation { missing }) => {
                assert!(missing.contains(&"groups".to_owned()));
                assert!(missing.contains(&"full_items".to_owned()));
            }
            other => panic!("expected schema validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent_and_validates() {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect to in-memory database");

        db.ensure_schema().await.expect("provision schema");
        db.ensure_schema().await.expect("second provision is a no-op");
        db.validate_schema().await.expect("schema complete");
    }
}
