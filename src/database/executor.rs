// ABOUTME: Statement and script execution with transactional guarantees
// ABOUTME: Provides the RAII transaction guard every composite operation runs through
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Transactional executor.
//!
//! Two forms, and every multi-statement write in the crate goes through one
//! of them:
//!
//! - the *script* form ([`Database::execute_script`]) runs an ordered list of
//!   [`Statement`]s inside one transaction and returns the rows of the last
//!   statement that produced any;
//! - the *session* form ([`Database::begin`]) hands out a [`TransactionGuard`]
//!   whose connection the read-dependent ledger operations drive directly.
//!
//! No other module issues BEGIN, COMMIT, or ROLLBACK. Both forms hold exactly
//! one pooled connection for their lifetime, so statements in a transaction
//! are sequential by construction and `last_insert_rowid()` carries between
//! script statements.

use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use super::Database;
use crate::errors::{LedgerError, LedgerResult};

/// One owned positional argument of a [`Statement`].
///
/// Uuids are stored as their hyphenated text form; timestamps in the store's
/// datetime text encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// 64-bit integer
    Int(i64),
    /// Double-precision float
    Real(f64),
    /// Text
    Text(String),
    /// Boolean
    Bool(bool),
    /// Federated identifier, bound as text
    Uuid(Uuid),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// SQL NULL
    Null,
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Uuid> for Arg {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<DateTime<Utc>> for Arg {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A SQL string paired with its owned positional arguments.
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    args: Vec<Arg>,
}

impl Statement {
    /// Create a statement with no arguments yet.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Append one positional argument.
    #[must_use]
    pub fn bind(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound arguments, in order.
    #[must_use]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    fn query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        let mut query = sqlx::query(&self.sql);
        for arg in &self.args {
            query = match arg {
                Arg::Int(v) => query.bind(*v),
                Arg::Real(v) => query.bind(*v),
                Arg::Text(v) => query.bind(v.as_str()),
                Arg::Bool(v) => query.bind(*v),
                Arg::Uuid(v) => query.bind(v.to_string()),
                Arg::Timestamp(v) => query.bind(*v),
                Arg::Null => query.bind(None::<String>),
            };
        }
        query
    }

    /// Run the statement on a connection and collect its rows.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the statement fails.
    pub async fn fetch_all(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<SqliteRow>, sqlx::Error> {
        self.query().fetch_all(conn).await
    }
}

impl Database {
    /// Begin a transaction and wrap it in a [`TransactionGuard`].
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be acquired from the pool.
    pub async fn begin(&self) -> LedgerResult<TransactionGuard<'static>> {
        Ok(TransactionGuard::new(self.pool().begin().await?))
    }

    /// Execute a single statement outside any explicit transaction and
    /// return the rows it produced.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails or no connection can be
    /// acquired from the pool.
    pub async fn execute_statement(&self, statement: &Statement) -> LedgerResult<Vec<SqliteRow>> {
        let mut conn = self.pool().acquire().await?;
        Ok(statement.fetch_all(&mut conn).await?)
    }

    /// Execute an ordered list of statements as one atomic transaction.
    ///
    /// Returns the rows of the last statement that produced at least one
    /// row, or `None` if no statement did. On any statement failure the
    /// whole transaction is rolled back and the original failure is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Integrity`] for an empty statement list, and
    /// the underlying store error if any statement or the commit fails.
    pub async fn execute_script(
        &self,
        statements: &[Statement],
    ) -> LedgerResult<Option<Vec<SqliteRow>>> {
        if statements.is_empty() {
            return Err(LedgerError::Integrity(
                "cannot execute an empty statement list".into(),
            ));
        }

        let mut guard = self.begin().await?;
        let mut result = None;

        for statement in statements {
            debug!(sql = statement.sql(), "Executing script statement");
            match statement.fetch_all(guard.executor()?).await {
                Ok(rows) => {
                    if !rows.is_empty() {
                        result = Some(rows);
                    }
                }
                Err(e) => {
                    if let Err(rollback_err) = guard.rollback().await {
                        warn!(error = %rollback_err, "Rollback after failed statement also failed");
                    }
                    return Err(e.into());
                }
            }
        }

        guard.commit().await?;
        Ok(result)
    }
}

/// RAII guard for store transactions ensuring automatic rollback on drop.
///
/// The guard wraps a `sqlx` transaction and provides:
/// - automatic rollback if the guard is dropped without calling `commit()`
/// - a commit that consumes the guard, preventing double-commit
/// - [`executor`](Self::executor) for running statements on the
///   transaction's connection
///
/// Dropping a pending ledger-operation future drops its guard, so a
/// cancelled operation can never leave a partial commit behind.
pub struct TransactionGuard<'c> {
    transaction: Option<Transaction<'c, Sqlite>>,
    committed: bool,
}

impl<'c> TransactionGuard<'c> {
    /// Wrap an already-begun transaction.
    #[must_use]
    pub fn new(transaction: Transaction<'c, Sqlite>) -> Self {
        debug!("Transaction opened, will auto-rollback if not committed");
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already consumed or the store
    /// commit fails.
    pub async fn commit(mut self) -> LedgerResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.commit().await?;
                self.committed = true;
                debug!("Transaction committed");
                Ok(())
            }
            None => Err(LedgerError::Integrity(
                "transaction already consumed, cannot commit".into(),
            )),
        }
    }

    /// Explicitly roll back the transaction and consume the guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already consumed or the store
    /// rollback fails.
    pub async fn rollback(mut self) -> LedgerResult<()> {
        match self.transaction.take() {
            Some(tx) => {
                tx.rollback().await?;
                debug!("Transaction rolled back explicitly");
                Ok(())
            }
            None => Err(LedgerError::Integrity(
                "transaction already consumed, cannot rollback".into(),
            )),
        }
    }

    /// Whether `commit` has completed.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// The transaction's connection, for executing statements.
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already consumed; that is a
    /// programming error, not a store failure.
    pub fn executor(&mut self) -> LedgerResult<&mut SqliteConnection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            LedgerError::Integrity("transaction already consumed, cannot execute".into())
        })
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            // sqlx rolls the inner transaction back on drop; log it so
            // unintended drops are visible.
            warn!("Transaction dropped without commit, rolling back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_accumulates_args_in_order() {
        let statement = Statement::new("INSERT INTO t (a, b, c) VALUES ($1, $2, $3)")
            .bind(7_i64)
            .bind("seven")
            .bind(Option::<String>::None);

        assert_eq!(
            statement.args(),
            &[Arg::Int(7), Arg::Text("seven".to_owned()), Arg::Null]
        );
    }

    #[test]
    fn optional_args_map_to_null() {
        assert_eq!(Arg::from(Option::<i64>::None), Arg::Null);
        assert_eq!(Arg::from(Some(3_i64)), Arg::Int(3));
        assert_eq!(Arg::from(Some("x")), Arg::Text("x".to_owned()));
    }

    #[test]
    fn timestamps_and_uuids_are_typed() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        assert_eq!(Arg::from(id), Arg::Uuid(id));
        assert_eq!(Arg::from(now), Arg::Timestamp(now));
    }
}
