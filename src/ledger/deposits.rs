// ABOUTME: Deposit recording over the statement executor
// ABOUTME: Runs header insert, deposit row, and read-back as one script
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use chrono::Utc;
use tracing::debug;

use crate::database::{convert, Database, Statement};
use crate::errors::{LedgerError, LedgerResult};
use crate::models::{normalize_comment, Transaction, TransactionKind};

impl Database {
    /// Record a deposit of `total` onto a user's tab and return the stored
    /// transaction.
    ///
    /// Runs as one atomic script: the transaction header, the deposit row
    /// keyed by `last_insert_rowid()`, and the read-back. `created_for`
    /// names the user being credited when someone else records the
    /// deposit; absent, the creator deposits onto their own tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, or [`LedgerError::Integrity`]
    /// if the deposit cannot be read back.
    pub async fn create_deposit(
        &self,
        group_id: i64,
        created_by: i64,
        created_for: Option<i64>,
        comment: Option<&str>,
        total: f64,
    ) -> LedgerResult<Transaction> {
        let comment = normalize_comment(comment);

        let statements = [
            Statement::new(
                "INSERT INTO transactions \
                 (group_id, kind, created_by, created_for, comment, created_time) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(group_id)
            .bind(TransactionKind::Deposit.as_str())
            .bind(created_by)
            .bind(created_for.unwrap_or(created_by))
            .bind(comment)
            .bind(Utc::now()),
            // The deposit row's primary key is the rowid, so after this
            // insert last_insert_rowid() still names the transaction.
            Statement::new(
                "INSERT INTO deposits (transaction_id, total) VALUES (last_insert_rowid(), $1)",
            )
            .bind(total),
            Statement::new(
                "SELECT t.id, t.created_by, t.created_for, t.created_time, t.flags, \
                        t.comment, d.total \
                 FROM transactions t JOIN deposits d ON d.transaction_id = t.id \
                 WHERE t.id = last_insert_rowid()",
            ),
        ];

        let rows = self.execute_script(&statements).await?.unwrap_or_default();
        let row = rows.first().ok_or_else(|| {
            LedgerError::Integrity("deposit missing after creation".into())
        })?;

        let deposit = convert::deposit_from_row(row)?;
        debug!(transaction_id = deposit.id, group_id, "Recorded deposit");
        Ok(Transaction::Deposit(deposit))
    }
}
