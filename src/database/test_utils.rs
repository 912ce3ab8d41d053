// ABOUTME: Shared test helpers for the data layer
// ABOUTME: Provides fresh in-memory databases with the full schema applied
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use super::Database;
use crate::errors::LedgerResult;

/// Create a fresh in-memory database with the schema applied and validated.
///
/// Every call returns an isolated store, so tests never observe each
/// other's rows.
///
/// # Errors
///
/// Returns an error if the connection or schema setup fails.
pub async fn create_test_db() -> LedgerResult<Database> {
    let db = Database::connect("sqlite::memory:").await?;
    db.ensure_schema().await?;
    db.validate_schema().await?;
    Ok(db)
}
