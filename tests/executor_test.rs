// ABOUTME: Integration tests for the statement executor and transaction guard
// ABOUTME: Validates script atomicity, result selection, and rollback behavior
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use sqlx::Row;
use tab_ledger::database::{Database, Statement};
use tab_ledger::errors::LedgerError;
use uuid::Uuid;

async fn count_groups(db: &Database) -> Result<i64> {
    let rows = db
        .execute_statement(&Statement::new("SELECT COUNT(*) AS n FROM groups"))
        .await?;
    Ok(rows[0].get("n"))
}

fn insert_group() -> Statement {
    Statement::new("INSERT INTO groups (external_id) VALUES ($1)").bind(Uuid::new_v4())
}

/// A failing statement anywhere in a script must leave no trace of the
/// statements before it.
#[tokio::test]
async fn test_script_rolls_back_on_failure() -> Result<()> {
    let db = common::create_test_db().await?;

    let statements = [
        insert_group(),
        Statement::new("INSERT INTO no_such_table (x) VALUES (1)"),
    ];
    let result = db.execute_script(&statements).await;
    assert!(result.is_err(), "script with a bad statement should fail");

    assert_eq!(count_groups(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_script_is_rejected() -> Result<()> {
    let db = common::create_test_db().await?;

    let error = db.execute_script(&[]).await.err().unwrap();
    assert!(matches!(error, LedgerError::Integrity(_)));
    Ok(())
}

/// The script result is the rows of the last statement that produced any,
/// not of the last statement overall.
#[tokio::test]
async fn test_script_returns_last_row_producing_statement() -> Result<()> {
    let db = common::create_test_db().await?;

    let statements = [Statement::new("SELECT 7 AS tag"), insert_group()];
    let rows = db
        .execute_script(&statements)
        .await?
        .expect("the select should produce rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<i64, _>("tag"), 7);

    // The insert itself still happened.
    assert_eq!(count_groups(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_script_without_rows_returns_none() -> Result<()> {
    let db = common::create_test_db().await?;

    let result = db.execute_script(&[insert_group()]).await?;
    assert!(result.is_none());
    assert_eq!(count_groups(&db).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_guard_commit_persists_writes() -> Result<()> {
    let db = common::create_test_db().await?;

    let mut guard = db.begin().await?;
    insert_group().fetch_all(guard.executor()?).await?;
    guard.commit().await?;

    assert_eq!(count_groups(&db).await?, 1);
    Ok(())
}

/// Dropping a guard without committing rolls the transaction back, so a
/// cancelled operation can never leave partial writes behind.
#[tokio::test]
async fn test_guard_drop_rolls_back() -> Result<()> {
    let db = common::create_test_db().await?;

    let mut guard = db.begin().await?;
    insert_group().fetch_all(guard.executor()?).await?;
    drop(guard);

    assert_eq!(count_groups(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_explicit_rollback_discards_writes() -> Result<()> {
    let db = common::create_test_db().await?;

    let mut guard = db.begin().await?;
    insert_group().fetch_all(guard.executor()?).await?;
    guard.rollback().await?;

    assert_eq!(count_groups(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_ensure_schema_is_idempotent() -> Result<()> {
    let db = common::create_test_db().await?;

    // A second provisioning pass must not disturb existing rows.
    db.execute_statement(&insert_group()).await?;
    db.ensure_schema().await?;
    db.validate_schema().await?;

    assert_eq!(count_groups(&db).await?, 1);
    Ok(())
}

/// A file-backed store keeps its schema and rows across reconnects, and
/// construction validates the schema it finds.
#[tokio::test]
async fn test_file_backed_database_persists_across_reconnect() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("ledger.db").display());

    let db = Database::connect(&url).await?;
    db.ensure_schema().await?;
    let group = db.create_group(Uuid::new_v4()).await?;
    drop(db);

    let db = Database::new(&url).await?;
    assert!(db.group_exists(group.id).await?);
    Ok(())
}

#[tokio::test]
async fn test_unprovisioned_database_fails_validation() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite:{}", dir.path().join("empty.db").display());

    let error = Database::new(&url).await.unwrap_err();
    match error {
        LedgerError::SchemaValidation { missing } => {
            assert!(missing.iter().any(|name| name == "groups"));
            assert!(missing.iter().any(|name| name == "full_users"));
        }
        other => panic!("expected a schema validation failure, got {other}"),
    }
    Ok(())
}
