// ABOUTME: Integration tests for group and user provisioning
// ABOUTME: Validates direct creation, lookups, and idempotent soft-creation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_look_up_group() -> Result<()> {
    let db = common::create_test_db().await?;

    let external_id = Uuid::new_v4();
    let group = db.create_group(external_id).await?;
    assert_eq!(group.external_id, external_id);

    let fetched = db.get_group(group.id).await?.expect("group should exist");
    assert_eq!(fetched, group);

    assert!(db.group_exists(group.id).await?);
    assert!(!db.group_exists(group.id + 1).await?);
    assert!(db.external_group_exists(external_id).await?);
    assert!(!db.external_group_exists(Uuid::new_v4()).await?);
    Ok(())
}

#[tokio::test]
async fn test_create_user_starts_with_zero_balance() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;

    let external_id = Uuid::new_v4();
    let user = db.create_user(external_id, group_id).await?;
    assert_eq!(user.group_id, group_id);
    assert_eq!(user.external_id, external_id);

    let full = db
        .get_full_user(user.id)
        .await?
        .expect("full user should exist");
    assert_eq!(full.id, user.id);
    assert_eq!(full.balance, 0.0);
    Ok(())
}

#[tokio::test]
async fn test_user_membership_is_per_group() -> Result<()> {
    let db = common::create_test_db().await?;
    let home = common::create_test_group(&db).await?;
    let other = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, home).await?;

    assert!(db.user_exists_in_group(user_id, home).await?);
    assert!(!db.user_exists_in_group(user_id, other).await?);
    Ok(())
}

#[tokio::test]
async fn test_users_in_group_are_listed_in_creation_order() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;

    let first = common::create_test_user(&db, group_id).await?;
    let second = common::create_test_user(&db, group_id).await?;

    let users = db.get_users_in_group(group_id).await?;
    assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![first, second]);

    let full = db.get_full_users_in_group(group_id).await?;
    assert_eq!(full.len(), 2);
    for user in &full {
        assert_eq!(user.balance, 0.0);
    }
    Ok(())
}

/// Soft-creation provisions group and user in one atomic step and is safe
/// to repeat: the same federated pair always maps to the same local rows.
#[tokio::test]
async fn test_soft_create_is_idempotent() -> Result<()> {
    let db = common::create_test_db().await?;

    let group_ext = Uuid::new_v4();
    let user_ext = Uuid::new_v4();

    let first = db.soft_create_group_and_user(group_ext, user_ext).await?;
    assert_eq!(first.external_id, user_ext);
    assert_eq!(first.group_external_id, group_ext);
    assert_eq!(first.balance, 0.0);

    let second = db.soft_create_group_and_user(group_ext, user_ext).await?;
    assert_eq!(second.id, first.id);
    assert_eq!(second.group_id, first.group_id);

    assert_eq!(db.get_users_in_group(first.group_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_soft_create_adds_users_to_an_existing_group() -> Result<()> {
    let db = common::create_test_db().await?;

    let group_ext = Uuid::new_v4();
    let first = db
        .soft_create_group_and_user(group_ext, Uuid::new_v4())
        .await?;
    let second = db
        .soft_create_group_and_user(group_ext, Uuid::new_v4())
        .await?;

    assert_eq!(second.group_id, first.group_id);
    assert_ne!(second.id, first.id);
    assert_eq!(db.get_users_in_group(first.group_id).await?.len(), 2);
    Ok(())
}

/// A federated user id already mapped to a local user keeps its original
/// group; soft-creation never moves users between groups.
#[tokio::test]
async fn test_soft_create_does_not_move_existing_users() -> Result<()> {
    let db = common::create_test_db().await?;

    let original_group = Uuid::new_v4();
    let user_ext = Uuid::new_v4();
    let original = db
        .soft_create_group_and_user(original_group, user_ext)
        .await?;

    let resolved = db
        .soft_create_group_and_user(Uuid::new_v4(), user_ext)
        .await?;
    assert_eq!(resolved.id, original.id);
    assert_eq!(resolved.group_external_id, original_group);
    Ok(())
}
