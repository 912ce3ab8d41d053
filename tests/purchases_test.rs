// ABOUTME: Integration tests for recording purchases and their derived effects
// ABOUTME: Validates snapshots, balance charging, counters, and rollback on bad lines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::price;
use tab_ledger::database::Database;
use tab_ledger::errors::LedgerError;
use tab_ledger::models::{
    ItemPatch, ItemSortMode, ItemUpdate, Purchase, PurchaseRequestItem, StockUpdateRequestItem,
    Transaction, TransactionKind,
};

fn line(item_id: i64, quantity: i64, amount: f64, label: &str) -> PurchaseRequestItem {
    PurchaseRequestItem {
        item_id,
        quantity,
        purchase_price: price(amount, label),
    }
}

fn as_purchase(transaction: Transaction) -> Purchase {
    match transaction {
        Transaction::Purchase(purchase) => purchase,
        other => panic!("expected a purchase, got {other:?}"),
    }
}

async fn balance_of(db: &Database, user_id: i64) -> Result<f64> {
    let user = db
        .get_full_user(user_id)
        .await?
        .expect("full user should exist");
    Ok(user.balance)
}

/// End to end: a fresh item starts at zero, stocking sets the baseline,
/// and a purchase charges the buyer and bumps the purchase counter by the
/// bought quantity without moving the recorded stock.
#[tokio::test]
async fn test_purchase_charges_buyer_and_counts_quantity() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    let item = common::create_test_item(&db, group_id, "Soda", 10.0).await?;
    assert_eq!(item.stock, 0);
    assert_eq!(item.times_purchased, 0);

    db.create_deposit(group_id, user_id, None, None, 50.0)
        .await?;
    db.create_stock_update(
        group_id,
        user_id,
        None,
        &[StockUpdateRequestItem {
            item_id: item.id,
            quantity: 24,
            absolute: true,
        }],
    )
    .await?;

    let transaction = db
        .create_purchase(
            group_id,
            user_id,
            None,
            None,
            &[line(item.id, 3, 10.0, "student")],
        )
        .await?;
    assert_eq!(transaction.kind(), TransactionKind::Purchase);

    let purchase = as_purchase(transaction);
    assert_eq!(purchase.created_by, user_id);
    assert_eq!(purchase.created_for, user_id);
    assert_eq!(purchase.items.len(), 1);
    assert_eq!(purchase.items[0].quantity, 3);

    assert_eq!(balance_of(&db, user_id).await?, 20.0);

    let item = db.get_item(item.id, user_id).await?;
    assert_eq!(item.times_purchased, 3);
    assert_eq!(item.stock, 24, "a purchase must not move the stock baseline");
    Ok(())
}

/// Each line copies name, icon, and the requested price into the purchase.
#[tokio::test]
async fn test_purchase_readback_keeps_request_snapshots() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    let item = db
        .create_item(
            group_id,
            "Soda",
            Some("https://example.com/soda.png"),
            &[price(10.0, "student")],
        )
        .await?;

    let created = db
        .create_purchase(
            group_id,
            user_id,
            None,
            Some("after practice"),
            &[line(item.id, 2, 8.0, "discount")],
        )
        .await?;

    let fetched = db
        .get_transaction(created.id())
        .await?
        .expect("created purchase should be readable");
    assert_eq!(fetched, created);
    assert!(!fetched.is_removed());

    let purchase = as_purchase(fetched);
    assert_eq!(purchase.comment.as_deref(), Some("after practice"));

    let snapshot = &purchase.items[0];
    assert_eq!(snapshot.item.id, Some(item.id));
    assert_eq!(snapshot.item.display_name, "Soda");
    assert_eq!(
        snapshot.item.icon_url.as_deref(),
        Some("https://example.com/soda.png")
    );
    // The charged price is the request's, not the stored list's.
    assert_eq!(snapshot.purchase_price, price(8.0, "discount"));
    assert_eq!(balance_of(&db, user_id).await?, -16.0);
    Ok(())
}

#[tokio::test]
async fn test_purchase_lines_keep_submission_order() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    let water = common::create_test_item(&db, group_id, "Water", 1.0).await?;
    let beer = common::create_test_item(&db, group_id, "Beer", 1.5).await?;

    let purchase = as_purchase(
        db.create_purchase(
            group_id,
            user_id,
            None,
            None,
            &[
                line(beer.id, 1, 1.5, "default"),
                line(water.id, 2, 1.0, "default"),
            ],
        )
        .await?,
    );

    let names: Vec<_> = purchase
        .items
        .iter()
        .map(|l| l.item.display_name.as_str())
        .collect();
    assert_eq!(names, ["Beer", "Water"]);
    Ok(())
}

#[tokio::test]
async fn test_purchase_for_another_user_charges_their_tab() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let recorder = common::create_test_user(&db, group_id).await?;
    let drinker = common::create_test_user(&db, group_id).await?;
    let item = common::create_test_item(&db, group_id, "Beer", 1.5).await?;

    let purchase = as_purchase(
        db.create_purchase(
            group_id,
            recorder,
            Some(drinker),
            None,
            &[line(item.id, 2, 1.5, "default")],
        )
        .await?,
    );
    assert_eq!(purchase.created_by, recorder);
    assert_eq!(purchase.created_for, drinker);

    assert_eq!(balance_of(&db, recorder).await?, 0.0);
    assert_eq!(balance_of(&db, drinker).await?, -3.0);
    Ok(())
}

#[tokio::test]
async fn test_purchase_requires_at_least_one_line() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;

    let error = db
        .create_purchase(group_id, user_id, None, None, &[])
        .await
        .unwrap_err();
    assert!(matches!(error, LedgerError::Integrity(_)));
    Ok(())
}

/// One bad line voids the whole purchase: no transaction, no counters.
#[tokio::test]
async fn test_purchase_of_missing_item_records_nothing() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    let item = common::create_test_item(&db, group_id, "Soda", 10.0).await?;

    let error = db
        .create_purchase(
            group_id,
            user_id,
            None,
            None,
            &[line(item.id, 1, 10.0, "student"), line(4242, 1, 1.0, "x")],
        )
        .await
        .unwrap_err();
    assert!(error.is_not_found());

    assert_eq!(db.count_transactions_in_group(group_id).await?, 0);
    assert_eq!(db.get_item(item.id, user_id).await?.times_purchased, 0);
    assert_eq!(balance_of(&db, user_id).await?, 0.0);
    Ok(())
}

/// Items belong to their group; a purchase cannot reach across groups.
#[tokio::test]
async fn test_purchase_of_foreign_item_is_not_found() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let other_group = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    let foreign = common::create_test_item(&db, other_group, "Theirs", 5.0).await?;

    let error = db
        .create_purchase(
            group_id,
            user_id,
            None,
            None,
            &[line(foreign.id, 1, 5.0, "default")],
        )
        .await
        .unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(db.count_transactions_in_group(group_id).await?, 0);
    Ok(())
}

/// Comments have a length cap; anything over it is stored as absent rather
/// than rejected.
#[tokio::test]
async fn test_overlong_comment_is_stored_as_absent() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    let item = common::create_test_item(&db, group_id, "Soda", 10.0).await?;

    let at_limit = "y".repeat(1000);
    let purchase = as_purchase(
        db.create_purchase(
            group_id,
            user_id,
            None,
            Some(&at_limit),
            &[line(item.id, 1, 10.0, "student")],
        )
        .await?,
    );
    assert_eq!(purchase.comment.as_deref(), Some(at_limit.as_str()));

    let too_long = "y".repeat(1001);
    let purchase = as_purchase(
        db.create_purchase(
            group_id,
            user_id,
            None,
            Some(&too_long),
            &[line(item.id, 1, 10.0, "student")],
        )
        .await?,
    );
    assert_eq!(purchase.comment, None);
    Ok(())
}

/// Renaming or deleting an item never rewrites history: old purchases keep
/// their snapshot, only the item reference nulls out on deletion.
#[tokio::test]
async fn test_snapshots_survive_item_edits_and_deletion() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    let item = common::create_test_item(&db, group_id, "Soda", 10.0).await?;

    let created = db
        .create_purchase(
            group_id,
            user_id,
            None,
            None,
            &[line(item.id, 3, 10.0, "student")],
        )
        .await?;

    db.update_item(
        item.id,
        user_id,
        &ItemUpdate {
            patches: vec![ItemPatch::DisplayName("Cola".into())],
            ..ItemUpdate::default()
        },
    )
    .await?;

    let purchase = as_purchase(
        db.get_transaction(created.id())
            .await?
            .expect("purchase should survive the rename"),
    );
    assert_eq!(purchase.items[0].item.display_name, "Soda");

    db.delete_item(item.id).await?;

    let purchase = as_purchase(
        db.get_transaction(created.id())
            .await?
            .expect("purchase should survive the deletion"),
    );
    assert_eq!(purchase.items[0].item.id, None);
    assert_eq!(purchase.items[0].item.display_name, "Soda");
    assert_eq!(purchase.items[0].purchase_price, price(10.0, "student"));
    assert_eq!(balance_of(&db, user_id).await?, -30.0);
    Ok(())
}

#[tokio::test]
async fn test_popularity_sort_follows_purchase_counts() -> Result<()> {
    let db = common::create_test_db().await?;
    let group_id = common::create_test_group(&db).await?;
    let user_id = common::create_test_user(&db, group_id).await?;
    common::create_test_item(&db, group_id, "Quiet", 1.0).await?;
    let hit = common::create_test_item(&db, group_id, "Hit", 1.0).await?;
    let modest = common::create_test_item(&db, group_id, "Modest", 1.0).await?;

    db.create_purchase(
        group_id,
        user_id,
        None,
        None,
        &[line(hit.id, 5, 1.0, "default")],
    )
    .await?;
    db.create_purchase(
        group_id,
        user_id,
        None,
        None,
        &[line(modest.id, 2, 1.0, "default")],
    )
    .await?;

    let listed = db
        .get_items_in_group(group_id, user_id, false, ItemSortMode::Popular)
        .await?;
    let names: Vec<_> = listed.iter().map(|i| i.display_name.as_str()).collect();
    assert_eq!(names, ["Hit", "Modest", "Quiet"]);
    Ok(())
}
