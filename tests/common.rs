// ABOUTME: Shared setup helpers for the integration test suite
// ABOUTME: Provides database provisioning and group/user/item seeding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

use anyhow::Result;
use tab_ledger::database::{test_utils, Database};
use tab_ledger::models::{Item, Price};
use uuid::Uuid;

/// Fresh in-memory database with the reference schema provisioned.
pub async fn create_test_db() -> Result<Database> {
    Ok(test_utils::create_test_db().await?)
}

/// Create a group under a fresh federated id and return its local id.
pub async fn create_test_group(db: &Database) -> Result<i64> {
    let group = db.create_group(Uuid::new_v4()).await?;
    Ok(group.id)
}

/// Create a user in `group_id` and return their local id.
pub async fn create_test_user(db: &Database, group_id: i64) -> Result<i64> {
    let user = db.create_user(Uuid::new_v4(), group_id).await?;
    Ok(user.id)
}

/// Price list entry used by item fixtures.
pub fn price(amount: f64, label: &str) -> Price {
    Price {
        price: amount,
        display_name: label.to_owned(),
    }
}

/// Create a single-price item without an icon and return it.
pub async fn create_test_item(
    db: &Database,
    group_id: i64,
    name: &str,
    amount: f64,
) -> Result<Item> {
    Ok(db
        .create_item(group_id, name, None, &[price(amount, "default")])
        .await?)
}
