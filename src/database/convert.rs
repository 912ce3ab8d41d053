// ABOUTME: Row-to-entity conversion from flat query rows to the public data model
// ABOUTME: Collapses joined price rows into items and dispatches transaction variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Row-to-entity conversion.
//!
//! Item queries return one row per price; the converters here collapse such
//! row sets into nested entities. Callers must keep each item's rows
//! contiguous (`ORDER BY` item id): [`items_from_rows`] groups by id and
//! preserves first-seen order, it does not re-sort.
//!
//! Transaction conversion dispatches on the stored `kind` discriminator; an
//! unknown discriminator is a data-integrity error, never a user error.
//!
//! The directory mergers ([`to_user_profile`], [`to_group_profile`]) combine
//! stored identity with display metadata the external directory supplies
//! per-request. Directory data is never persisted.

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::{LedgerError, LedgerResult};
use crate::models::{
    Deposit, DirectoryGroup, DirectoryUser, FullUser, Group, GroupProfile, Item, ItemStockUpdate,
    Price, Purchase, PurchasedItem, PurchasedItemRef, StockUpdate, User, UserProfile,
};

fn uuid_from_text(value: &str) -> LedgerResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| LedgerError::Integrity(format!("invalid uuid in storage: {e}")))
}

pub(crate) fn group_from_row(row: &SqliteRow) -> LedgerResult<Group> {
    let external_id: String = row.get("external_id");

    Ok(Group {
        id: row.get("id"),
        external_id: uuid_from_text(&external_id)?,
    })
}

pub(crate) fn user_from_row(row: &SqliteRow) -> LedgerResult<User> {
    let external_id: String = row.get("external_id");

    Ok(User {
        id: row.get("id"),
        group_id: row.get("group_id"),
        external_id: uuid_from_text(&external_id)?,
    })
}

pub(crate) fn full_user_from_row(row: &SqliteRow) -> LedgerResult<FullUser> {
    let external_id: String = row.get("external_id");
    let group_external_id: String = row.get("group_external_id");

    Ok(FullUser {
        id: row.get("id"),
        group_id: row.get("group_id"),
        external_id: uuid_from_text(&external_id)?,
        group_external_id: uuid_from_text(&group_external_id)?,
        balance: row.get("balance"),
    })
}

/// Convert all rows of one item (one row per price) into an [`Item`].
pub(crate) fn item_from_rows(rows: &[SqliteRow]) -> LedgerResult<Item> {
    let refs: Vec<&SqliteRow> = rows.iter().collect();
    item_from_row_group(&refs)
}

fn item_from_row_group(rows: &[&SqliteRow]) -> LedgerResult<Item> {
    let first = rows
        .first()
        .ok_or_else(|| LedgerError::Integrity("cannot convert an empty item row set".into()))?;

    let prices = rows
        .iter()
        .map(|row| Price {
            price: row.get("price"),
            display_name: row.get("price_name"),
        })
        .collect();

    Ok(Item {
        id: first.get("id"),
        group_id: first.get("group_id"),
        display_name: first.get("display_name"),
        icon_url: first.get("icon_url"),
        created_time: first.get("created_time"),
        flags: first.get("flags"),
        stock: first.get("stock"),
        times_purchased: first.get("times_purchased"),
        prices,
        favorite: first.get("favorite"),
    })
}

/// Convert a multi-item row set into items, one per distinct id.
///
/// Rows are grouped by item id; item order is the order ids first appear in
/// the row set.
pub(crate) fn items_from_rows(rows: &[SqliteRow]) -> LedgerResult<Vec<Item>> {
    let mut order: Vec<i64> = Vec::new();
    let mut grouped: HashMap<i64, Vec<&SqliteRow>> = HashMap::new();

    for row in rows {
        let id: i64 = row.get("id");
        grouped
            .entry(id)
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(row);
    }

    order
        .iter()
        .map(|id| item_from_row_group(&grouped[id]))
        .collect()
}

/// Convert a purchase's joined rows (one per purchased line) into a
/// [`Purchase`].
pub(crate) fn purchase_from_rows(rows: &[SqliteRow]) -> LedgerResult<Purchase> {
    let first = rows
        .first()
        .ok_or_else(|| LedgerError::Integrity("purchase has no purchased lines".into()))?;

    let items = rows
        .iter()
        .map(|row| PurchasedItem {
            item: PurchasedItemRef {
                id: row.get("item_id"),
                display_name: row.get("display_name"),
                icon_url: row.get("icon_url"),
            },
            quantity: row.get("quantity"),
            purchase_price: Price {
                price: row.get("purchase_price"),
                display_name: row.get("purchase_price_name"),
            },
        })
        .collect();

    Ok(Purchase {
        id: first.get("id"),
        created_by: first.get("created_by"),
        created_for: first.get("created_for"),
        created_time: first.get("created_time"),
        flags: first.get("flags"),
        comment: first.get("comment"),
        items,
    })
}

pub(crate) fn deposit_from_row(row: &SqliteRow) -> LedgerResult<Deposit> {
    Ok(Deposit {
        id: row.get("id"),
        created_by: row.get("created_by"),
        created_for: row.get("created_for"),
        created_time: row.get("created_time"),
        flags: row.get("flags"),
        comment: row.get("comment"),
        total: row.get("total"),
    })
}

/// Convert a stock update's joined rows (one per item line) into a
/// [`StockUpdate`].
pub(crate) fn stock_update_from_rows(rows: &[SqliteRow]) -> LedgerResult<StockUpdate> {
    let first = rows
        .first()
        .ok_or_else(|| LedgerError::Integrity("stock update has no item lines".into()))?;

    let items = rows
        .iter()
        .map(|row| ItemStockUpdate {
            item_id: row.get("item_id"),
            before: row.get("before_stock"),
            after: row.get("after_stock"),
        })
        .collect();

    Ok(StockUpdate {
        id: first.get("id"),
        created_by: first.get("created_by"),
        created_time: first.get("created_time"),
        flags: first.get("flags"),
        comment: first.get("comment"),
        items,
    })
}

/// Merge a stored user with its directory profile into the public shape.
#[must_use]
pub fn to_user_profile(user: &FullUser, directory: &DirectoryUser) -> UserProfile {
    UserProfile {
        id: user.id,
        group_id: user.group_id,
        external_id: user.external_id,
        first_name: directory.first_name.clone(),
        last_name: directory.last_name.clone(),
        nick: directory.nick.clone(),
        avatar_url: directory.avatar_url.clone(),
        balance: user.balance,
    }
}

/// Merge a stored group with its directory profile into the public shape.
#[must_use]
pub fn to_group_profile(group: &Group, directory: &DirectoryGroup) -> GroupProfile {
    GroupProfile {
        id: group.id,
        external_id: group.external_id,
        display_name: directory.display_name.clone(),
        avatar_url: directory.avatar_url.clone(),
    }
}
