// ABOUTME: Item use cases over the repository layer
// ABOUTME: Creation, patch-based updates, deletion, and sorted listings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, error};

use super::rollback_quietly;
use crate::database::{convert, favorites, items, prices, Database};
use crate::errors::{LedgerError, LedgerResult};
use crate::flags::ItemFlags;
use crate::models::{sort_items, Item, ItemPatch, ItemSortMode, ItemUpdate, Price};

// Row ids start at 1, so reads without a caller never match favorite rows.
const NO_USER: i64 = 0;

impl Database {
    /// Create an item with its initial prices and return it fully assembled.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Integrity`] if the price list is empty, or an
    /// error if the group does not exist, the name is already taken in the
    /// group, or the store fails.
    pub async fn create_item(
        &self,
        group_id: i64,
        display_name: &str,
        icon_url: Option<&str>,
        prices: &[Price],
    ) -> LedgerResult<Item> {
        if prices.is_empty() {
            return Err(LedgerError::Integrity(
                "an item needs at least one price".into(),
            ));
        }

        let mut guard = self.begin().await?;
        let rows =
            match insert_item_tree(guard.executor()?, group_id, display_name, icon_url, prices)
                .await
            {
                Ok(rows) => rows,
                Err(error) => {
                    rollback_quietly(guard).await;
                    return Err(error);
                }
            };
        guard.commit().await?;

        let item = convert::item_from_rows(&rows)?;
        debug!(item_id = item.id, group_id, "Created item");
        Ok(item)
    }

    /// Apply an update to an item and return its new state as seen by
    /// `user_id`.
    ///
    /// Patches are applied in request order, then the visibility flag, then
    /// the full price replacement. The whole update commits or none of it
    /// does.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if the item does not exist,
    /// [`LedgerError::Integrity`] if a replacement price list is empty, and
    /// [`LedgerError::OperationFailed`] for any other failure, with the
    /// cause logged.
    pub async fn update_item(
        &self,
        item_id: i64,
        user_id: i64,
        update: &ItemUpdate,
    ) -> LedgerResult<Item> {
        if update.prices.as_ref().is_some_and(Vec::is_empty) {
            return Err(LedgerError::Integrity(
                "an item needs at least one price".into(),
            ));
        }

        let mut guard = self.begin().await?;
        let rows = match apply_item_update(guard.executor()?, item_id, user_id, update).await {
            Ok(rows) => rows,
            Err(error) if error.is_not_found() => {
                rollback_quietly(guard).await;
                return Err(error);
            }
            Err(error) => {
                error!(item_id, %error, "Item update failed");
                rollback_quietly(guard).await;
                return Err(LedgerError::OperationFailed {
                    operation: "update item",
                });
            }
        };
        guard.commit().await?;

        convert::item_from_rows(&rows)
    }

    /// Delete an item. Prices and favorite markers go with it, while
    /// purchased lines keep their copied name and price.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if the item does not exist.
    pub async fn delete_item(&self, item_id: i64) -> LedgerResult<()> {
        let mut conn = self.pool().acquire().await?;
        let removed = items::delete_item(&mut conn, item_id).await?;
        if removed == 0 {
            return Err(LedgerError::not_found("item", item_id));
        }
        debug!(item_id, "Deleted item");
        Ok(())
    }

    /// Get one item with prices, derived counters, and the caller's
    /// favorite marker.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if the item does not exist.
    pub async fn get_item(&self, item_id: i64, user_id: i64) -> LedgerResult<Item> {
        let mut conn = self.pool().acquire().await?;
        let rows = items::get_full_item_with_prices(&mut conn, item_id, user_id).await?;
        if rows.is_empty() {
            return Err(LedgerError::not_found("item", item_id));
        }
        convert::item_from_rows(&rows)
    }

    /// List the items of a group as seen by `user_id`, sorted by `sort`.
    ///
    /// With `visible_only`, items flagged invisible are dropped before
    /// assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails or the rows are
    /// inconsistent.
    pub async fn get_items_in_group(
        &self,
        group_id: i64,
        user_id: i64,
        visible_only: bool,
        sort: ItemSortMode,
    ) -> LedgerResult<Vec<Item>> {
        let mut conn = self.pool().acquire().await?;
        let rows = items::get_full_items_with_prices_in_group(&mut conn, group_id, user_id).await?;
        let rows: Vec<SqliteRow> = if visible_only {
            rows.into_iter()
                .filter(|row| {
                    let flags: i64 = row.get("flags");
                    !ItemFlags::is_invisible(flags)
                })
                .collect()
        } else {
            rows
        };

        let mut items = convert::items_from_rows(&rows)?;
        sort_items(&mut items, sort);
        Ok(items)
    }
}

async fn insert_item_tree(
    conn: &mut SqliteConnection,
    group_id: i64,
    display_name: &str,
    icon_url: Option<&str>,
    price_list: &[Price],
) -> LedgerResult<Vec<SqliteRow>> {
    let item_id = items::create_bare_item(conn, group_id, display_name, icon_url).await?;
    for price in price_list {
        prices::add_price(conn, item_id, price).await?;
    }

    let rows = items::get_full_item_with_prices(conn, item_id, NO_USER).await?;
    if rows.is_empty() {
        return Err(LedgerError::Integrity(format!(
            "item {item_id} missing after creation"
        )));
    }
    Ok(rows)
}

async fn apply_item_update(
    conn: &mut SqliteConnection,
    item_id: i64,
    user_id: i64,
    update: &ItemUpdate,
) -> LedgerResult<Vec<SqliteRow>> {
    // Existence first, so patching a missing item reports not-found instead
    // of updating zero rows.
    if items::get_item(conn, item_id).await?.is_none() {
        return Err(LedgerError::not_found("item", item_id));
    }

    for patch in &update.patches {
        match patch {
            ItemPatch::DisplayName(display_name) => {
                items::set_item_display_name(conn, item_id, display_name).await?;
            }
            ItemPatch::IconUrl(icon_url) => {
                items::set_item_icon_url(conn, item_id, icon_url.as_deref()).await?;
            }
            ItemPatch::Favorite(true) => favorites::add_favorite(conn, user_id, item_id).await?,
            ItemPatch::Favorite(false) => {
                favorites::remove_favorite(conn, user_id, item_id).await?;
            }
        }
    }

    match update.invisible {
        Some(true) => items::set_item_flag(conn, item_id, ItemFlags::INVISIBLE.bits()).await?,
        Some(false) => items::clear_item_flag(conn, item_id, ItemFlags::INVISIBLE.bits()).await?,
        None => {}
    }

    if let Some(price_list) = &update.prices {
        prices::remove_prices_for_item(conn, item_id).await?;
        for price in price_list {
            prices::add_price(conn, item_id, price).await?;
        }
    }

    let rows = items::get_full_item_with_prices(conn, item_id, user_id).await?;
    if rows.is_empty() {
        return Err(LedgerError::not_found("item", item_id));
    }
    Ok(rows)
}
