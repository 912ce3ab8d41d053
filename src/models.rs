// ABOUTME: Domain entities for the shared-tab ledger: groups, users, items, transactions
// ABOUTME: Also carries request payload shapes, item sort modes, and comment normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! # Data Models
//!
//! Core data structures shared by the repositories and ledger operations.
//! Everything here is a plain value: the store hands out these shapes, the
//! external boundary serializes them. Identifiers come in two kinds: local
//! `i64` row ids, and federated [`Uuid`] ids owned by the external directory.
//!
//! ## Core Models
//!
//! - [`Item`]: a purchasable item with its price list and derived counters
//! - [`Transaction`]: tagged union of [`Purchase`], [`Deposit`], [`StockUpdate`]
//! - [`FullUser`]: user row joined with its derived balance
//! - [`ItemPatch`] / [`ItemUpdate`]: the sparse item update payload
//! - [`ItemSortMode`]: listing sort orders, applied by [`sort_items`]

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::limits;
use crate::errors::LedgerError;
use crate::flags::{ItemFlags, TransactionFlags};

/// A community sharing one tab, owning its own users, items, and
/// transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Local row id
    pub id: i64,
    /// Federated group id owned by the external directory
    pub external_id: Uuid,
}

/// A member of exactly one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local row id
    pub id: i64,
    /// Owning group row id
    pub group_id: i64,
    /// Federated user id owned by the external directory
    pub external_id: Uuid,
}

/// User row joined with its group's federated id and the derived balance.
///
/// Balance is never stored: it is the sum of non-removed deposits credited to
/// the user minus the sum of non-removed purchases charged to the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FullUser {
    /// Local row id
    pub id: i64,
    /// Owning group row id
    pub group_id: i64,
    /// Federated user id
    pub external_id: Uuid,
    /// Federated id of the owning group
    pub group_external_id: Uuid,
    /// Derived balance over non-removed transactions
    pub balance: f64,
}

/// Display metadata for a user, supplied per-request by the external
/// directory. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Federated user id
    pub external_id: Uuid,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Short handle shown in listings
    pub nick: String,
    /// Avatar image location, if the directory has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Display metadata for a group, supplied per-request by the external
/// directory. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryGroup {
    /// Federated group id
    pub external_id: Uuid,
    /// Human-readable group name
    pub display_name: String,
    /// Avatar image location, if the directory has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Public user shape: stored identity merged with directory metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Local row id
    pub id: i64,
    /// Owning group row id
    pub group_id: i64,
    /// Federated user id
    pub external_id: Uuid,
    /// Given name from the directory
    pub first_name: String,
    /// Family name from the directory
    pub last_name: String,
    /// Short handle from the directory
    pub nick: String,
    /// Avatar image location from the directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Derived balance over non-removed transactions
    pub balance: f64,
}

/// Public group shape: stored identity merged with directory metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Local row id
    pub id: i64,
    /// Federated group id
    pub external_id: Uuid,
    /// Human-readable group name from the directory
    pub display_name: String,
    /// Avatar image location from the directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// One entry of an item's price list.
///
/// An item has at least one price whenever it is observable outside an update
/// transaction. Order is the insertion order supplied at create/update time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Non-negative amount
    pub price: f64,
    /// Label distinguishing the entry (e.g. "internal", "external")
    pub display_name: String,
}

/// A purchasable item with its price list and derived counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Local row id
    pub id: i64,
    /// Owning group row id
    pub group_id: i64,
    /// Name, unique per group (case-sensitive)
    pub display_name: String,
    /// Icon image location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Creation timestamp
    pub created_time: DateTime<Utc>,
    /// Raw flag word, decoded via [`ItemFlags`]
    pub flags: i64,
    /// Latest recorded stock level; may be negative
    pub stock: i64,
    /// Total quantity purchased over non-removed purchases
    pub times_purchased: i64,
    /// Price list, in insertion order
    pub prices: Vec<Price>,
    /// Whether the requesting user has favorited this item
    pub favorite: bool,
}

impl Item {
    /// True when the item is hidden from visible-only listings.
    #[must_use]
    pub fn is_invisible(&self) -> bool {
        ItemFlags::is_invisible(self.flags)
    }
}

/// One mutable item column plus its new value.
///
/// This is the complete allow-list for sparse item updates: anything not
/// representable here cannot be patched. `Favorite` is not a column at all,
/// it routes to the favorites relation for the acting user.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPatch {
    /// Rename the item (stays unique per group)
    DisplayName(String),
    /// Replace or clear the icon location
    IconUrl(Option<String>),
    /// Add or remove the acting user's favorite marker
    Favorite(bool),
}

/// Sparse update payload for an item.
///
/// `prices`, when present, replaces the complete price list. It is a
/// destructive full replace, never a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    /// Column patches to apply, in order
    pub patches: Vec<ItemPatch>,
    /// Set or clear the invisible flag
    pub invisible: Option<bool>,
    /// Full replacement price list
    pub prices: Option<Vec<Price>>,
}

/// Stored discriminator distinguishing the transaction variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Items bought from shared stock, charged to a user
    Purchase,
    /// Funds credited to a user
    Deposit,
    /// Absolute stock snapshots for one or more items
    StockUpdate,
}

impl TransactionKind {
    /// Stored discriminator string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Deposit => "deposit",
            Self::StockUpdate => "stock_update",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "deposit" => Ok(Self::Deposit),
            "stock_update" => Ok(Self::StockUpdate),
            other => Err(LedgerError::Integrity(format!(
                "unknown transaction kind: {other}"
            ))),
        }
    }
}

/// A financial or inventory event, immutable except for the removed flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transaction {
    /// Items bought from shared stock
    Purchase(Purchase),
    /// Funds credited to a user
    Deposit(Deposit),
    /// Stock level snapshots
    StockUpdate(StockUpdate),
}

impl Transaction {
    /// Local row id of the underlying transaction.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Purchase(t) => t.id,
            Self::Deposit(t) => t.id,
            Self::StockUpdate(t) => t.id,
        }
    }

    /// Variant discriminator.
    #[must_use]
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Purchase(_) => TransactionKind::Purchase,
            Self::Deposit(_) => TransactionKind::Deposit,
            Self::StockUpdate(_) => TransactionKind::StockUpdate,
        }
    }

    /// True when the transaction is excluded from balance and stock.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        let flags = match self {
            Self::Purchase(t) => t.flags,
            Self::Deposit(t) => t.flags,
            Self::StockUpdate(t) => t.flags,
        };
        TransactionFlags::is_removed(flags)
    }
}

/// A purchase of one or more items, charged to `created_for`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Local row id
    pub id: i64,
    /// User who recorded the purchase
    pub created_by: i64,
    /// User charged for the purchase
    pub created_for: i64,
    /// Creation timestamp
    pub created_time: DateTime<Utc>,
    /// Raw flag word, decoded via [`TransactionFlags`]
    pub flags: i64,
    /// Optional free-text comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Purchased lines, in submission order
    pub items: Vec<PurchasedItem>,
}

/// Funds credited to `created_for`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    /// Local row id
    pub id: i64,
    /// User who recorded the deposit
    pub created_by: i64,
    /// User credited
    pub created_for: i64,
    /// Creation timestamp
    pub created_time: DateTime<Utc>,
    /// Raw flag word, decoded via [`TransactionFlags`]
    pub flags: i64,
    /// Optional free-text comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Credited amount; sign is unconstrained
    pub total: f64,
}

/// New absolute stock levels for one or more items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUpdate {
    /// Local row id
    pub id: i64,
    /// User who recorded the update
    pub created_by: i64,
    /// Creation timestamp
    pub created_time: DateTime<Utc>,
    /// Raw flag word, decoded via [`TransactionFlags`]
    pub flags: i64,
    /// Optional free-text comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Per-item snapshots, in submission order
    pub items: Vec<ItemStockUpdate>,
}

/// Point-in-time copy of one purchased line.
///
/// The display name, icon, and price are snapshots taken at purchase time.
/// They stay stable even if the item is later renamed, repriced, or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasedItem {
    /// Reference to the item as it looked at purchase time
    pub item: PurchasedItemRef,
    /// Quantity bought
    pub quantity: i64,
    /// Price charged per unit, copied from the request
    pub purchase_price: Price,
}

/// Item identity snapshot on a purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedItemRef {
    /// Item row id, or `None` once the item has been deleted
    pub id: Option<i64>,
    /// Display name at purchase time
    pub display_name: String,
    /// Icon location at purchase time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// One line of a stock update: the stock level before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStockUpdate {
    /// Item row id
    pub item_id: i64,
    /// Stock level recorded before this update
    pub before: i64,
    /// Absolute stock level recorded by this update
    pub after: i64,
}

/// One requested purchase line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequestItem {
    /// Item to purchase
    pub item_id: i64,
    /// Quantity bought
    pub quantity: i64,
    /// Price charged per unit; callers may diverge from the item's price list
    pub purchase_price: Price,
}

/// One requested stock update line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdateRequestItem {
    /// Item whose stock changes
    pub item_id: i64,
    /// New level when `absolute`, signed delta otherwise
    pub quantity: i64,
    /// Whether `quantity` replaces the level outright
    pub absolute: bool,
}

/// Sort orders for item listings.
///
/// Every mode sorts by popularity first, then stable-sorts by the mode, so
/// ties within one mode stay ordered by popularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortMode {
    /// Most purchased first
    #[default]
    Popular,
    /// Lowest first-price first
    Cheap,
    /// Highest first-price first
    Expensive,
    /// Most recently created first
    New,
    /// Oldest first
    Old,
    /// Display name ascending
    NameA2z,
    /// Display name descending
    NameZ2a,
    /// Highest stock first
    HighStock,
    /// Lowest stock first
    LowStock,
}

impl FromStr for ItemSortMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular" => Ok(Self::Popular),
            "cheap" => Ok(Self::Cheap),
            "expensive" => Ok(Self::Expensive),
            "new" => Ok(Self::New),
            "old" => Ok(Self::Old),
            "name_a2z" => Ok(Self::NameA2z),
            "name_z2a" => Ok(Self::NameZ2a),
            "high_stock" => Ok(Self::HighStock),
            "low_stock" => Ok(Self::LowStock),
            other => Err(LedgerError::Integrity(format!(
                "unknown item sort mode: {other}"
            ))),
        }
    }
}

/// Sorts items in place for listing.
///
/// The base order is always popularity (times purchased, descending). The
/// requested mode is then applied as a stable sort on top, so equal keys keep
/// their popularity order.
pub fn sort_items(items: &mut [Item], mode: ItemSortMode) {
    items.sort_by(|a, b| b.times_purchased.cmp(&a.times_purchased));

    match mode {
        ItemSortMode::Popular => {}
        ItemSortMode::Cheap => items.sort_by(|a, b| first_price(a).total_cmp(&first_price(b))),
        ItemSortMode::Expensive => items.sort_by(|a, b| first_price(b).total_cmp(&first_price(a))),
        ItemSortMode::New => items.sort_by(|a, b| b.created_time.cmp(&a.created_time)),
        ItemSortMode::Old => items.sort_by(|a, b| a.created_time.cmp(&b.created_time)),
        ItemSortMode::NameA2z => items.sort_by(|a, b| a.display_name.cmp(&b.display_name)),
        ItemSortMode::NameZ2a => items.sort_by(|a, b| b.display_name.cmp(&a.display_name)),
        ItemSortMode::HighStock => items.sort_by(|a, b| b.stock.cmp(&a.stock)),
        ItemSortMode::LowStock => items.sort_by(|a, b| a.stock.cmp(&b.stock)),
    }
}

fn first_price(item: &Item) -> f64 {
    // Items carry at least one price; a missing list sorts last.
    item.prices.first().map_or(f64::MAX, |p| p.price)
}

/// Normalizes a transaction comment.
///
/// A comment is kept only when its character count is within
/// [`limits::MAX_COMMENT_LENGTH`]; anything else becomes `None`. Invalid
/// comments are silently dropped, never rejected.
#[must_use]
pub fn normalize_comment(comment: Option<&str>) -> Option<String> {
    comment
        .filter(|c| c.chars().count() <= limits::MAX_COMMENT_LENGTH)
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn item(id: i64, name: &str, price: f64, purchased: i64, stock: i64, minute: u32) -> Item {
        Item {
            id,
            group_id: 1,
            display_name: name.to_owned(),
            icon_url: None,
            created_time: Utc
                .with_ymd_and_hms(2025, 3, 1, 12, minute, 0)
                .single()
                .unwrap(),
            flags: 0,
            stock,
            times_purchased: purchased,
            prices: vec![Price {
                price,
                display_name: "internal".to_owned(),
            }],
            favorite: false,
        }
    }

    fn ids(items: &[Item]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn popular_orders_by_times_purchased() {
        let mut items = vec![
            item(1, "a", 5.0, 2, 0, 0),
            item(2, "b", 5.0, 9, 0, 1),
            item(3, "c", 5.0, 4, 0, 2),
        ];
        sort_items(&mut items, ItemSortMode::Popular);
        assert_eq!(ids(&items), vec![2, 3, 1]);
    }

    #[test]
    fn price_ties_keep_popularity_order() {
        let mut items = vec![
            item(1, "a", 10.0, 1, 0, 0),
            item(2, "b", 5.0, 8, 0, 1),
            item(3, "c", 5.0, 3, 0, 2),
        ];
        sort_items(&mut items, ItemSortMode::Cheap);
        // 2 and 3 cost the same, so the more purchased one stays first.
        assert_eq!(ids(&items), vec![2, 3, 1]);

        sort_items(&mut items, ItemSortMode::Expensive);
        assert_eq!(ids(&items), vec![1, 2, 3]);
    }

    #[test]
    fn new_puts_latest_creation_first() {
        let mut items = vec![
            item(1, "a", 5.0, 0, 0, 5),
            item(2, "b", 5.0, 0, 0, 20),
            item(3, "c", 5.0, 0, 0, 10),
        ];
        sort_items(&mut items, ItemSortMode::New);
        assert_eq!(ids(&items), vec![2, 3, 1]);

        sort_items(&mut items, ItemSortMode::Old);
        assert_eq!(ids(&items), vec![1, 3, 2]);
    }

    #[test]
    fn name_and_stock_modes() {
        let mut items = vec![
            item(1, "mate", 5.0, 0, 7, 0),
            item(2, "cola", 5.0, 0, 24, 1),
            item(3, "soda", 5.0, 0, 1, 2),
        ];
        sort_items(&mut items, ItemSortMode::NameA2z);
        assert_eq!(ids(&items), vec![2, 1, 3]);

        sort_items(&mut items, ItemSortMode::NameZ2a);
        assert_eq!(ids(&items), vec![3, 1, 2]);

        sort_items(&mut items, ItemSortMode::HighStock);
        assert_eq!(ids(&items), vec![2, 1, 3]);

        sort_items(&mut items, ItemSortMode::LowStock);
        assert_eq!(ids(&items), vec![3, 1, 2]);
    }

    #[test]
    fn sort_mode_parses_known_names() {
        assert_eq!(
            "high_stock".parse::<ItemSortMode>().unwrap(),
            ItemSortMode::HighStock
        );
        assert!("highest".parse::<ItemSortMode>().is_err());
    }

    #[test]
    fn transaction_kind_round_trips() {
        for kind in [
            TransactionKind::Purchase,
            TransactionKind::Deposit,
            TransactionKind::StockUpdate,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("withdrawal".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn comment_normalization() {
        assert_eq!(normalize_comment(None), None);
        assert_eq!(normalize_comment(Some("ok")), Some("ok".to_owned()));
        assert_eq!(normalize_comment(Some("")), Some(String::new()));

        let exact = "x".repeat(limits::MAX_COMMENT_LENGTH);
        assert_eq!(normalize_comment(Some(&exact)), Some(exact.clone()));

        let too_long = format!("{exact}x");
        assert_eq!(normalize_comment(Some(&too_long)), None);
    }

    #[test]
    fn comment_length_counts_characters_not_bytes() {
        let umlauts = "ö".repeat(limits::MAX_COMMENT_LENGTH);
        assert!(umlauts.len() > limits::MAX_COMMENT_LENGTH);
        assert_eq!(normalize_comment(Some(&umlauts)), Some(umlauts.clone()));
    }
}
