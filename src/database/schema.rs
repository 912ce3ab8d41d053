// ABOUTME: Reference schema for the ledger store: tables, derived views, indexes
// ABOUTME: Also defines the relation inventory used for startup validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Reference schema and validation inventory.
//!
//! Production schema management is external; this module exists so tests and
//! fresh deployments can provision a conforming database, and so
//! [`Database::validate_schema`](super::Database::validate_schema) can fail
//! fast when pointed at a store missing required relations.
//!
//! Derived state lives in views: balances, stock levels, and purchase counts
//! are always computed from the non-removed transaction history, never stored.

use std::collections::HashSet;

/// Tables the data layer requires.
pub const REQUIRED_TABLES: [&str; 9] = [
    "groups",
    "users",
    "items",
    "prices",
    "transactions",
    "purchased_items",
    "deposits",
    "item_stock_updates",
    "favorite_items",
];

/// Views the data layer requires.
pub const REQUIRED_VIEWS: [&str; 7] = [
    "user_balances",
    "full_users",
    "item_stock",
    "item_times_purchased",
    "full_items",
    "full_purchases",
    "full_stock_updates",
];

/// Relation names from `sqlite_master` that are required but absent.
pub fn missing_relations(present: &HashSet<String>) -> Vec<String> {
    REQUIRED_TABLES
        .iter()
        .chain(REQUIRED_VIEWS.iter())
        .filter(|name| !present.contains(**name))
        .map(|name| (*name).to_owned())
        .collect()
}

/// Reference DDL, one statement per entry, in dependency order.
///
/// `transactions.kind` is the variant discriminator; child tables carry the
/// variant-specific rows. `deposits.transaction_id` doubles as the rowid so
/// `last_insert_rowid()` still refers to the transaction after its insert.
/// Item deletion cascades prices, favorites, and stock history, while
/// purchased lines keep their snapshot and only null the item reference.
pub const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        external_id TEXT NOT NULL UNIQUE
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        external_id TEXT NOT NULL UNIQUE
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        display_name TEXT NOT NULL,
        icon_url TEXT,
        flags INTEGER NOT NULL DEFAULT 0,
        created_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (group_id, display_name)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS prices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        price REAL NOT NULL,
        display_name TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        kind TEXT NOT NULL CHECK (kind IN ('purchase', 'deposit', 'stock_update')),
        created_by INTEGER NOT NULL REFERENCES users(id),
        created_for INTEGER REFERENCES users(id),
        comment TEXT,
        flags INTEGER NOT NULL DEFAULT 0,
        created_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS purchased_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
        item_id INTEGER REFERENCES items(id) ON DELETE SET NULL,
        display_name TEXT NOT NULL,
        icon_url TEXT,
        quantity INTEGER NOT NULL,
        purchase_price REAL NOT NULL,
        purchase_price_name TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS deposits (
        transaction_id INTEGER PRIMARY KEY REFERENCES transactions(id) ON DELETE CASCADE,
        total REAL NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS item_stock_updates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
        item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        stock INTEGER NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS favorite_items (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, item_id)
    )
    ",
    r"CREATE INDEX IF NOT EXISTS idx_users_group ON users(group_id)",
    r"CREATE INDEX IF NOT EXISTS idx_items_group ON items(group_id)",
    r"CREATE INDEX IF NOT EXISTS idx_prices_item ON prices(item_id)",
    r"CREATE INDEX IF NOT EXISTS idx_transactions_group ON transactions(group_id)",
    r"CREATE INDEX IF NOT EXISTS idx_purchased_items_transaction ON purchased_items(transaction_id)",
    r"CREATE INDEX IF NOT EXISTS idx_purchased_items_item ON purchased_items(item_id)",
    r"CREATE INDEX IF NOT EXISTS idx_stock_updates_transaction ON item_stock_updates(transaction_id)",
    r"CREATE INDEX IF NOT EXISTS idx_stock_updates_item ON item_stock_updates(item_id)",
    // Balance: deposits credited minus purchases charged, non-removed only.
    r"
    CREATE VIEW IF NOT EXISTS user_balances AS
    SELECT
        u.id AS user_id,
        COALESCE((
            SELECT SUM(d.total)
            FROM deposits d
            JOIN transactions t ON t.id = d.transaction_id
            WHERE t.created_for = u.id AND t.flags & 1 = 0
        ), 0.0)
        - COALESCE((
            SELECT SUM(pi.quantity * pi.purchase_price)
            FROM purchased_items pi
            JOIN transactions t ON t.id = pi.transaction_id
            WHERE t.created_for = u.id AND t.flags & 1 = 0
        ), 0.0) AS balance
    FROM users u
    ",
    r"
    CREATE VIEW IF NOT EXISTS full_users AS
    SELECT
        u.id,
        u.group_id,
        u.external_id,
        g.external_id AS group_external_id,
        b.balance
    FROM users u
    JOIN groups g ON g.id = u.group_id
    JOIN user_balances b ON b.user_id = u.id
    ",
    // Stock: the latest non-removed absolute snapshot per item, 0 before any.
    r"
    CREATE VIEW IF NOT EXISTS item_stock AS
    SELECT
        i.id AS item_id,
        COALESCE((
            SELECT su.stock
            FROM item_stock_updates su
            JOIN transactions t ON t.id = su.transaction_id
            WHERE su.item_id = i.id AND t.flags & 1 = 0
            ORDER BY su.id DESC
            LIMIT 1
        ), 0) AS stock
    FROM items i
    ",
    r"
    CREATE VIEW IF NOT EXISTS item_times_purchased AS
    SELECT
        i.id AS item_id,
        COALESCE((
            SELECT SUM(pi.quantity)
            FROM purchased_items pi
            JOIN transactions t ON t.id = pi.transaction_id
            WHERE pi.item_id = i.id AND t.flags & 1 = 0
        ), 0) AS times_purchased
    FROM items i
    ",
    r"
    CREATE VIEW IF NOT EXISTS full_items AS
    SELECT
        i.id,
        i.group_id,
        i.display_name,
        i.icon_url,
        i.flags,
        i.created_time,
        s.stock,
        tp.times_purchased
    FROM items i
    JOIN item_stock s ON s.item_id = i.id
    JOIN item_times_purchased tp ON tp.item_id = i.id
    ",
    // One row per purchased line; callers order by line_id.
    r"
    CREATE VIEW IF NOT EXISTS full_purchases AS
    SELECT
        t.id,
        t.group_id,
        t.created_by,
        t.created_for,
        t.created_time,
        t.comment,
        t.flags,
        pi.id AS line_id,
        pi.item_id,
        pi.display_name,
        pi.icon_url,
        pi.quantity,
        pi.purchase_price,
        pi.purchase_price_name
    FROM transactions t
    JOIN purchased_items pi ON pi.transaction_id = t.id
    WHERE t.kind = 'purchase'
    ",
    // Storage records absolute levels only; 'before' is the previous recorded
    // level for the item, derived over the raw line history.
    r"
    CREATE VIEW IF NOT EXISTS full_stock_updates AS
    SELECT
        t.id,
        t.group_id,
        t.created_by,
        t.created_time,
        t.comment,
        t.flags,
        su.id AS line_id,
        su.item_id,
        COALESCE(LAG(su.stock) OVER (PARTITION BY su.item_id ORDER BY su.id), 0) AS before_stock,
        su.stock AS after_stock
    FROM transactions t
    JOIN item_stock_updates su ON su.transaction_id = t.id
    WHERE t.kind = 'stock_update'
    ",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_relations_reports_absent_names() {
        let mut present: HashSet<String> = REQUIRED_TABLES
            .iter()
            .chain(REQUIRED_VIEWS.iter())
            .map(|n| (*n).to_owned())
            .collect();
        assert!(missing_relations(&present).is_empty());

        present.remove("full_items");
        present.remove("deposits");
        let missing = missing_relations(&present);
        assert_eq!(missing.len(), 2);
        assert!(missing.contains(&"full_items".to_owned()));
        assert!(missing.contains(&"deposits".to_owned()));
    }
}
