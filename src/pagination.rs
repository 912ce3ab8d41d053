// ABOUTME: Offset/limit windowing for paged listings
// ABOUTME: Computes clamped previous/next windows that never point out of range
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Offset/limit pagination over a counted listing.
//!
//! The helper is pure: it turns `(offset, limit, count)` into optional
//! previous/next [`Window`]s. The external boundary renders windows as links;
//! this crate never builds URLs.

use serde::{Deserialize, Serialize};

/// One page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Rows skipped before the page starts
    pub offset: i64,
    /// Maximum rows on the page
    pub limit: i64,
}

/// Adjacent windows for a page, present only when they contain rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// Window immediately before the current page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Window>,
    /// Window immediately after the current page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Window>,
}

/// Computes the previous/next windows for a page of `count` total rows.
///
/// A previous window exists iff `offset > 0`. Its offset is `offset - limit`
/// clamped to 0; when clamped, its limit shrinks to `offset` so the previous
/// page ends exactly where the current one starts. A next window exists iff
/// `count > offset + limit`.
#[must_use]
pub fn page_links(offset: i64, limit: i64, count: i64) -> PageLinks {
    let previous = (offset > 0).then(|| {
        if offset >= limit {
            Window {
                offset: offset - limit,
                limit,
            }
        } else {
            Window {
                offset: 0,
                limit: offset,
            }
        }
    });

    let next = (count > offset + limit).then(|| Window {
        offset: offset + limit,
        limit,
    });

    PageLinks { previous, next }
}
