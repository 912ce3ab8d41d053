// ABOUTME: Packed bitmask flags stored on items and transactions
// ABOUTME: Bit positions are part of the storage format and must not change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Flag words persisted as integers on items and transactions.
//!
//! Flags are mutated in place with targeted bit operations (`flags | mask`,
//! `flags & ~mask`) rather than read-modify-write from the application, so
//! concurrent writers cannot clobber unrelated bits. Unknown bits read back
//! from storage are preserved by [`from_bits_retain`](ItemFlags::from_bits_retain)
//! when re-encoding, and ignored when decoding to booleans.

use bitflags::bitflags;

bitflags! {
    /// Flag word stored on an item row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ItemFlags: i64 {
        /// Item is hidden from visible-only listings but remains purchasable
        /// by id and keeps its history.
        const INVISIBLE = 1;
    }
}

bitflags! {
    /// Flag word stored on a transaction row.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransactionFlags: i64 {
        /// Transaction is excluded from balance and stock derivations but
        /// stays listed in history.
        const REMOVED = 1;
    }
}

impl ItemFlags {
    /// True when the invisible bit is set in a raw flag word.
    #[must_use]
    pub fn is_invisible(raw: i64) -> bool {
        Self::from_bits_retain(raw).contains(Self::INVISIBLE)
    }
}

impl TransactionFlags {
    /// True when the removed bit is set in a raw flag word.
    #[must_use]
    pub fn is_removed(raw: i64) -> bool {
        Self::from_bits_retain(raw).contains(Self::REMOVED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invisible_bit_round_trips() {
        assert!(!ItemFlags::is_invisible(0));
        assert!(ItemFlags::is_invisible(ItemFlags::INVISIBLE.bits()));
    }

    #[test]
    fn unknown_bits_are_ignored_when_decoding() {
        // A future writer may set bits this version does not know about.
        let raw = ItemFlags::INVISIBLE.bits() | 0b1000;
        assert!(ItemFlags::is_invisible(raw));
        assert!(!TransactionFlags::is_removed(0b1000_0000));
    }

    #[test]
    fn set_and_clear_masks_target_one_bit() {
        let mask = TransactionFlags::REMOVED.bits();
        let with_extra = 0b1010;

        let set = with_extra | mask;
        assert!(TransactionFlags::is_removed(set));
        assert_eq!(set | mask, set, "setting an already-set bit is a no-op");
        assert_eq!(set & !mask, with_extra, "clearing restores untouched bits");
        assert_eq!(with_extra & !mask, with_extra, "clearing an unset bit is a no-op");
    }
}
