// ABOUTME: Unified error types for the ledger data layer
// ABOUTME: Distinguishes not-found, integrity, schema, and store failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Error taxonomy for ledger operations.
//!
//! Callers that need to map a missing entity to a user-facing response match
//! on [`LedgerError::NotFound`]; everything else is terminal for the calling
//! operation. No variant is retried by this crate.

/// Result alias used across the crate.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by repositories and ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// An entity id did not resolve to a row (or not to one in the expected group).
    #[error("{entity} with id {id} does not exist")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// Identifier that failed to resolve
        id: i64,
    },

    /// Stored data or a call sequence violated an internal invariant.
    ///
    /// Covers the empty statement list, an unknown transaction discriminator
    /// in storage, and a discriminator mismatch after creation. These are
    /// programmer or data errors, never retried.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// The connected database is missing required tables or views.
    #[error("schema validation failed, missing relations: {missing:?}")]
    SchemaValidation {
        /// Names of the relations that were not found
        missing: Vec<String>,
    },

    /// A composite update failed and was rolled back.
    ///
    /// The underlying cause is logged, not exposed; callers probe existence
    /// beforehand when they need the specific not-found case.
    #[error("failed to {operation}")]
    OperationFailed {
        /// Human-readable name of the operation that failed
        operation: &'static str,
    },

    /// The underlying store failed (connectivity, constraint, timeout).
    #[error("database error")]
    Store {
        /// Underlying driver error
        #[from]
        source: sqlx::Error,
    },
}

impl LedgerError {
    /// Shorthand for a [`LedgerError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// True when the error means the entity does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
