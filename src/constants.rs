// ABOUTME: Application constants organized by domain
// ABOUTME: Limits and environment-backed configuration accessors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Constants, grouped by domain.

use std::env;

/// Hard limits enforced by the data layer.
pub mod limits {
    /// Longest comment stored on a transaction; longer comments normalize to none.
    pub const MAX_COMMENT_LENGTH: usize = 1000;

    /// Default connection pool size for file-backed databases.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
}

/// Environment-based configuration accessors.
pub mod env_config {
    use super::env;
    use super::limits;

    /// Get the database URL from the environment or default.
    #[must_use]
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/ledger.db".to_owned())
    }

    /// Get the connection pool size from the environment or default.
    #[must_use]
    pub fn database_max_connections() -> u32 {
        env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(limits::DEFAULT_MAX_CONNECTIONS)
    }

    /// Get the log level from the environment or default.
    #[must_use]
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned())
    }
}
