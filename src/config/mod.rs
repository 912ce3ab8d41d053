// ABOUTME: Configuration management module for centralized data layer settings
// ABOUTME: Handles environment-driven store, logging, and deployment configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tab Ledger Contributors

//! Configuration for the ledger data layer.
//!
//! Everything is environment-driven: [`environment::LedgerConfig::from_env`]
//! assembles the complete configuration, and the individual types are public
//! for embedders that construct configuration programmatically.

/// Environment and store configuration
pub mod environment;

pub use environment::{DatabaseConfig, DatabaseUrl, Environment, LedgerConfig, LogLevel};
