//! # cellstore
//!
//! A Bigtable-style storage backend over an embedded ordered key-value
//! engine:
//! - Hierarchical cells (table → row → column family → qualifier →
//!   timestamp) mapped onto a flat, ordered key space
//! - One physical column family per (table, column family) pair, created
//!   lazily and enumerated on reopen
//! - A durable manifest keeping the set of live tables consistent with
//!   physical state
//! - Write-Ahead Logging for durability and crash recovery
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Schema layer / server wiring                 │
//! │            (lifecycle singleton, manifest reload)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Storage                                │
//! │   (row/cell ops, manifest, table-deletion cascade)           │
//! └───────┬──────────────────────┬──────────────────────────────┘
//!         │                      │
//!         ▼                      ▼
//!  ┌─────────────┐        ┌─────────────┐
//!  │  Registry   │        │  Key Codec  │
//!  │ (families)  │        │  (pure fns) │
//!  └──────┬──────┘        └─────────────┘
//!         │
//!         ▼
//!  ┌─────────────┐        ┌─────────────┐
//!  │   Engine    │───────▶│     WAL     │
//!  │ (BTree CFs) │        │  (append)   │
//!  └─────────────┘        └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod wal;
pub mod engine;
pub mod registry;
pub mod manifest;
pub mod store;
pub mod lifecycle;
pub mod bootstrap;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::Config;
pub use store::{DeleteTableOutcome, Storage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cellstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
