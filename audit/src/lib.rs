// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # rollcheck — Archive Continuity Auditor
//!
//! Walks a persisted table of blockchain blocks and checks that every
//! stored block's parent hash matches the hash recorded one block number
//! below it. A mismatch means the archive contains a rollback, a fork, or
//! plain corruption.
//!
//! The auditor is read-only. It never writes rows, never resolves forks and
//! never reaches out to a network to backfill missing blocks.
//!
//! ## Architecture
//!
//! - **storage** — The block model, the narrow [`BlockStore`] accessor
//!   contract, a SQL adapter over sqlx and an in-memory store.
//! - **scan** — Range derivation, the continuity scanner itself, findings
//!   and the observer seam used for progress reporting.
//! - **config** — TOML configuration for the store, the scan and logging.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rollcheck::{ContinuityScanner, ScanConfig, SqlBlockStore, StoreConfig};
//!
//! let store = SqlBlockStore::connect(&store_config).await?;
//! let scanner = ContinuityScanner::new(store, ScanConfig::default());
//! let summary = scanner.scan(&mut ()).await?;
//! println!("{} breaks", summary.breaks);
//! ```

pub mod config;
pub mod scan;
pub mod storage;

pub use config::{AuditConfig, ConfigError, LogFormat, LoggerConfig, ScanConfig, StoreConfig};
pub use scan::{
    CollectingObserver, ContinuityBreak, ContinuityScanner, Finding, GapPolicy, MissingRecord,
    MissingSide, ScanObserver, ScanPlan, ScanRange, ScanSummary,
};
pub use storage::{
    Block, BlockNumber, BlockStore, MemoryBlockStore, SqlBlockStore, StoreError, StoreResult,
    StoreStats, TableMapping,
};
