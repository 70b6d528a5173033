//! # Storage Module
//!
//! Read-only access to the archived block table.
//!
//! ## Architecture
//!
//! ```text
//! block.rs  — Block record and hash rendering
//! store.rs  — BlockStore accessor contract, StoreStats, StoreError
//! sql.rs    — sqlx-backed store with an explicit table mapping
//! memory.rs — BTreeMap-backed store for tests and small exports
//! ```
//!
//! The scanner only ever talks to [`BlockStore`]. It asks once for the row
//! count and highest block number, then looks blocks up one number at a
//! time. No backend is asked to hold a snapshot or a lock.

pub mod block;
pub mod memory;
pub mod sql;
pub mod store;

pub use block::{to_prefixed_hex, Block, BlockNumber};
pub use memory::MemoryBlockStore;
pub use sql::{SqlBlockStore, TableMapping};
pub use store::{BlockStore, StoreError, StoreResult, StoreStats};
