//! The accessor contract the scanner depends on.
//!
//! Two read-only operations: aggregate statistics for the whole table and a
//! point lookup by block number. Everything the continuity scan needs goes
//! through these, so any backend that can answer them can be audited.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::block::{Block, BlockNumber};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by a block store.
///
/// A missing row is not an error: lookups return `Ok(None)` for gaps.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or the statistics query failed.
    #[error("block store unavailable: {0}")]
    Unavailable(String),

    /// A single block lookup failed for a reason other than absence.
    #[error("failed to fetch block #{block_num}: {reason}")]
    Fetch {
        /// Block number being looked up.
        block_num: BlockNumber,
        /// Driver-level description of the failure.
        reason: String,
    },

    /// A lookup exceeded the configured query timeout.
    #[error("lookup of block #{block_num} timed out after {timeout_secs}s")]
    Timeout {
        /// Block number being looked up.
        block_num: BlockNumber,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// A row came back in a shape the auditor cannot interpret.
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// The table mapping names something that is not a plain SQL identifier.
    #[error("invalid table mapping: {0}")]
    InvalidMapping(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregate view of the stored block table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of stored rows.
    pub count: u64,
    /// Highest stored block number. `None` for an empty table.
    pub max: Option<BlockNumber>,
}

impl StoreStats {
    pub fn new(count: u64, max: Option<BlockNumber>) -> Self {
        Self { count, max }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.max.is_none()
    }
}

// ---------------------------------------------------------------------------
// BlockStore
// ---------------------------------------------------------------------------

/// Read-only access to archived blocks.
///
/// Implementations must not mutate the store. Each call is independently
/// consistent; no snapshot is held across calls.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Row count and highest block number in one round-trip.
    async fn count_and_max(&self) -> StoreResult<StoreStats>;

    /// The block stored at `number`, or `None` when there is no such row.
    async fn block_by_number(&self, number: BlockNumber) -> StoreResult<Option<Block>>;
}

#[async_trait]
impl<T: BlockStore + ?Sized> BlockStore for Arc<T> {
    async fn count_and_max(&self) -> StoreResult<StoreStats> {
        (**self).count_and_max().await
    }

    async fn block_by_number(&self, number: BlockNumber) -> StoreResult<Option<Block>> {
        (**self).block_by_number(number).await
    }
}

#[async_trait]
impl<'a, T: BlockStore + ?Sized> BlockStore for &'a T {
    async fn count_and_max(&self) -> StoreResult<StoreStats> {
        (**self).count_and_max().await
    }

    async fn block_by_number(&self, number: BlockNumber) -> StoreResult<Option<Block>> {
        (**self).block_by_number(number).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats() {
        assert!(StoreStats::default().is_empty());
        assert!(StoreStats::new(0, Some(10)).is_empty());
        assert!(StoreStats::new(3, None).is_empty());
        assert!(!StoreStats::new(1, Some(0)).is_empty());
    }

    #[test]
    fn error_messages_name_the_block() {
        let err = StoreError::Fetch {
            block_num: 42,
            reason: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "failed to fetch block #42: connection reset");

        let err = StoreError::Timeout {
            block_num: 7,
            timeout_secs: 30,
        };
        assert_eq!(err.to_string(), "lookup of block #7 timed out after 30s");
    }
}
