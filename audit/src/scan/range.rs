//! Scan range derivation.
//!
//! The archive is assumed to be one contiguous window of `count` rows that
//! ends at `max`, so the lowest number is `max - count + 1`. Nothing checks
//! that assumption up front: a table with holes simply produces a window
//! that starts too high, and the gaps inside it surface during the scan.

use serde::Serialize;

use crate::config::ScanConfig;
use crate::storage::{BlockNumber, StoreStats};

/// Inclusive window of block numbers to audit.
///
/// Every number in `low + 1 ..= high` is compared against its predecessor,
/// so a window of `n` blocks yields `n - 1` comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScanRange {
    pub low: BlockNumber,
    pub high: BlockNumber,
}

impl ScanRange {
    /// `None` when `low > high`.
    pub fn new(low: BlockNumber, high: BlockNumber) -> Option<Self> {
        (low <= high).then_some(Self { low, high })
    }

    /// Window implied by the store statistics, or `None` for an empty store.
    ///
    /// The lower bound saturates at zero when the row count exceeds
    /// `max + 1`.
    pub fn derive(stats: StoreStats) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        let high = stats.max?;
        let low = high.saturating_sub(stats.count - 1);
        Some(Self { low, high })
    }

    /// Derived window with the configured `start`/`end` overrides applied.
    ///
    /// An override replaces the corresponding bound even when the store is
    /// empty. Returns `None` when no lower or upper bound can be found or
    /// the bounds cross.
    pub fn resolve(stats: StoreStats, config: &ScanConfig) -> Option<Self> {
        let derived = Self::derive(stats);
        let low = config.start.or(derived.map(|r| r.low))?;
        let high = config.end.or(derived.map(|r| r.high))?;
        Self::new(low, high)
    }

    /// Child block numbers to check, newest first.
    pub fn positions(&self) -> impl Iterator<Item = BlockNumber> {
        (self.low.saturating_add(1)..=self.high).rev()
    }

    /// Number of parent/child comparisons in this window.
    pub fn comparisons(&self) -> u64 {
        self.high - self.low
    }
}
