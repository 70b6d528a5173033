//! # Continuity Scanner
//!
//! Walks the audited window from the newest block down, one position at a
//! time, and checks that each block's declared parent hash equals the hash
//! stored one number below.
//!
//! ## Per-Position Flow
//!
//! ```text
//! i = high ──► fetch block(i) ─┐
//!              fetch block(i-1)┴─► join ──► compare ──► finding? ──► progress
//!     │                                                                 │
//!     └──────────────────────── i - 1 ◄─────────────────────────────────┘
//! ```
//!
//! The two lookups of a position are joined; positions never overlap, so at
//! most two blocks are held at any time regardless of the window size.
//!
//! ## Failure
//!
//! The first store error aborts the scan and is returned to the caller.
//! Findings already handed to the observer stay valid. There are no
//! retries.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::{ContinuityBreak, Finding, MissingRecord, MissingSide};
use super::observer::ScanObserver;
use super::range::ScanRange;
use crate::config::ScanConfig;
use crate::storage::{Block, BlockNumber, BlockStore, StoreResult, StoreStats};

// ---------------------------------------------------------------------------
// GapPolicy
// ---------------------------------------------------------------------------

/// What to do with a position whose block or predecessor has no row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Pass over the position without output.
    #[default]
    Skip,
    /// Emit a [`MissingRecord`] for the position.
    Report,
}

// ---------------------------------------------------------------------------
// Plan & Summary
// ---------------------------------------------------------------------------

/// Store statistics and the window resolved from them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScanPlan {
    pub stats: StoreStats,
    /// `None` when there is nothing to scan.
    pub range: Option<ScanRange>,
}

impl ScanPlan {
    /// Number of positions the scan will visit.
    pub fn total(&self) -> u64 {
        self.range.map_or(0, |r| r.comparisons())
    }
}

/// Outcome of a completed scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub range: Option<ScanRange>,
    /// Positions processed.
    pub positions: u64,
    pub breaks: u64,
    pub gaps: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ScanSummary {
    fn new(range: Option<ScanRange>, started_at: DateTime<Utc>) -> Self {
        Self {
            range,
            positions: 0,
            breaks: 0,
            gaps: 0,
            started_at,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, finding: &Finding) {
        match finding {
            Finding::Break(_) => self.breaks += 1,
            Finding::Missing(_) => self.gaps += 1,
        }
    }

    /// No breaks and no reported gaps.
    pub fn is_clean(&self) -> bool {
        self.breaks == 0 && self.gaps == 0
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare one scanned pair.
///
/// `child` and `parent` are whatever the store returned for `child_num` and
/// `child_num - 1`. Pure: no I/O, no logging.
pub fn compare_link(
    child_num: BlockNumber,
    child: Option<&Block>,
    parent: Option<&Block>,
    gap_policy: GapPolicy,
) -> Option<Finding> {
    match (child, parent) {
        (Some(child), Some(parent)) => {
            if child.links_to(parent) {
                None
            } else {
                Some(Finding::Break(ContinuityBreak::new(child, parent)))
            }
        }
        (child, parent) => match gap_policy {
            GapPolicy::Skip => None,
            GapPolicy::Report => {
                MissingSide::from_presence(child.is_some(), parent.is_some()).map(|missing| {
                    Finding::Missing(MissingRecord { child_num, missing })
                })
            }
        },
    }
}

// ---------------------------------------------------------------------------
// ContinuityScanner
// ---------------------------------------------------------------------------

/// Audits parent-hash continuity over a [`BlockStore`].
#[derive(Debug)]
pub struct ContinuityScanner<S> {
    store: S,
    config: ScanConfig,
}

impl<S: BlockStore> ContinuityScanner<S> {
    pub fn new(store: S, config: ScanConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Read the store statistics and resolve the window to scan.
    pub async fn plan(&self) -> StoreResult<ScanPlan> {
        let stats = self.store.count_and_max().await?;
        let range = ScanRange::resolve(stats, &self.config);
        Ok(ScanPlan { stats, range })
    }

    /// Fetch `child_num` and its predecessor together and compare them.
    ///
    /// Block 0 has no predecessor, so there is nothing to compare there.
    pub async fn check_position(&self, child_num: BlockNumber) -> StoreResult<Option<Finding>> {
        let Some(parent_num) = child_num.checked_sub(1) else {
            return Ok(None);
        };
        let (child, parent) = futures::try_join!(
            self.store.block_by_number(child_num),
            self.store.block_by_number(parent_num),
        )?;
        Ok(compare_link(
            child_num,
            child.as_ref(),
            parent.as_ref(),
            self.config.gap_policy,
        ))
    }

    /// Scan the whole window, newest position first.
    pub async fn scan<O>(&self, observer: &mut O) -> StoreResult<ScanSummary>
    where
        O: ScanObserver + ?Sized,
    {
        let started_at = Utc::now();
        let timer = Instant::now();

        let plan = self.plan().await?;
        observer.on_start(&plan);

        let mut summary = ScanSummary::new(plan.range, started_at);
        let total = plan.total();

        match plan.range {
            Some(range) => tracing::info!(
                target: "rollcheck::scan",
                low = range.low,
                high = range.high,
                count = plan.stats.count,
                positions = total,
                gap_policy = ?self.config.gap_policy,
                "continuity scan started"
            ),
            None => tracing::info!(
                target: "rollcheck::scan",
                count = plan.stats.count,
                "nothing to scan"
            ),
        }

        if let Some(range) = plan.range {
            for (done, child_num) in (1u64..).zip(range.positions()) {
                let outcome = self.check_position(child_num).await.map_err(|e| {
                    tracing::error!(
                        target: "rollcheck::scan",
                        block = child_num,
                        processed = done - 1,
                        error = %e,
                        "continuity scan aborted"
                    );
                    e
                })?;

                if let Some(finding) = outcome {
                    match &finding {
                        Finding::Break(b) => tracing::warn!(
                            target: "rollcheck::scan",
                            block = b.child_num,
                            parent_hash = %crate::storage::to_prefixed_hex(&b.child_parent_hash),
                            stored_hash = %crate::storage::to_prefixed_hex(&b.parent_block_hash),
                            "continuity break"
                        ),
                        Finding::Missing(m) => tracing::warn!(
                            target: "rollcheck::scan",
                            block = m.child_num,
                            missing = ?m.missing,
                            "missing block"
                        ),
                    }
                    summary.record(&finding);
                    observer.on_finding(&finding);
                }

                summary.positions = done;
                tracing::trace!(
                    target: "rollcheck::scan",
                    block = child_num,
                    done,
                    total,
                    "position checked"
                );
                observer.on_progress(done, total);
            }
        }

        summary.elapsed = timer.elapsed();
        tracing::info!(
            target: "rollcheck::scan",
            positions = summary.positions,
            breaks = summary.breaks,
            gaps = summary.gaps,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "continuity scan finished"
        );
        observer.on_finish(&summary);

        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
