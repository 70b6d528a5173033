//! Observer seam between the scanner and whatever displays its progress.
//!
//! The scanner never prints. It calls back into a [`ScanObserver`] when the
//! plan is known, for every finding, after every position and at the end.
//! The command-line reporter implements this to write the diagnostic stream;
//! tests use [`CollectingObserver`].

use super::finding::Finding;
use super::scanner::{ScanPlan, ScanSummary};

/// Callbacks invoked by [`ContinuityScanner::scan`](super::ContinuityScanner::scan).
///
/// Every method has an empty default, so implementors pick what they need.
pub trait ScanObserver {
    /// The store statistics were read and the window resolved.
    fn on_start(&mut self, _plan: &ScanPlan) {}

    /// A position produced a break or, under the `report` gap policy, a
    /// missing-record diagnostic.
    fn on_finding(&mut self, _finding: &Finding) {}

    /// `done` positions out of `total` have been processed.
    fn on_progress(&mut self, _done: u64, _total: u64) {}

    /// The whole window was scanned. Not called when the scan aborts.
    fn on_finish(&mut self, _summary: &ScanSummary) {}
}

/// Observer that ignores everything.
impl ScanObserver for () {}

/// Observer that keeps everything it is told. Handy for tests and for
/// callers that want the findings as a list.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    pub plan: Option<ScanPlan>,
    pub findings: Vec<Finding>,
    /// Every `done` value reported, in order.
    pub progress: Vec<u64>,
    pub total: Option<u64>,
    pub summary: Option<ScanSummary>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the continuity breaks, in the order they were found.
    pub fn breaks(&self) -> Vec<&super::ContinuityBreak> {
        self.findings.iter().filter_map(Finding::as_break).collect()
    }
}

impl ScanObserver for CollectingObserver {
    fn on_start(&mut self, plan: &ScanPlan) {
        self.plan = Some(*plan);
    }

    fn on_finding(&mut self, finding: &Finding) {
        self.findings.push(finding.clone());
    }

    fn on_progress(&mut self, done: u64, total: u64) {
        self.progress.push(done);
        self.total = Some(total);
    }

    fn on_finish(&mut self, summary: &ScanSummary) {
        self.summary = Some(summary.clone());
    }
}
