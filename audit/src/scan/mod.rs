//! # Scan Module
//!
//! Parent-hash continuity checking over a [`BlockStore`](crate::storage::BlockStore).
//!
//! ## Architecture
//!
//! ```text
//! range.rs    — window derivation from (count, max) and overrides
//! scanner.rs  — ContinuityScanner, GapPolicy, the pairwise comparison
//! finding.rs  — ContinuityBreak, MissingRecord and their rendering
//! observer.rs — callbacks for progress and findings
//! ```
//!
//! For a store holding `count` rows with highest number `max`, the window
//! is `max - count + 1 ..= max`. Each number `i` above the lower bound is
//! checked against `i - 1`, newest first.

pub mod finding;
pub mod observer;
pub mod range;
pub mod scanner;

pub use finding::{ContinuityBreak, Finding, MissingRecord, MissingSide};
pub use observer::{CollectingObserver, ScanObserver};
pub use range::ScanRange;
pub use scanner::{compare_link, ContinuityScanner, GapPolicy, ScanPlan, ScanSummary};
