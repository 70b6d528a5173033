//! # Diagnostic Output
//!
//! Scan observers that render the diagnostic stream on stdout.
//!
//! - [`TextReporter`] writes the start line, an in-place progress counter and
//!   two lines per break.
//! - [`JsonReporter`] writes one JSON object per line and no progress.
//!
//! Observer callbacks cannot fail, so the first write error is kept and
//! surfaced by `finish()` once the scan returns.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use rollcheck::{Finding, ScanObserver, ScanPlan, ScanRange, ScanSummary};

/// Line printed in place of the range when the store holds no blocks.
pub const EMPTY_STORE_LINE: &str = "Block store is empty";

/// The line announcing the audited window.
///
/// A store with rows can still resolve to no window when the requested
/// bounds miss it. That case names what the store actually holds.
pub fn start_line(plan: &ScanPlan) -> String {
    match (plan.range, ScanRange::derive(plan.stats)) {
        (Some(range), _) => format!(
            "Block #{} ~ Block #{}: Count({})",
            range.low, range.high, plan.stats.count
        ),
        (None, Some(stored)) => format!(
            "No blocks in the requested window; store holds Block #{} ~ Block #{}: Count({})",
            stored.low, stored.high, plan.stats.count
        ),
        (None, None) => EMPTY_STORE_LINE.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

pub struct TextReporter<W: Write> {
    out: W,
    progress: bool,
    /// A progress counter ends the current line with `\r`.
    line_open: bool,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W, progress: bool) -> Self {
        Self {
            out,
            progress,
            line_open: false,
            error: None,
        }
    }

    fn write(&mut self, f: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = f(&mut self.out).and_then(|_| self.out.flush()) {
            self.error = Some(e);
        }
    }

    /// The writer back, or the first write error.
    ///
    /// Terminates a pending progress line, which is left open when the scan
    /// aborted before `on_finish`.
    pub fn finish(mut self) -> io::Result<W> {
        self.close_line();
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }

    fn close_line(&mut self) {
        if self.line_open {
            self.line_open = false;
            self.write(|out| writeln!(out));
        }
    }
}

impl<W: Write> ScanObserver for TextReporter<W> {
    fn on_start(&mut self, plan: &ScanPlan) {
        let line = start_line(plan);
        self.write(|out| writeln!(out, "{line}"));
    }

    fn on_finding(&mut self, finding: &Finding) {
        // The cursor sits at the start of the progress line, so the finding
        // overwrites it and the next counter lands below.
        let text = finding.to_string();
        self.line_open = false;
        self.write(|out| writeln!(out, "{text}"));
    }

    fn on_progress(&mut self, done: u64, total: u64) {
        if !self.progress {
            return;
        }
        self.line_open = true;
        self.write(|out| write!(out, "({done} / {total})\r"));
    }

    fn on_finish(&mut self, _summary: &ScanSummary) {
        self.close_line();
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JsonEvent<'a> {
    Start {
        count: u64,
        max: Option<u64>,
        range: Option<ScanRange>,
    },
    Finding {
        finding: &'a Finding,
    },
    Finish {
        positions: u64,
        breaks: u64,
        gaps: u64,
        started_at: DateTime<Utc>,
        elapsed_ms: u64,
    },
}

pub struct JsonReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn emit(&mut self, event: &JsonEvent<'_>) {
        if self.error.is_some() {
            return;
        }
        let result = serde_json::to_writer(&mut self.out, event)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            self.error = Some(e);
        }
    }

    pub fn finish(self) -> io::Result<W> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.out),
        }
    }
}

impl<W: Write> ScanObserver for JsonReporter<W> {
    fn on_start(&mut self, plan: &ScanPlan) {
        self.emit(&JsonEvent::Start {
            count: plan.stats.count,
            max: plan.stats.max,
            range: plan.range,
        });
    }

    fn on_finding(&mut self, finding: &Finding) {
        self.emit(&JsonEvent::Finding { finding });
    }

    fn on_finish(&mut self, summary: &ScanSummary) {
        self.emit(&JsonEvent::Finish {
            positions: summary.positions,
            breaks: summary.breaks,
            gaps: summary.gaps,
            started_at: summary.started_at,
            elapsed_ms: summary.elapsed.as_millis() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcheck::storage::to_prefixed_hex;
    use rollcheck::{
        Block, ContinuityScanner, GapPolicy, MemoryBlockStore, ScanConfig, StoreStats,
    };

    fn hash_of(n: u64) -> Vec<u8> {
        blake3::hash(&n.to_be_bytes()).as_bytes().to_vec()
    }

    fn chain(low: u64, high: u64) -> MemoryBlockStore {
        MemoryBlockStore::from_blocks(
            (low..=high).map(|n| Block::new(n, hash_of(n), hash_of(n.wrapping_sub(1)))),
        )
    }

    async fn render_text(store: &MemoryBlockStore, config: ScanConfig, progress: bool) -> String {
        let scanner = ContinuityScanner::new(store, config);
        let mut reporter = TextReporter::new(Vec::new(), progress);
        scanner.scan(&mut reporter).await.unwrap();
        String::from_utf8(reporter.finish().unwrap()).unwrap()
    }

    #[test]
    fn start_line_formats() {
        let plan = ScanPlan {
            stats: StoreStats::new(5, Some(104)),
            range: ScanRange::new(100, 104),
        };
        assert_eq!(start_line(&plan), "Block #100 ~ Block #104: Count(5)");

        let empty = ScanPlan {
            stats: StoreStats::default(),
            range: None,
        };
        assert_eq!(start_line(&empty), EMPTY_STORE_LINE);
    }

    #[tokio::test]
    async fn window_above_stored_blocks_is_not_an_empty_store() {
        let store = chain(100, 104);
        let config = ScanConfig {
            start: Some(500),
            ..ScanConfig::default()
        };
        config.validate().unwrap();

        let text = render_text(&store, config, true).await;

        assert_eq!(
            text,
            "No blocks in the requested window; store holds Block #100 ~ Block #104: Count(5)\n"
        );
    }

    #[test]
    fn aborted_scan_terminates_progress_line() {
        let mut reporter = TextReporter::new(Vec::new(), true);
        reporter.on_start(&ScanPlan {
            stats: StoreStats::new(5, Some(104)),
            range: ScanRange::new(100, 104),
        });
        reporter.on_progress(1, 4);
        // The scan fails here, so on_finish never runs.
        let out = String::from_utf8(reporter.finish().unwrap()).unwrap();

        assert_eq!(out, "Block #100 ~ Block #104: Count(5)\n(1 / 4)\r\n");
    }

    #[tokio::test]
    async fn text_without_progress() {
        let store = chain(1, 3);
        store.set_parent_hash(3, vec![0xAB; 4]);

        let text = render_text(&store, ScanConfig::default(), false).await;

        assert_eq!(
            text,
            format!(
                "Block #1 ~ Block #3: Count(3)\n\
                 Block #3, parentHash 0xabababab\n\
                 ParentBlock #2, blockHash {}\n",
                to_prefixed_hex(&hash_of(2))
            )
        );
    }

    #[tokio::test]
    async fn text_with_progress() {
        let store = chain(1, 3);

        let text = render_text(&store, ScanConfig::default(), true).await;

        assert_eq!(text, "Block #1 ~ Block #3: Count(3)\n(1 / 2)\r(2 / 2)\r\n");
    }

    #[tokio::test]
    async fn text_reports_gaps_on_request() {
        let store = chain(1, 4);
        store.remove(2);
        let config = ScanConfig {
            gap_policy: GapPolicy::Report,
            ..ScanConfig::default()
        };

        let text = render_text(&store, config, false).await;

        assert_eq!(
            text,
            "Block #2 ~ Block #4: Count(3)\n\
             Missing Block #2 (checking Block #3)\n"
        );
    }

    #[tokio::test]
    async fn text_empty_store() {
        let store = MemoryBlockStore::new();
        let text = render_text(&store, ScanConfig::default(), true).await;
        assert_eq!(text, "Block store is empty\n");
    }

    #[tokio::test]
    async fn json_lines() {
        let store = chain(10, 12);
        store.set_parent_hash(12, vec![0x01; 2]);

        let scanner = ContinuityScanner::new(&store, ScanConfig::default());
        let mut reporter = JsonReporter::new(Vec::new());
        scanner.scan(&mut reporter).await.unwrap();
        let out = String::from_utf8(reporter.finish().unwrap()).unwrap();

        let events: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(events.len(), 3);

        assert_eq!(events[0]["event"], "start");
        assert_eq!(events[0]["count"], 3);
        assert_eq!(events[0]["range"]["low"], 10);
        assert_eq!(events[0]["range"]["high"], 12);

        assert_eq!(events[1]["event"], "finding");
        assert_eq!(events[1]["finding"]["kind"], "break");
        assert_eq!(events[1]["finding"]["child_num"], 12);
        assert_eq!(events[1]["finding"]["child_parent_hash"], "0x0101");

        assert_eq!(events[2]["event"], "finish");
        assert_eq!(events[2]["positions"], 2);
        assert_eq!(events[2]["breaks"], 1);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn write_errors_surface_on_finish() {
        let store = chain(1, 5);
        let scanner = ContinuityScanner::new(&store, ScanConfig::default());
        let mut reporter = TextReporter::new(BrokenPipe, true);
        scanner.scan(&mut reporter).await.unwrap();

        let err = reporter.finish().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
