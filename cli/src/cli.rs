//! # CLI Interface
//!
//! Defines the command-line argument structure for `rollcheck` using
//! `clap` derive. Supports four subcommands: `scan`, `range`, `init`,
//! and `version`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use rollcheck::{GapPolicy, LogFormat};

/// Blockchain archive continuity auditor.
///
/// Walks a stored block table from the newest block down and reports every
/// block whose parent hash does not match the hash stored one number below.
#[derive(Parser, Debug)]
#[command(
    name = "rollcheck",
    about = "Blockchain archive continuity auditor",
    version,
    propagate_version = true
)]
pub struct RollcheckCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the rollcheck binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit parent-hash continuity over the stored range.
    Scan(ScanArgs),
    /// Print the derived range and row count without scanning.
    Range(StoreArgs),
    /// Write a starter configuration file.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
}

/// Where to find the archive. Shared by `scan` and `range`.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to the configuration file (TOML).
    ///
    /// When omitted, built-in defaults are used.
    #[arg(long, short = 'c', env = "ROLLCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URI, e.g. `postgres://auditor@localhost:5432/archive`.
    ///
    /// Overrides `store.uri` from the configuration file.
    #[arg(long, env = "ROLLCHECK_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Name of the block table, optionally schema-qualified.
    #[arg(long)]
    pub table: Option<String>,

    /// Log output format on stderr.
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormatArg>,
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// What to do with positions whose block or predecessor is absent.
    #[arg(long, value_enum)]
    pub gap_policy: Option<GapPolicyArg>,

    /// Lowest block number to include.
    #[arg(long)]
    pub start: Option<u64>,

    /// Highest block number to include.
    #[arg(long)]
    pub end: Option<u64>,

    /// Diagnostic output format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Do not print the in-place progress counter.
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Where to write the configuration file.
    #[arg(long, short = 'o', default_value = "rollcheck.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Diagnostic stream format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable lines with an in-place progress counter.
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapPolicyArg {
    Skip,
    Report,
}

impl From<GapPolicyArg> for GapPolicy {
    fn from(arg: GapPolicyArg) -> Self {
        match arg {
            GapPolicyArg::Skip => GapPolicy::Skip,
            GapPolicyArg::Report => GapPolicy::Report,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        RollcheckCli::command().debug_assert();
    }

    #[test]
    fn parses_scan_flags() {
        let cli = RollcheckCli::try_parse_from([
            "rollcheck",
            "scan",
            "--database-url",
            "sqlite::memory:",
            "--table",
            "archive.block",
            "--gap-policy",
            "report",
            "--start",
            "100",
            "--end",
            "200",
            "--format",
            "json",
            "--no-progress",
        ])
        .unwrap();

        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.store.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(args.store.table.as_deref(), Some("archive.block"));
        assert_eq!(args.gap_policy, Some(GapPolicyArg::Report));
        assert_eq!(args.start, Some(100));
        assert_eq!(args.end, Some(200));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.no_progress);
    }

    #[test]
    fn scan_defaults_to_text() {
        let cli = RollcheckCli::try_parse_from(["rollcheck", "scan"]).unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.gap_policy.is_none());
        assert!(!args.no_progress);
    }

    #[test]
    fn rejects_unknown_gap_policy() {
        let result =
            RollcheckCli::try_parse_from(["rollcheck", "scan", "--gap-policy", "ignore"]);
        assert!(result.is_err());
    }

    #[test]
    fn value_enums_convert() {
        assert_eq!(GapPolicy::from(GapPolicyArg::Report), GapPolicy::Report);
        assert_eq!(LogFormat::from(LogFormatArg::Json), LogFormat::Json);
    }
}
