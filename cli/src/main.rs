// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # rollcheck
//!
//! Entry point for the `rollcheck` binary. Parses CLI arguments, loads the
//! configuration, initializes logging, connects to the archive and runs the
//! continuity scan.
//!
//! The binary supports four subcommands:
//!
//! - `scan`    — audit parent-hash continuity over the stored range
//! - `range`   — print the derived range and row count only
//! - `init`    — write a starter configuration file
//! - `version` — print build version information

mod cli;
mod logging;
mod output;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;

use rollcheck::config::CONFIG_TEMPLATE;
use rollcheck::{AuditConfig, ContinuityScanner, ScanConfig, SqlBlockStore, TableMapping};

use cli::{Commands, OutputFormat, RollcheckCli, ScanArgs, StoreArgs};
use output::{JsonReporter, TextReporter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = RollcheckCli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args).await,
        Commands::Range(args) => show_range(args).await,
        Commands::Init(args) => init_config(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Load the config file and layer CLI/environment values over it.
///
/// clap already resolves flag-over-environment, so anything set here wins
/// over the file.
fn load_config(args: &StoreArgs) -> Result<AuditConfig> {
    let mut config = AuditConfig::load_or_default(args.config.as_deref()).with_context(|| {
        match &args.config {
            Some(path) => format!("failed to load configuration from {}", path.display()),
            None => "failed to build default configuration".to_string(),
        }
    })?;

    if let Some(uri) = &args.database_url {
        config.store.uri = Some(uri.clone());
    }
    if let Some(table) = &args.table {
        config.store.table = TableMapping {
            name: table.clone(),
            ..config.store.table
        };
    }
    if let Some(format) = args.log_format {
        config.logger.format = format.into();
    }

    Ok(config)
}

fn apply_scan_overrides(config: &mut ScanConfig, args: &ScanArgs) {
    if let Some(policy) = args.gap_policy {
        config.gap_policy = policy.into();
    }
    if args.start.is_some() {
        config.start = args.start;
    }
    if args.end.is_some() {
        config.end = args.end;
    }
}

async fn connect(config: &AuditConfig) -> Result<SqlBlockStore> {
    config.validate().context("invalid configuration")?;
    SqlBlockStore::connect(&config.store)
        .await
        .context("failed to connect to the block store")
}

/// Runs the full continuity audit and writes diagnostics to stdout.
async fn run_scan(args: ScanArgs) -> Result<()> {
    let mut config = load_config(&args.store)?;
    apply_scan_overrides(&mut config.scan, &args);
    logging::init_logging(&config.logger.level, config.logger.format);

    tracing::info!(
        store = ?config.store,
        scan = ?config.scan,
        format = ?args.format,
        "starting rollcheck scan"
    );

    let store = connect(&config).await?;
    let scanner = ContinuityScanner::new(store, config.scan.clone());

    let stdout = io::stdout().lock();
    let outcome = match args.format {
        OutputFormat::Text => {
            let mut reporter = TextReporter::new(stdout, !args.no_progress);
            let summary = scanner.scan(&mut reporter).await;
            reporter
                .finish()
                .context("failed to write scan output")
                .and(summary.context("continuity scan failed"))
        }
        OutputFormat::Json => {
            let mut reporter = JsonReporter::new(stdout);
            let summary = scanner.scan(&mut reporter).await;
            reporter
                .finish()
                .context("failed to write scan output")
                .and(summary.context("continuity scan failed"))
        }
    };

    scanner.store().close().await;

    let summary = outcome?;
    tracing::info!(
        positions = summary.positions,
        breaks = summary.breaks,
        gaps = summary.gaps,
        started_at = %summary.started_at,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "rollcheck scan complete"
    );
    Ok(())
}

/// Prints the derived range without scanning.
async fn show_range(args: StoreArgs) -> Result<()> {
    let config = load_config(&args)?;
    logging::init_logging(&config.logger.level, config.logger.format);

    let store = connect(&config).await?;
    let scanner = ContinuityScanner::new(store, config.scan.clone());
    let plan = scanner.plan().await;
    scanner.store().close().await;

    let plan = plan.context("failed to read block store statistics")?;
    println!("{}", output::start_line(&plan));
    Ok(())
}

/// Writes the starter configuration file.
fn init_config(args: cli::InitArgs) -> Result<()> {
    let path = &args.output;
    if path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write configuration to {}", path.display()))?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Configuration written to {}", path.display())?;
    writeln!(
        stdout,
        "Set store.uri or {} before running `rollcheck scan`.",
        rollcheck::config::DATABASE_URL_ENV
    )?;
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("rollcheck {}", env!("CARGO_PKG_VERSION"));
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcheck::GapPolicy;

    fn parse_scan(argv: &[&str]) -> ScanArgs {
        let mut full = vec!["rollcheck", "scan"];
        full.extend_from_slice(argv);
        match RollcheckCli::try_parse_from(full).unwrap().command {
            Commands::Scan(args) => args,
            other => panic!("expected scan, got {other:?}"),
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcheck.toml");
        std::fs::write(
            &path,
            r#"
            [store]
            uri = "postgres://auditor@file-host/archive"

            [store.table]
            name = "from_file"
            hash_column = "hash"

            [scan]
            gap_policy = "skip"
            start = 5
            "#,
        )
        .unwrap();

        let args = parse_scan(&[
            "--config",
            path.to_str().unwrap(),
            "--database-url",
            "sqlite::memory:",
            "--table",
            "from_flag",
            "--gap-policy",
            "report",
            "--end",
            "50",
            "--log-format",
            "json",
        ]);
        let mut config = load_config(&args.store).unwrap();
        apply_scan_overrides(&mut config.scan, &args);

        assert_eq!(config.store.uri.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.store.table.name, "from_flag");
        // Column names from the file survive a table override.
        assert_eq!(config.store.table.hash_column, "hash");
        assert_eq!(config.scan.gap_policy, GapPolicy::Report);
        assert_eq!(config.scan.start, Some(5));
        assert_eq!(config.scan.end, Some(50));
        assert_eq!(config.logger.format, rollcheck::LogFormat::Json);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = parse_scan(&["--config", "/nonexistent/rollcheck.toml"]);
        let err = load_config(&args.store).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load configuration"));
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcheck.toml");
        std::fs::write(&path, "# keep me").unwrap();

        let err = init_config(cli::InitArgs {
            output: path.clone(),
            force: false,
        })
        .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# keep me");

        init_config(cli::InitArgs {
            output: path.clone(),
            force: true,
        })
        .unwrap();
        let written = AuditConfig::load(&path).unwrap();
        assert_eq!(written, AuditConfig::default());
    }
}
