//! Command-line argument definitions for the ping processor
//!
//! This module defines the complete CLI interface using the clap derive
//! API. Each dataset kind gets its own subcommand with the options that
//! matter for it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the FxOS ping processor
///
/// Processes telemetry ping dumps (FTU activations and AU app-usage
/// sessions) into deduplicated, aggregated CSV datasets for dashboards.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ping-processor",
    version,
    about = "Process FxOS telemetry ping dumps into dashboard-ready CSV datasets",
    long_about = "A batch tool that parses raw telemetry submission dumps, normalizes noisy \
                  device/operator/OS/country fields against reference tables, reconciles \
                  per-device ping sessions, and writes deduplicated, aggregated CSV tables \
                  for the activation and app-usage dashboards."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands for the ping processor
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Process FTU (first-time-use) activation pings
    Ftu(FtuArgs),
    /// Process AU (app-usage) session pings
    Appusage(AppusageArgs),
}

/// Options shared by both dataset kinds
#[derive(Debug, Clone, Parser)]
pub struct CommonArgs {
    /// Input path: one .ndjson envelope file, or a directory searched
    /// recursively for them
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: PathBuf,

    /// Directory containing the reference tables
    /// (countrycodes.json, mobile-codes.json, language-codes.json,
    /// ftu-fields.json). Defaults to the user data directory.
    #[arg(long = "lookup-dir", value_name = "PATH")]
    pub lookup_dir: Option<PathBuf>,

    /// Output directory for the generated CSV tables (created if missing)
    #[arg(short = 'o', long = "output", value_name = "PATH", default_value = "output")]
    pub output: PathBuf,

    /// Number of envelope files shaped concurrently
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Disable progress bars
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl CommonArgs {
    /// Resolve the lookup directory, defaulting to the user data directory
    pub fn lookup_dir(&self) -> PathBuf {
        self.lookup_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ping-processor")
                .join("lookup")
        })
    }
}

/// Arguments for the FTU command
#[derive(Debug, Clone, Parser)]
pub struct FtuArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Also emit "All" roll-up rows over (os, country, device, operator)
    /// into the dashboard dataset
    #[arg(long = "rollup")]
    pub rollup: bool,

    /// Days of history included in the dashboard dataset
    #[arg(long = "dashboard-window-days", value_name = "DAYS")]
    pub dashboard_window_days: Option<i64>,

    /// Days of history included in the dump dataset
    #[arg(long = "dump-window-days", value_name = "DAYS")]
    pub dump_window_days: Option<i64>,
}

/// Arguments for the AU command
#[derive(Debug, Clone, Parser)]
pub struct AppusageArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Overlap tolerance between consecutive pings, in milliseconds
    #[arg(long = "overlap-tolerance-ms", value_name = "MS")]
    pub overlap_tolerance_ms: Option<i64>,

    /// Resolve submission-date-only duplicates to the latest submission
    /// instead of the earliest
    #[arg(long = "keep-latest-submission")]
    pub keep_latest_submission: bool,

    /// Regex identifying dogfood device IDs
    #[arg(long = "dogfood-pattern", value_name = "REGEX")]
    pub dogfood_pattern: Option<String>,
}
