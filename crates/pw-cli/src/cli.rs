//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use pw_core::ReportPeriod;

/// Wrapped-style viewing reports for a media server.
///
/// Reads exported watch history and summarizes who watched what, when and
/// how much over a calendar year or month.
#[derive(Debug, Parser)]
#[command(name = "pw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the wrapped report for a period.
    Report {
        /// Exported history (JSON rows or a `get_history` response).
        #[arg(long)]
        history: PathBuf,

        /// JSON object mapping item IDs to `{ "thumb", "genres" }`.
        #[arg(long)]
        metadata: Option<PathBuf>,

        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how many history records survive normalization.
    Normalize {
        /// Exported history (JSON rows or a `get_history` response).
        #[arg(long)]
        history: PathBuf,

        #[command(flatten)]
        period: PeriodArgs,
    },
}

/// Calendar period selection shared by subcommands.
#[derive(Debug, Clone, Copy, Args)]
pub struct PeriodArgs {
    /// Report year. Defaults to the current year.
    #[arg(long)]
    pub year: Option<i32>,

    /// Report a single month of `--year` (1-12).
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl PeriodArgs {
    /// Resolves the selection, falling back to the year containing `today`.
    pub fn resolve(self, today: NaiveDate) -> ReportPeriod {
        let year = self.year.unwrap_or_else(|| today.year());
        match self.month {
            Some(month) => ReportPeriod::Month(year, month),
            None => ReportPeriod::Year(year),
        }
    }
}
