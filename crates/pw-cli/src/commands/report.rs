//! Report command for generating wrapped reports.
//!
//! This module implements `pw report` for a calendar year or month, with
//! human-readable and JSON output.

use std::fmt::{self, Write as _};
use std::io;
use std::path::Path;

use anyhow::Result;
use pw_core::summary::{PlatformShare, UserSummary};
use pw_core::{
    HistorySource, MetadataLookup, NoMetadata, ReportPeriod, ServerSummary, apply_metadata,
    build_report,
};
use serde::Serialize;

use super::normalize::{RecordCounts, load_events};
use crate::Config;
use crate::history::{HistoryFile, load_metadata};

/// Computed report data.
#[derive(Debug, Serialize)]
pub struct ReportData {
    pub period: String,
    pub records: RecordCounts,
    /// Events that gained genres or a poster from the metadata file.
    pub enriched: usize,
    pub report: ServerSummary,
}

/// Runs the full pipeline: fetch, normalize, enrich, aggregate.
pub fn generate_report_data<S, M>(
    source: &S,
    metadata: &M,
    period: ReportPeriod,
    config: &Config,
) -> Result<ReportData>
where
    S: HistorySource + ?Sized,
    M: MetadataLookup + ?Sized,
{
    let window = period.window()?;
    let normalized = load_events(source, &window, &config.tracked_kinds)?;
    let records = RecordCounts::from(&normalized);

    let mut events = normalized.events;
    let enriched = apply_metadata(&mut events, metadata);
    let report = build_report(&events, &window, &config.report_config())?;

    Ok(ReportData {
        period: period.label(),
        records,
        enriched,
        report,
    })
}

// ========== Formatting ==========

/// Formats seconds as "Xh Ym" when at least an hour, otherwise "Xm".
pub fn format_duration(seconds: u64) -> String {
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn format_hour(hour: Option<u8>) -> String {
    hour.map_or_else(|| "-".to_string(), |hour| format!("{hour:02}:00"))
}

fn plural<N>(count: N, noun: &str) -> String
where
    N: fmt::Display + PartialEq + From<u8>,
{
    if count == N::from(1) {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn format_platforms(platforms: &[PlatformShare]) -> String {
    if platforms.is_empty() {
        return "-".to_string();
    }
    platforms
        .iter()
        .take(3)
        .map(|share| format!("{} ({})", share.platform, format_duration(share.watch_seconds)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let report = &data.report;
    let records = &data.records;

    writeln!(out, "WRAPPED: {}", data.period)?;
    writeln!(
        out,
        "Records: {} kept, {} skipped, {} untracked, {} outside period",
        records.kept, records.skipped, records.untracked, records.outside_window
    )?;

    if report.users.is_empty() {
        writeln!(out)?;
        writeln!(out, "No plays recorded in this period.")?;
        return Ok(out);
    }

    writeln!(out)?;
    writeln!(out, "SERVER")?;
    writeln!(out, "──────")?;
    writeln!(out, "Watch time:  {}", format_duration(report.total_watch_seconds))?;
    writeln!(out, "Plays:       {}", report.total_items_watched)?;
    writeln!(out, "Users:       {}", report.unique_users)?;
    writeln!(out, "Movies:      {}", format_duration(report.movie_watch_seconds))?;
    writeln!(out, "Episodes:    {}", format_duration(report.episode_watch_seconds))?;
    writeln!(out, "Peak hour:   {}", format_hour(report.peak_hours.peak_hour))?;
    writeln!(out, "Platforms:   {}", format_platforms(&report.platform_breakdown))?;

    writeln!(out)?;
    writeln!(out, "USERS")?;
    writeln!(out, "─────")?;
    for user in &report.users {
        let rank = user
            .rank
            .map_or_else(|| "-".to_string(), |rank| format!("#{rank}"));
        let line = format!(
            "{rank:<4}{:<16}{:>8}  {:<9}{}",
            user.display_name,
            format_duration(user.total_watch_seconds),
            plural(user.item_count, "play"),
            user.callout.unwrap_or_default()
        );
        writeln!(out, "{}", line.trim_end())?;
    }

    for user in &report.users {
        writeln!(out)?;
        write_user(&mut out, user)?;
    }

    Ok(out)
}

fn write_user(out: &mut String, user: &UserSummary) -> fmt::Result {
    let top_items = user
        .top_items
        .iter()
        .take(3)
        .map(|item| format!("{} ({})", item.title, format_duration(item.watch_seconds)))
        .collect::<Vec<_>>()
        .join(", ");
    let binges = match user.binge_sessions.iter().max_by_key(|binge| binge.item_count) {
        Some(longest) => format!(
            "{} (longest {})",
            user.binge_sessions.len(),
            plural(longest.item_count, "play")
        ),
        None => "0".to_string(),
    };

    writeln!(out, "{}", user.display_name)?;
    writeln!(out, "  Top items:     {top_items}")?;
    writeln!(
        out,
        "  Platform:      {}",
        user.platform_breakdown
            .first()
            .map_or("-", |share| share.platform.as_str())
    )?;
    writeln!(out, "  Peak hour:     {}", format_hour(user.peak_hours.peak_hour))?;
    if let Some(genre) = user.genre_breakdown.first() {
        writeln!(out, "  Top genre:     {}", genre.genre)?;
    }
    writeln!(out, "  Binges:        {binges}")?;
    writeln!(
        out,
        "  Streak:        longest {}, current {}",
        plural(user.streak.longest_streak, "day"),
        plural(user.streak.current_streak, "day")
    )?;
    writeln!(
        out,
        "  First watch:   {} ({})",
        user.first_watch.title,
        user.first_watch.started_at.format("%Y-%m-%d")
    )?;
    writeln!(out, "  Unique titles: {}", user.unique_title_count)?;
    Ok(())
}

/// Formats the report as pretty JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn run<W: io::Write>(
    writer: &mut W,
    config: &Config,
    history: &Path,
    metadata: Option<&Path>,
    period: ReportPeriod,
    json: bool,
) -> Result<()> {
    let source = HistoryFile::new(history);
    let data = match metadata {
        Some(path) => generate_report_data(&source, &load_metadata(path)?, period, config)?,
        None => generate_report_data(&source, &NoMetadata, period, config)?,
    };

    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data)?)?;
    }
    Ok(())
}
