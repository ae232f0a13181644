//! Normalize command: validate history without building a report.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use pw_core::{HistorySource, MediaKind, Normalized, ReportPeriod, ReportWindow, normalize};
use serde::Serialize;

use crate::Config;
use crate::history::HistoryFile;

/// How the raw records of a run were classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub kept: usize,
    pub skipped: usize,
    pub untracked: usize,
    pub outside_window: usize,
}

impl From<&Normalized> for RecordCounts {
    fn from(normalized: &Normalized) -> Self {
        Self {
            kept: normalized.kept(),
            skipped: normalized.skipped,
            untracked: normalized.untracked,
            outside_window: normalized.outside_window,
        }
    }
}

/// Fetches history for `window` and normalizes it.
pub fn load_events<S>(
    source: &S,
    window: &ReportWindow,
    tracked_kinds: &[MediaKind],
) -> Result<Normalized>
where
    S: HistorySource + ?Sized,
{
    let records = source
        .fetch(window)
        .context("failed to read watch history")?;
    Ok(normalize(records, tracked_kinds, window))
}

pub fn format_counts(period_label: &str, counts: RecordCounts) -> String {
    format!(
        "{period_label}: {} kept, {} skipped, {} untracked, {} outside period",
        counts.kept, counts.skipped, counts.untracked, counts.outside_window
    )
}

pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    history: &Path,
    period: ReportPeriod,
) -> Result<()> {
    let window = period.window()?;
    let normalized = load_events(&HistoryFile::new(history), &window, &config.tracked_kinds)?;
    writeln!(
        writer,
        "{}",
        format_counts(&period.label(), RecordCounts::from(&normalized))
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // 2024-03-01 20:00 UTC, 2023-06-01 20:00 UTC
    const HISTORY: &str = r#"[
        {"user_id": 1, "media_type": "movie", "rating_key": 10, "started": 1709323200, "stopped": 1709330400},
        {"user_id": 1, "media_type": "movie", "rating_key": 11, "started": 1685649600, "stopped": 1685656800},
        {"user_id": 2, "media_type": "track", "rating_key": 12, "started": 1709323200, "stopped": 1709323400},
        {"media_type": "episode", "rating_key": 13, "started": 1709323200, "stopped": 1709325600}
    ]"#;

    #[test]
    fn test_counts_every_classification() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        std::fs::write(&path, HISTORY).unwrap();

        let mut output = Vec::new();
        run(&mut output, &Config::default(), &path, ReportPeriod::Year(2024)).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "2024: 1 kept, 1 skipped, 1 untracked, 1 outside period\n"
        );
    }

    #[test]
    fn test_tracked_kinds_come_from_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        std::fs::write(&path, HISTORY).unwrap();

        let config = Config {
            tracked_kinds: vec![MediaKind::Movie, MediaKind::Episode, MediaKind::Track],
            ..Config::default()
        };
        let window = ReportPeriod::Month(2024, 3).window().unwrap();
        let normalized =
            load_events(&HistoryFile::new(&path), &window, &config.tracked_kinds).unwrap();
        assert_eq!(
            RecordCounts::from(&normalized),
            RecordCounts {
                kept: 2,
                skipped: 1,
                untracked: 0,
                outside_window: 1,
            }
        );
    }

    #[test]
    fn test_missing_file_has_context() {
        let temp = TempDir::new().unwrap();
        let err = run(
            &mut Vec::new(),
            &Config::default(),
            &temp.path().join("absent.json"),
            ReportPeriod::Year(2024),
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to read watch history"));
    }
}
