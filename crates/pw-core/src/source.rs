//! Watch-history sources.
//!
//! The engine never fetches history itself; a [`HistorySource`] hands it raw
//! records. [`parse_history_json`] decodes the two shapes an exported history
//! usually comes in: a bare array of rows, or the `get_history` response
//! envelope (`{"response": {"data": {"data": [...]}}}`).

use serde::Deserialize;
use thiserror::Error;

use crate::event::RawWatchRecord;
use crate::period::ReportWindow;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies raw watch-history records for a report window.
///
/// Implementations may return records outside the window; the normalizer
/// filters them.
pub trait HistorySource {
    fn fetch(&self, window: &ReportWindow) -> Result<Vec<RawWatchRecord>, SourceError>;
}

impl HistorySource for [RawWatchRecord] {
    fn fetch(&self, window: &ReportWindow) -> Result<Vec<RawWatchRecord>, SourceError> {
        let start = window.start().timestamp();
        let end = window.end().timestamp();
        Ok(self
            .iter()
            .filter(|record| {
                record
                    .started
                    .is_none_or(|started| (start..end).contains(&started))
            })
            .cloned()
            .collect())
    }
}

impl HistorySource for Vec<RawWatchRecord> {
    fn fetch(&self, window: &ReportWindow) -> Result<Vec<RawWatchRecord>, SourceError> {
        self.as_slice().fetch(window)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryPayload {
    Rows(Vec<RawWatchRecord>),
    Envelope { response: HistoryResponse },
}

#[derive(Deserialize)]
struct HistoryResponse {
    data: HistoryPage,
}

#[derive(Deserialize)]
struct HistoryPage {
    data: Vec<RawWatchRecord>,
}

/// Decodes exported history JSON into raw records.
pub fn parse_history_json(json: &str) -> Result<Vec<RawWatchRecord>, SourceError> {
    let payload: HistoryPayload = serde_json::from_str(json)?;
    Ok(match payload {
        HistoryPayload::Rows(rows) => rows,
        HistoryPayload::Envelope { response } => response.data.data,
    })
}
