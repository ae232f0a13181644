//! File-backed history and metadata inputs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pw_core::{
    HistorySource, MediaMetadata, RawWatchRecord, ReportWindow, SourceError, parse_history_json,
};

/// Exported watch history stored in a JSON file.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Returns every row in the file; the normalizer sorts out which ones fall
/// inside the window so that they can be counted.
impl HistorySource for HistoryFile {
    fn fetch(&self, _window: &ReportWindow) -> Result<Vec<RawWatchRecord>, SourceError> {
        let json = std::fs::read_to_string(&self.path)?;
        let records = parse_history_json(&json)?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "read history file");
        Ok(records)
    }
}

/// Loads a metadata file: a JSON object keyed by item ID.
pub fn load_metadata(path: &Path) -> Result<HashMap<String, MediaMetadata>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read metadata file {}", path.display()))?;
    let metadata: HashMap<String, MediaMetadata> = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse metadata file {}", path.display()))?;
    tracing::debug!(items = metadata.len(), "loaded metadata");
    Ok(metadata)
}
