//! Raw history records and their normalization into watch events.
//!
//! Records arrive in the shape of a media-server activity log (one row per
//! playback, every field optional). [`normalize`] turns them into typed
//! [`WatchEvent`]s, keeping only tracked media kinds inside the report window.
//! Malformed rows are skipped and counted, never fatal.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::media::MediaKind;
use crate::period::ReportWindow;
use crate::types::{ItemId, UserId};

/// Platform label used when a record names no playback client.
pub const UNKNOWN_PLATFORM: &str = "Unknown";

/// One row of a media server's watch history, as delivered by the source.
///
/// Timestamps are Unix seconds. Identifiers may be numbers or strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWatchRecord {
    #[serde(deserialize_with = "loose_id")]
    pub user_id: Option<String>,
    pub friendly_name: Option<String>,
    pub user: Option<String>,
    pub media_type: Option<String>,
    #[serde(deserialize_with = "loose_id")]
    pub rating_key: Option<String>,
    #[serde(deserialize_with = "loose_id")]
    pub grandparent_rating_key: Option<String>,
    pub title: Option<String>,
    pub full_title: Option<String>,
    pub grandparent_title: Option<String>,
    pub platform: Option<String>,
    pub player: Option<String>,
    pub started: Option<i64>,
    pub stopped: Option<i64>,
    /// Seconds actually played.
    pub play_duration: Option<i64>,
    /// Seconds spent paused, used when `play_duration` is missing.
    pub paused_counter: Option<i64>,
    /// Runtime of the media itself, in seconds.
    pub media_duration: Option<i64>,
    pub genres: Option<Vec<String>>,
    pub thumb: Option<String>,
}

/// Identifiers show up as `42`, `"42"`, `""` or `null` depending on the source.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Number(i64),
    Text(String),
}

fn loose_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseId>::deserialize(deserializer)?;
    Ok(value.and_then(|id| match id {
        LooseId::Number(n) => Some(n.to_string()),
        LooseId::Text(s) if s.trim().is_empty() => None,
        LooseId::Text(s) => Some(s),
    }))
}

/// A validated playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchEvent {
    pub user_id: UserId,
    pub user_display_name: String,
    pub media_kind: MediaKind,
    /// The played item's own identifier (an episode keeps its own id).
    pub item_id: ItemId,
    pub title: String,
    /// Parent show (episodes) or artist (tracks).
    pub show_id: Option<ItemId>,
    pub show_title: Option<String>,
    pub genres: Vec<String>,
    pub poster: Option<String>,
    pub platform: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub duration_watched_seconds: u64,
    pub media_duration_seconds: Option<u64>,
}

impl WatchEvent {
    /// The roll-up key and title used for top items and metadata: the parent
    /// show for episodes and tracks, the item itself otherwise.
    pub fn library_item(&self) -> (&ItemId, &str) {
        match &self.show_id {
            Some(show_id) if self.media_kind.rolls_up() => (
                show_id,
                self.show_title.as_deref().unwrap_or(&self.title),
            ),
            _ => (&self.item_id, &self.title),
        }
    }

    /// Fraction of the media that was watched, when the runtime is known.
    ///
    /// Values above 1.0 are possible (rewatching parts of an item).
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_complete(&self) -> Option<f64> {
        match self.media_duration_seconds {
            Some(media) if media > 0 => {
                Some(self.duration_watched_seconds as f64 / media as f64)
            }
            _ => None,
        }
    }

    /// Calendar day the playback started on.
    pub fn watch_day(&self) -> NaiveDate {
        self.started_at.date_naive()
    }

    /// Total order used by every per-user computation.
    ///
    /// Compares every field, so two events are `Equal` only when they are
    /// identical and sorting never depends on input order.
    pub(crate) fn chronological(a: &Self, b: &Self) -> Ordering {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.stopped_at.cmp(&b.stopped_at))
            .then_with(|| a.item_id.cmp(&b.item_id))
            .then_with(|| a.platform.cmp(&b.platform))
            .then_with(|| a.duration_watched_seconds.cmp(&b.duration_watched_seconds))
            .then_with(|| a.media_kind.cmp(&b.media_kind))
            .then_with(|| a.user_id.cmp(&b.user_id))
            .then_with(|| a.user_display_name.cmp(&b.user_display_name))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.show_id.cmp(&b.show_id))
            .then_with(|| a.show_title.cmp(&b.show_title))
            .then_with(|| a.genres.cmp(&b.genres))
            .then_with(|| a.poster.cmp(&b.poster))
            .then_with(|| a.media_duration_seconds.cmp(&b.media_duration_seconds))
    }
}

/// Why a record could not become a [`WatchEvent`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
enum MalformedRecord {
    #[error("missing user id")]
    MissingUser,
    #[error("missing item id")]
    MissingItem,
    #[error("missing media type")]
    MissingMediaType,
    #[error("missing {0} timestamp")]
    MissingTimestamp(&'static str),
    #[error("{field} timestamp out of range: {value}")]
    TimestampOutOfRange { field: &'static str, value: i64 },
    #[error("stopped before it started")]
    StoppedBeforeStarted,
    #[error("negative {field}: {value}")]
    NegativeDuration { field: &'static str, value: i64 },
    #[error("play_duration {played}s exceeds the {elapsed}s between start and stop")]
    PlayedLongerThanElapsed { played: u64, elapsed: u64 },
}

enum Rejection {
    Untracked,
    Malformed(MalformedRecord),
}

impl From<MalformedRecord> for Rejection {
    fn from(reason: MalformedRecord) -> Self {
        Self::Malformed(reason)
    }
}

/// Result of normalizing a batch of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Qualifying events, in input order.
    pub events: Vec<WatchEvent>,
    /// Malformed records that were dropped.
    pub skipped: usize,
    /// Records of a media kind that is not tracked.
    pub untracked: usize,
    /// Well-formed records that started outside the window.
    pub outside_window: usize,
}

impl Normalized {
    pub fn kept(&self) -> usize {
        self.events.len()
    }
}

/// Validates raw records into watch events.
///
/// Keeps records whose media kind is in `tracked_kinds` and whose start lies in
/// `window` (start inclusive, end exclusive). Repeated plays are kept as
/// separate events.
pub fn normalize<I>(records: I, tracked_kinds: &[MediaKind], window: &ReportWindow) -> Normalized
where
    I: IntoIterator<Item = RawWatchRecord>,
{
    let mut normalized = Normalized::default();

    for record in records {
        match to_event(record, tracked_kinds) {
            Ok(event) if window.contains(event.started_at) => normalized.events.push(event),
            Ok(_) => normalized.outside_window += 1,
            Err(Rejection::Untracked) => normalized.untracked += 1,
            Err(Rejection::Malformed(reason)) => {
                tracing::debug!(%reason, "skipping malformed history record");
                normalized.skipped += 1;
            }
        }
    }

    tracing::debug!(
        kept = normalized.kept(),
        skipped = normalized.skipped,
        untracked = normalized.untracked,
        outside_window = normalized.outside_window,
        "normalized history records"
    );
    normalized
}

fn to_event(record: RawWatchRecord, tracked_kinds: &[MediaKind]) -> Result<WatchEvent, Rejection> {
    let media_type = non_empty(record.media_type).ok_or(MalformedRecord::MissingMediaType)?;
    let media_kind = match media_type.parse::<MediaKind>() {
        Ok(kind) if tracked_kinds.contains(&kind) => kind,
        _ => return Err(Rejection::Untracked),
    };

    let user_id = record
        .user_id
        .and_then(|id| UserId::new(id).ok())
        .ok_or(MalformedRecord::MissingUser)?;
    let item_id = record
        .rating_key
        .and_then(|id| ItemId::new(id).ok())
        .ok_or(MalformedRecord::MissingItem)?;

    let started = record.started.ok_or(MalformedRecord::MissingTimestamp("start"))?;
    let stopped = record.stopped.ok_or(MalformedRecord::MissingTimestamp("stop"))?;
    let started_at = timestamp("start", started)?;
    let stopped_at = timestamp("stop", stopped)?;
    if stopped_at < started_at {
        return Err(MalformedRecord::StoppedBeforeStarted.into());
    }

    let elapsed = non_negative("elapsed time", stopped - started)?;
    let duration_watched_seconds = match record.play_duration {
        Some(played) => {
            let played = non_negative("play_duration", played)?;
            if played > elapsed {
                return Err(MalformedRecord::PlayedLongerThanElapsed { played, elapsed }.into());
            }
            played
        }
        None => {
            let paused = non_negative("paused_counter", record.paused_counter.unwrap_or(0))?;
            elapsed.saturating_sub(paused)
        }
    };
    let media_duration_seconds = record
        .media_duration
        .map(|runtime| non_negative("media_duration", runtime))
        .transpose()?;

    let user_display_name = non_empty(record.friendly_name)
        .or_else(|| non_empty(record.user))
        .unwrap_or_else(|| user_id.to_string());
    let title = non_empty(record.title)
        .or_else(|| non_empty(record.full_title))
        .unwrap_or_else(|| "Unknown".to_string());
    let platform = non_empty(record.platform)
        .or_else(|| non_empty(record.player))
        .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string());
    let genres = record
        .genres
        .unwrap_or_default()
        .into_iter()
        .filter_map(|genre| non_empty(Some(genre)))
        .collect();

    Ok(WatchEvent {
        user_id,
        user_display_name,
        media_kind,
        item_id,
        title,
        show_id: record
            .grandparent_rating_key
            .and_then(|id| ItemId::new(id).ok()),
        show_title: non_empty(record.grandparent_title),
        genres,
        poster: non_empty(record.thumb),
        platform,
        started_at,
        stopped_at,
        duration_watched_seconds,
        media_duration_seconds,
    })
}

fn timestamp(field: &'static str, value: i64) -> Result<DateTime<Utc>, MalformedRecord> {
    DateTime::from_timestamp(value, 0).ok_or(MalformedRecord::TimestampOutOfRange { field, value })
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, MalformedRecord> {
    u64::try_from(value).map_err(|_| MalformedRecord::NegativeDuration { field, value })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
