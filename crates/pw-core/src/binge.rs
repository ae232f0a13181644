//! Binge session detection.
//!
//! # Algorithm Summary
//!
//! 1. Walk a user's events in chronological order, cutting a new session when
//!    the next play starts more than the idle threshold after the latest stop
//!    seen so far in the current session (overlapping plays have no gap).
//! 2. Within each session, group plays by media kind. Every kind with at least
//!    the minimum number of plays is reported as its own binge, so a run that
//!    mixes movies and episodes is judged per kind.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::event::WatchEvent;
use crate::media::MediaKind;

/// A qualifying run of same-kind plays inside one viewing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BingeSession {
    pub media_kind: MediaKind,
    /// Start of the first play of this kind in the session.
    pub started_at: DateTime<Utc>,
    /// Latest stop among this kind's plays in the session.
    pub ended_at: DateTime<Utc>,
    pub item_count: usize,
    pub watch_seconds: u64,
    /// Show with the most plays (episodes and tracks only); ties go to the
    /// show watched first.
    pub dominant_show: Option<String>,
}

/// Finds binge sessions in `events`, which must be sorted chronologically.
///
/// Results are ordered by start time, then media kind.
pub fn detect_binges(
    events: &[WatchEvent],
    idle_threshold: Duration,
    min_items: usize,
) -> Vec<BingeSession> {
    let mut binges = Vec::new();
    let mut session_start = 0;
    let mut session_end: Option<DateTime<Utc>> = None;

    for (idx, event) in events.iter().enumerate() {
        if let Some(end) = session_end {
            if event.started_at - end > idle_threshold {
                collect_binges(&events[session_start..idx], min_items, &mut binges);
                session_start = idx;
                session_end = None;
            }
        }
        session_end = Some(session_end.map_or(event.stopped_at, |end| end.max(event.stopped_at)));
    }
    if session_end.is_some() {
        collect_binges(&events[session_start..], min_items, &mut binges);
    }

    binges.sort_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.media_kind.cmp(&b.media_kind))
    });
    binges
}

fn collect_binges(session: &[WatchEvent], min_items: usize, binges: &mut Vec<BingeSession>) {
    let mut by_kind: BTreeMap<MediaKind, Vec<&WatchEvent>> = BTreeMap::new();
    for event in session {
        by_kind.entry(event.media_kind).or_default().push(event);
    }

    for (media_kind, plays) in by_kind {
        if plays.len() < min_items {
            continue;
        }
        let Some(first) = plays.first() else {
            continue;
        };
        let ended_at = plays
            .iter()
            .map(|event| event.stopped_at)
            .max()
            .unwrap_or(first.stopped_at);

        binges.push(BingeSession {
            media_kind,
            started_at: first.started_at,
            ended_at,
            item_count: plays.len(),
            watch_seconds: plays.iter().fold(0u64, |total, event| {
                total.saturating_add(event.duration_watched_seconds)
            }),
            dominant_show: if media_kind.rolls_up() {
                dominant_show(&plays)
            } else {
                None
            },
        });
    }
}

fn dominant_show(plays: &[&WatchEvent]) -> Option<String> {
    // (show id, show title, plays), in order of first appearance
    let mut tallies: Vec<(&str, &str, usize)> = Vec::new();
    for event in plays {
        let (show_id, show_title) = event.library_item();
        match tallies.iter_mut().find(|(id, _, _)| *id == show_id.as_str()) {
            Some(tally) => tally.2 += 1,
            None => tallies.push((show_id.as_str(), show_title, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (_, title, count) in tallies {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((title, count));
        }
    }
    best.map(|(title, _)| title.to_string())
}
