//! Report result types consumed by renderers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::binge::BingeSession;
use crate::media::MediaKind;
use crate::streak::StreakStats;
use crate::types::{ItemId, UserId};

/// A ranked library item (a movie, or a show with its episodes rolled up).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopItem {
    pub item_id: ItemId,
    pub title: String,
    pub media_kind: MediaKind,
    pub watch_seconds: u64,
    pub play_count: u32,
    /// Sum of per-play completion (capped at 1.0 per play) over plays with a
    /// known runtime.
    pub completed_plays: f64,
    pub poster: Option<String>,
    pub last_watched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformShare {
    pub platform: String,
    pub watch_seconds: u64,
    /// Percent of the breakdown's watch time, to one decimal.
    pub percentage: f64,
}

/// `part` as a percentage of `total`, rounded to one decimal; 0 when `total` is 0.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreShare {
    pub genre: String,
    pub plays: u32,
    pub watch_seconds: u64,
}

/// Plays per broad part of the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayParts {
    /// 00:00-06:00
    pub night: u32,
    /// 06:00-12:00
    pub morning: u32,
    /// 12:00-18:00
    pub afternoon: u32,
    /// 18:00-24:00
    pub evening: u32,
}

/// [`DayParts`] as percentages of all plays, to one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayPartShares {
    pub night: f64,
    pub morning: f64,
    pub afternoon: f64,
    pub evening: f64,
}

impl DayParts {
    pub fn total(&self) -> u32 {
        self.night + self.morning + self.afternoon + self.evening
    }

    pub fn shares(&self) -> DayPartShares {
        let total = u64::from(self.total());
        let share = |plays: u32| percentage(u64::from(plays), total);
        DayPartShares {
            night: share(self.night),
            morning: share(self.morning),
            afternoon: share(self.afternoon),
            evening: share(self.evening),
        }
    }
}

/// Plays bucketed by the hour they started in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakHours {
    pub hourly: [u32; 24],
    /// Busiest hour (earliest on ties); `None` when there are no plays.
    pub peak_hour: Option<u8>,
    pub day_parts: DayParts,
    pub day_part_shares: DayPartShares,
}

impl Default for PeakHours {
    fn default() -> Self {
        Self::from_hourly([0; 24])
    }
}

impl PeakHours {
    pub fn from_hourly(hourly: [u32; 24]) -> Self {
        let mut peak: Option<(u8, u32)> = None;
        for (hour, &count) in (0u8..).zip(hourly.iter()) {
            if count > 0 && peak.is_none_or(|(_, top)| count > top) {
                peak = Some((hour, count));
            }
        }

        let span = |from: usize, to: usize| -> u32 { hourly[from..to].iter().sum() };
        let day_parts = DayParts {
            night: span(0, 6),
            morning: span(6, 12),
            afternoon: span(12, 18),
            evening: span(18, 24),
        };
        Self {
            hourly,
            peak_hour: peak.map(|(hour, _)| hour),
            day_parts,
            day_part_shares: day_parts.shares(),
        }
    }

    /// Adds another histogram bucket by bucket.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut hourly = self.hourly;
        for (bucket, extra) in hourly.iter_mut().zip(other.hourly) {
            *bucket += extra;
        }
        Self::from_hourly(hourly)
    }

    pub fn total(&self) -> u32 {
        self.hourly.iter().sum()
    }
}

/// A single notable play (the first or last of the period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchMoment {
    pub title: String,
    pub media_kind: MediaKind,
    pub started_at: DateTime<Utc>,
}

/// Viewing statistics for one user over the report window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub display_name: String,
    /// Competition rank by watch time; set by server-wide aggregation.
    pub rank: Option<u32>,
    /// Label for the rank ("Server Champion" for #1), shared by tied users.
    pub callout: Option<&'static str>,
    pub total_watch_seconds: u64,
    /// Qualifying plays.
    pub item_count: u32,
    pub movie_count: u32,
    pub episode_count: u32,
    pub movie_watch_seconds: u64,
    pub episode_watch_seconds: u64,
    /// Sum of per-play completion (capped at 1.0 per play).
    pub completed_plays: f64,
    pub top_items: Vec<TopItem>,
    pub platform_breakdown: Vec<PlatformShare>,
    pub peak_hours: PeakHours,
    pub binge_sessions: Vec<BingeSession>,
    pub streak: StreakStats,
    pub genre_breakdown: Vec<GenreShare>,
    pub first_watch: WatchMoment,
    pub last_watch: WatchMoment,
    /// Titles nobody else watched in the window, alphabetical and truncated.
    pub unique_titles: Vec<String>,
    pub unique_title_count: u32,
}

/// How [`UserSummary::rank`] was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankPolicy {
    /// Standard competition ranking ("1224"): tied users share a rank and the
    /// following rank skips the tie. Tied users are listed by user id.
    Competition,
}

/// Server-wide statistics for one report run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_watch_seconds: u64,
    pub total_items_watched: u32,
    pub movie_watch_seconds: u64,
    pub episode_watch_seconds: u64,
    pub unique_users: u32,
    pub rank_policy: RankPolicy,
    pub peak_hours: PeakHours,
    pub platform_breakdown: Vec<PlatformShare>,
    /// Users ordered by rank.
    pub users: Vec<UserSummary>,
}
