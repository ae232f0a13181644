//! Watch streaks: runs of consecutive viewing days.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

/// Streak statistics for one viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreakStats {
    /// Watch-days in the longest run.
    pub longest_streak: u32,
    /// Watch-days in the run ending on the last watch-day, or 0 when that day
    /// is too far before the reference day.
    pub current_streak: u32,
    /// First day of the longest run (earliest run on ties).
    pub longest_streak_start: Option<NaiveDate>,
    /// Last day of the longest run.
    pub longest_streak_end: Option<NaiveDate>,
    /// Distinct days with at least one play.
    pub active_days: u32,
}

/// Computes streaks over the given watch-days.
///
/// Two watch-days belong to the same run when they are at most
/// `1 + grace_days` days apart, so a grace of 0 demands strict contiguity.
/// Run length counts watch-days, not calendar days spanned.
pub fn compute_streaks<I>(days: I, grace_days: i64, reference_day: NaiveDate) -> StreakStats
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = days.into_iter().collect();
    let max_step = grace_days.saturating_add(1);

    let mut stats = StreakStats {
        active_days: u32::try_from(days.len()).unwrap_or(u32::MAX),
        ..StreakStats::default()
    };
    let mut previous: Option<NaiveDate> = None;
    let mut run_start = NaiveDate::MIN;
    let mut run_len: u32 = 0;

    for &day in &days {
        match previous {
            Some(prev) if (day - prev).num_days() <= max_step => run_len += 1,
            _ => {
                run_start = day;
                run_len = 1;
            }
        }
        if run_len > stats.longest_streak {
            stats.longest_streak = run_len;
            stats.longest_streak_start = Some(run_start);
            stats.longest_streak_end = Some(day);
        }
        previous = Some(day);
    }

    if let Some(last) = previous {
        let lag = (reference_day - last).num_days();
        if (0..=max_step).contains(&lag) {
            stats.current_streak = run_len;
        }
    }

    stats
}
