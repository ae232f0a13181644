//! Server-wide aggregation and user ranking.
//!
//! # Algorithm Summary
//!
//! 1. Order users by total watch time (descending), then user id.
//! 2. Assign competition ranks: a user tied with the previous one shares its
//!    rank, otherwise the rank is the user's 1-based position.
//! 3. Label each rank with a callout; tied users share the label.
//! 4. Sum totals, merge hourly histograms and platform shares.

use std::collections::BTreeMap;

use crate::period::ReportWindow;
use crate::summary::{PeakHours, PlatformShare, RankPolicy, ServerSummary, UserSummary, percentage};

const CALLOUTS: [&str; 10] = [
    "Server Champion",
    "Runner-Up Extraordinaire",
    "Bronze Binger",
    "Movie Maven",
    "TV Enthusiast",
    "Popcorn Pro",
    "Rising Star",
    "Entertainment Seeker",
    "Culture Consumer",
    "Content Connoisseur",
];

/// Callout for ranks past the named ones.
const DEFAULT_CALLOUT: &str = "Dedicated Viewer";

fn rank_callout(rank: u32) -> &'static str {
    usize::try_from(rank)
        .ok()
        .and_then(|rank| rank.checked_sub(1))
        .and_then(|index| CALLOUTS.get(index))
        .copied()
        .unwrap_or(DEFAULT_CALLOUT)
}

/// Combines per-user summaries into the server report, ranking the users.
pub fn aggregate(mut users: Vec<UserSummary>, window: &ReportWindow) -> ServerSummary {
    users.sort_by(|a, b| {
        b.total_watch_seconds
            .cmp(&a.total_watch_seconds)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let mut previous: Option<(u64, u32)> = None;
    for (position, user) in users.iter_mut().enumerate() {
        let rank = match previous {
            Some((seconds, rank)) if seconds == user.total_watch_seconds => rank,
            _ => u32::try_from(position + 1).unwrap_or(u32::MAX),
        };
        user.rank = Some(rank);
        user.callout = Some(rank_callout(rank));
        previous = Some((user.total_watch_seconds, rank));
    }

    let mut total_watch_seconds = 0u64;
    let mut total_items_watched = 0u32;
    let mut movie_watch_seconds = 0u64;
    let mut episode_watch_seconds = 0u64;
    let mut peak_hours = PeakHours::default();
    let mut platforms: BTreeMap<&str, u64> = BTreeMap::new();

    for user in &users {
        total_watch_seconds = total_watch_seconds.saturating_add(user.total_watch_seconds);
        total_items_watched = total_items_watched.saturating_add(user.item_count);
        movie_watch_seconds = movie_watch_seconds.saturating_add(user.movie_watch_seconds);
        episode_watch_seconds =
            episode_watch_seconds.saturating_add(user.episode_watch_seconds);
        peak_hours = peak_hours.merged(&user.peak_hours);
        for share in &user.platform_breakdown {
            let seconds = platforms.entry(&share.platform).or_insert(0);
            *seconds = seconds.saturating_add(share.watch_seconds);
        }
    }

    let mut platform_breakdown: Vec<PlatformShare> = platforms
        .into_iter()
        .map(|(platform, watch_seconds)| PlatformShare {
            platform: platform.to_string(),
            watch_seconds,
            percentage: percentage(watch_seconds, total_watch_seconds),
        })
        .collect();
    platform_breakdown.sort_by(|a, b| b.watch_seconds.cmp(&a.watch_seconds));

    ServerSummary {
        period_start: window.start(),
        period_end: window.end(),
        total_watch_seconds,
        total_items_watched,
        movie_watch_seconds,
        episode_watch_seconds,
        unique_users: u32::try_from(users.len()).unwrap_or(u32::MAX),
        rank_policy: RankPolicy::Competition,
        peak_hours,
        platform_breakdown,
        users,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::event::WatchEvent;
    use crate::event::fixtures::{at, movie};
    use crate::period::ReportPeriod;
    use crate::user::summarize_user;

    fn march() -> ReportWindow {
        ReportPeriod::Month(2024, 3).window().unwrap()
    }

    fn user(events: &[WatchEvent]) -> UserSummary {
        summarize_user(events, &march(), &ReportConfig::default())
            .unwrap()
            .unwrap()
    }

    fn ranks(summary: &ServerSummary) -> Vec<(&str, Option<u32>)> {
        summary
            .users
            .iter()
            .map(|u| (u.user_id.as_str(), u.rank))
            .collect()
    }

    #[test]
    fn tied_users_share_a_rank_and_the_next_rank_skips() {
        let users = vec![
            user(&[movie("carol", "m1", at(0, 20, 0), 30)]),
            user(&[movie("bob", "m1", at(0, 20, 0), 120)]),
            user(&[movie("alice", "m2", at(1, 20, 0), 120)]),
        ];
        let summary = aggregate(users, &march());
        assert_eq!(
            ranks(&summary),
            vec![("alice", Some(1)), ("bob", Some(1)), ("carol", Some(3))]
        );
        assert_eq!(summary.rank_policy, RankPolicy::Competition);
        let callouts: Vec<_> = summary.users.iter().map(|u| u.callout).collect();
        assert_eq!(
            callouts,
            vec![Some("Server Champion"), Some("Server Champion"), Some("Bronze Binger")]
        );
    }

    #[test]
    fn ranks_past_the_named_callouts_get_the_default() {
        assert_eq!(rank_callout(1), "Server Champion");
        assert_eq!(rank_callout(10), "Content Connoisseur");
        assert_eq!(rank_callout(11), DEFAULT_CALLOUT);
        assert_eq!(rank_callout(0), DEFAULT_CALLOUT);
    }

    #[test]
    fn totals_are_conserved() {
        let mut web = movie("bob", "m2", at(1, 9, 0), 45);
        web.platform = "Chrome".to_string();
        let users = vec![
            user(&[movie("alice", "m1", at(0, 20, 0), 90)]),
            user(&[movie("bob", "m1", at(0, 21, 0), 60), web]),
        ];
        let expected: u64 = users.iter().map(|u| u.total_watch_seconds).sum();

        let summary = aggregate(users, &march());
        assert_eq!(summary.total_watch_seconds, expected);
        assert_eq!(summary.total_items_watched, 3);
        assert_eq!(summary.movie_watch_seconds, expected);
        assert_eq!(summary.episode_watch_seconds, 0);
        assert_eq!(summary.unique_users, 2);
        assert_eq!(summary.peak_hours.total(), 3);
        assert_eq!(
            summary.platform_breakdown,
            vec![
                PlatformShare {
                    platform: "Roku".to_string(),
                    watch_seconds: 150 * 60,
                    percentage: 76.9,
                },
                PlatformShare {
                    platform: "Chrome".to_string(),
                    watch_seconds: 45 * 60,
                    percentage: 23.1,
                },
            ]
        );
    }

    #[test]
    fn no_users_yields_an_empty_report() {
        let summary = aggregate(Vec::new(), &march());
        assert_eq!(summary.unique_users, 0);
        assert_eq!(summary.total_watch_seconds, 0);
        assert_eq!(summary.peak_hours.peak_hour, None);
        assert_eq!(summary.period_start, march().start());
        assert!(summary.users.is_empty());
    }
}
