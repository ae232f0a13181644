//! Per-user aggregation.
//!
//! Every metric here is derived from one user's events in chronological order
//! (see `WatchEvent::chronological`); that order decides sessions, streak runs
//! and every first-occurrence tie-break.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Timelike, Utc};

use crate::binge::detect_binges;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::event::WatchEvent;
use crate::media::MediaKind;
use crate::period::ReportWindow;
use crate::streak::compute_streaks;
use crate::summary::{
    GenreShare, PeakHours, PlatformShare, TopItem, UserSummary, WatchMoment, percentage,
};
use crate::types::ItemId;

/// Summarizes one user's events.
///
/// `events` must all belong to the same user; their order does not matter.
/// Returns `Ok(None)` when there are no events: a user without plays has no
/// summary rather than an empty one. `rank` and the unique-title fields are
/// left for the report builder and server-wide aggregation to fill in.
pub fn summarize_user(
    events: &[WatchEvent],
    window: &ReportWindow,
    config: &ReportConfig,
) -> Result<Option<UserSummary>, ReportError> {
    config.validate()?;
    let mut sorted = events.to_vec();
    sorted.sort_by(WatchEvent::chronological);
    Ok(summarize_sorted(&sorted, window, config))
}

/// Accumulates values per key, remembering the order keys first appeared in.
struct Tally<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V: Default> Tally<V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut V {
        let idx = if let Some(&idx) = self.index.get(key) {
            idx
        } else {
            let idx = self.entries.len();
            self.index.insert(key.to_string(), idx);
            self.entries.push((key.to_string(), V::default()));
            idx
        };
        &mut self.entries[idx].1
    }

    /// Entries by descending `rank`; keys seen first win ties.
    fn into_ranked<K: Ord>(self, rank: impl Fn(&V) -> K) -> Vec<(String, V)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| rank(&b.1).cmp(&rank(&a.1)));
        entries
    }
}

struct ItemTally {
    title: String,
    media_kind: MediaKind,
    watch_seconds: u64,
    play_count: u32,
    completed_plays: f64,
    poster: Option<String>,
    last_watched_at: DateTime<Utc>,
}

#[expect(
    clippy::too_many_lines,
    reason = "single pass over the events feeds every per-user metric"
)]
pub(crate) fn summarize_sorted(
    events: &[WatchEvent],
    window: &ReportWindow,
    config: &ReportConfig,
) -> Option<UserSummary> {
    let first = events.first()?;
    let last = events.last()?;

    let mut total_watch_seconds = 0u64;
    let mut movie_count = 0u32;
    let mut episode_count = 0u32;
    let mut movie_watch_seconds = 0u64;
    let mut episode_watch_seconds = 0u64;
    let mut completed_plays = 0.0;
    let mut hourly = [0u32; 24];
    let mut items: BTreeMap<&ItemId, ItemTally> = BTreeMap::new();
    let mut platforms: Tally<u64> = Tally::new();
    let mut genres: Tally<(u32, u64)> = Tally::new();

    for event in events {
        let seconds = event.duration_watched_seconds;
        let completion = event.percent_complete().map(|pct| pct.min(1.0));

        total_watch_seconds = total_watch_seconds.saturating_add(seconds);
        match event.media_kind {
            MediaKind::Movie => {
                movie_count += 1;
                movie_watch_seconds = movie_watch_seconds.saturating_add(seconds);
            }
            MediaKind::Episode => {
                episode_count += 1;
                episode_watch_seconds = episode_watch_seconds.saturating_add(seconds);
            }
            MediaKind::Track | MediaKind::Clip => {}
        }
        if let Some(completion) = completion {
            completed_plays += completion;
        }
        hourly[event.started_at.hour() as usize] += 1;
        let platform_seconds = platforms.entry(&event.platform);
        *platform_seconds = platform_seconds.saturating_add(seconds);

        let mut seen_genres: Vec<&str> = Vec::with_capacity(event.genres.len());
        for genre in &event.genres {
            if seen_genres.contains(&genre.as_str()) {
                continue;
            }
            seen_genres.push(genre);
            let (plays, genre_seconds) = genres.entry(genre);
            *plays += 1;
            *genre_seconds = genre_seconds.saturating_add(seconds);
        }

        let (item_id, title) = event.library_item();
        let item = items.entry(item_id).or_insert_with(|| ItemTally {
            title: title.to_string(),
            media_kind: event.media_kind,
            watch_seconds: 0,
            play_count: 0,
            completed_plays: 0.0,
            poster: None,
            last_watched_at: event.started_at,
        });
        item.watch_seconds = item.watch_seconds.saturating_add(seconds);
        item.play_count += 1;
        item.completed_plays += completion.unwrap_or(0.0);
        item.last_watched_at = item.last_watched_at.max(event.started_at);
        if item.poster.is_none() {
            item.poster.clone_from(&event.poster);
        }
    }

    let mut top_items: Vec<TopItem> = items
        .into_iter()
        .map(|(item_id, item)| TopItem {
            item_id: item_id.clone(),
            title: item.title,
            media_kind: item.media_kind,
            watch_seconds: item.watch_seconds,
            play_count: item.play_count,
            completed_plays: item.completed_plays,
            poster: item.poster,
            last_watched_at: item.last_watched_at,
        })
        .collect();
    top_items.sort_by(|a, b| {
        b.watch_seconds
            .cmp(&a.watch_seconds)
            .then_with(|| b.last_watched_at.cmp(&a.last_watched_at))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    top_items.truncate(config.top_items());

    let platform_breakdown = platforms
        .into_ranked(|seconds| *seconds)
        .into_iter()
        .map(|(platform, watch_seconds)| PlatformShare {
            platform,
            watch_seconds,
            percentage: percentage(watch_seconds, total_watch_seconds),
        })
        .collect();
    let genre_breakdown = genres
        .into_ranked(|(plays, _)| *plays)
        .into_iter()
        .map(|(genre, (plays, watch_seconds))| GenreShare {
            genre,
            plays,
            watch_seconds,
        })
        .collect();

    let reference_day = config.as_of.unwrap_or_else(|| window.last_day());
    let streak = compute_streaks(
        events.iter().map(WatchEvent::watch_day),
        config.streak_grace_days,
        reference_day,
    );
    let binge_sessions = detect_binges(events, config.idle_threshold(), config.min_binge_items());

    tracing::debug!(
        user = %first.user_id,
        plays = events.len(),
        binges = binge_sessions.len(),
        "summarized user"
    );

    Some(UserSummary {
        user_id: first.user_id.clone(),
        display_name: last.user_display_name.clone(),
        rank: None,
        callout: None,
        total_watch_seconds,
        item_count: u32::try_from(events.len()).unwrap_or(u32::MAX),
        movie_count,
        episode_count,
        movie_watch_seconds,
        episode_watch_seconds,
        completed_plays,
        top_items,
        platform_breakdown,
        peak_hours: PeakHours::from_hourly(hourly),
        binge_sessions,
        streak,
        genre_breakdown,
        first_watch: moment(first),
        last_watch: moment(last),
        unique_titles: Vec::new(),
        unique_title_count: 0,
    })
}

fn moment(event: &WatchEvent) -> WatchMoment {
    WatchMoment {
        title: event.title.clone(),
        media_kind: event.media_kind,
        started_at: event.started_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::{at, episode, movie};
    use crate::period::ReportPeriod;

    fn march() -> ReportWindow {
        ReportPeriod::Month(2024, 3).window().unwrap()
    }

    fn summarize(events: &[WatchEvent]) -> UserSummary {
        summarize_user(events, &march(), &ReportConfig::default())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn no_events_means_no_summary() {
        let summary = summarize_user(&[], &march(), &ReportConfig::default()).unwrap();
        assert_eq!(summary, None);
    }

    #[test]
    fn invalid_config_is_rejected_before_summarizing() {
        let config = ReportConfig {
            streak_grace_days: -2,
            ..Default::default()
        };
        let events = vec![movie("a", "m1", at(0, 20, 0), 90)];
        assert!(matches!(
            summarize_user(&events, &march(), &config),
            Err(ReportError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn totals_split_by_kind() {
        let events = vec![
            movie("a", "m1", at(0, 20, 0), 90),
            episode("a", "e1", "Lost", at(1, 21, 0), 40),
            episode("a", "e2", "Lost", at(1, 21, 45), 40),
        ];
        let summary = summarize(&events);

        assert_eq!(summary.total_watch_seconds, (90 + 40 + 40) * 60);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.movie_count, 1);
        assert_eq!(summary.episode_count, 2);
        assert_eq!(summary.movie_watch_seconds, 90 * 60);
        assert_eq!(summary.episode_watch_seconds, 80 * 60);
        assert_eq!(summary.rank, None);
        assert_eq!(summary.display_name, "A");
    }

    #[test]
    fn episodes_roll_up_into_their_show() {
        let events = vec![
            episode("a", "e1", "Lost", at(0, 21, 0), 40),
            episode("a", "e2", "Lost", at(1, 21, 0), 40),
            movie("a", "m1", at(2, 20, 0), 70),
        ];
        let summary = summarize(&events);

        assert_eq!(summary.top_items.len(), 2);
        assert_eq!(summary.top_items[0].title, "Lost");
        assert_eq!(summary.top_items[0].item_id.as_str(), "show-Lost");
        assert_eq!(summary.top_items[0].play_count, 2);
        assert_eq!(summary.top_items[0].watch_seconds, 80 * 60);
        assert_eq!(summary.top_items[1].title, "Movie m1");
    }

    #[test]
    fn top_item_ties_go_to_most_recent_watch() {
        let events = vec![
            movie("a", "m1", at(0, 20, 0), 90),
            movie("a", "m2", at(3, 20, 0), 90),
        ];
        let summary = summarize(&events);
        assert_eq!(summary.top_items[0].item_id.as_str(), "m2");
        assert_eq!(summary.top_items[1].item_id.as_str(), "m1");
    }

    #[test]
    fn top_items_are_truncated() {
        let events: Vec<_> = (0..5)
            .map(|i| movie("a", &format!("m{i}"), at(i, 20, 0), 90))
            .collect();
        let config = ReportConfig {
            top_items_limit: 2,
            ..Default::default()
        };
        let summary = summarize_user(&events, &march(), &config).unwrap().unwrap();
        assert_eq!(summary.top_items.len(), 2);
    }

    #[test]
    fn completion_weighting_skips_unknown_runtimes() {
        let mut half = movie("a", "m1", at(0, 20, 0), 60);
        half.media_duration_seconds = Some(7200);
        let mut rewatched = movie("a", "m2", at(1, 20, 0), 150);
        rewatched.media_duration_seconds = Some(6000);
        let unknown = movie("a", "m3", at(2, 20, 0), 90);

        let summary = summarize(&[half, rewatched, unknown]);
        assert!((summary.completed_plays - 1.5).abs() < f64::EPSILON);
        assert_eq!(summary.total_watch_seconds, (60 + 150 + 90) * 60);
    }

    #[test]
    fn platform_breakdown_is_descending_with_first_seen_ties() {
        let mut tv = movie("a", "m1", at(0, 20, 0), 60);
        tv.platform = "Android TV".to_string();
        let mut web = movie("a", "m2", at(1, 20, 0), 60);
        web.platform = "Chrome".to_string();
        let mut phone = movie("a", "m3", at(2, 20, 0), 120);
        phone.platform = "iOS".to_string();

        let summary = summarize(&[web, phone, tv]);
        let order: Vec<_> = summary
            .platform_breakdown
            .iter()
            .map(|share| share.platform.as_str())
            .collect();
        assert_eq!(order, vec!["iOS", "Android TV", "Chrome"]);
        let shares: Vec<_> = summary
            .platform_breakdown
            .iter()
            .map(|share| share.percentage)
            .collect();
        assert_eq!(shares, vec![50.0, 25.0, 25.0]);
    }

    #[test]
    fn genre_breakdown_counts_plays() {
        let mut a = movie("a", "m1", at(0, 20, 0), 60);
        a.genres = vec!["Comedy".to_string(), "Drama".to_string()];
        let mut b = movie("a", "m2", at(1, 20, 0), 60);
        b.genres = vec!["Drama".to_string(), "Drama".to_string()];

        let summary = summarize(&[a, b]);
        assert_eq!(
            summary.genre_breakdown,
            vec![
                GenreShare {
                    genre: "Drama".to_string(),
                    plays: 2,
                    watch_seconds: 7200,
                },
                GenreShare {
                    genre: "Comedy".to_string(),
                    plays: 1,
                    watch_seconds: 3600,
                },
            ]
        );
    }

    #[test]
    fn peak_hours_bucket_by_start_hour() {
        let events = vec![
            movie("a", "m1", at(0, 21, 50), 120),
            movie("a", "m2", at(1, 21, 5), 60),
            movie("a", "m3", at(2, 8, 0), 60),
        ];
        let summary = summarize(&events);
        assert_eq!(summary.peak_hours.hourly[21], 2);
        assert_eq!(summary.peak_hours.hourly[8], 1);
        assert_eq!(summary.peak_hours.peak_hour, Some(21));
        assert_eq!(summary.peak_hours.day_parts.evening, 2);
    }

    #[test]
    fn first_and_last_watch_follow_start_time() {
        let events = vec![
            movie("a", "late", at(9, 20, 0), 60),
            movie("a", "early", at(0, 20, 0), 60),
        ];
        let summary = summarize(&events);
        assert_eq!(summary.first_watch.title, "Movie early");
        assert_eq!(summary.last_watch.title, "Movie late");
    }

    #[test]
    fn streaks_use_window_end_as_reference() {
        // March 1, 2, 3 and 5; the window ends March 31
        let events: Vec<_> = [0, 1, 2, 4]
            .into_iter()
            .map(|day| movie("a", &format!("m{day}"), at(day, 20, 0), 60))
            .collect();
        let summary = summarize(&events);
        assert_eq!(summary.streak.longest_streak, 3);
        assert_eq!(summary.streak.current_streak, 0);
        assert_eq!(summary.streak.active_days, 4);

        let config = ReportConfig {
            streak_grace_days: 1,
            as_of: Some(at(5, 0, 0).date_naive()),
            ..Default::default()
        };
        let summary = summarize_user(&events, &march(), &config).unwrap().unwrap();
        assert_eq!(summary.streak.longest_streak, 4);
        assert_eq!(summary.streak.current_streak, 4);
    }

    #[test]
    fn input_order_does_not_matter() {
        let events = vec![
            episode("a", "e1", "Lost", at(0, 21, 0), 40),
            episode("a", "e2", "Lost", at(0, 21, 45), 40),
            episode("a", "e3", "Lost", at(0, 22, 30), 40),
            movie("a", "m1", at(3, 20, 0), 70),
        ];
        let mut reversed = events.clone();
        reversed.reverse();

        assert_eq!(summarize(&events), summarize(&reversed));
        assert_eq!(summarize(&events).binge_sessions.len(), 1);
    }
}
