//! Report assembly: group events by user, summarize each user, aggregate.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::event::WatchEvent;
use crate::period::ReportWindow;
use crate::server::aggregate;
use crate::summary::{ServerSummary, UserSummary};
use crate::types::{ItemId, UserId};
use crate::user::summarize_sorted;

/// Builds the full report for normalized events.
///
/// Events are expected to lie inside `window` (see [`crate::normalize`]); the
/// result does not depend on their order or on `config.parallel`.
pub fn build_report(
    events: &[WatchEvent],
    window: &ReportWindow,
    config: &ReportConfig,
) -> Result<ServerSummary, ReportError> {
    config.validate()?;

    let mut by_user: BTreeMap<UserId, Vec<WatchEvent>> = BTreeMap::new();
    for event in events {
        by_user
            .entry(event.user_id.clone())
            .or_default()
            .push(event.clone());
    }
    for group in by_user.values_mut() {
        group.sort_by(WatchEvent::chronological);
    }

    let mut unique = unique_titles(&by_user);
    let groups: Vec<Vec<WatchEvent>> = by_user.into_values().collect();

    let mut users: Vec<UserSummary> = if config.parallel {
        groups
            .par_iter()
            .filter_map(|group| summarize_sorted(group, window, config))
            .collect()
    } else {
        groups
            .iter()
            .filter_map(|group| summarize_sorted(group, window, config))
            .collect()
    };

    let limit = config.top_items();
    for user in &mut users {
        if let Some(mut titles) = unique.remove(&user.user_id) {
            user.unique_title_count = u32::try_from(titles.len()).unwrap_or(u32::MAX);
            titles.truncate(limit);
            user.unique_titles = titles;
        }
    }

    let report = aggregate(users, window);
    tracing::info!(
        users = report.unique_users,
        plays = report.total_items_watched,
        watch_seconds = report.total_watch_seconds,
        "built report"
    );
    Ok(report)
}

/// Titles each user watched that no other user did, alphabetical.
///
/// Items are compared by their library item, so an episode of a show someone
/// else also watched is not unique.
fn unique_titles(by_user: &BTreeMap<UserId, Vec<WatchEvent>>) -> HashMap<UserId, Vec<String>> {
    let libraries: Vec<(&UserId, BTreeMap<&ItemId, &str>)> = by_user
        .iter()
        .map(|(user, events)| {
            let mut items = BTreeMap::new();
            for event in events {
                let (item_id, title) = event.library_item();
                items.entry(item_id).or_insert(title);
            }
            (user, items)
        })
        .collect();

    let mut watchers: HashMap<&ItemId, usize> = HashMap::new();
    for (_, items) in &libraries {
        for item_id in items.keys() {
            *watchers.entry(*item_id).or_insert(0) += 1;
        }
    }

    libraries
        .into_iter()
        .map(|(user, items)| {
            let mut titles: Vec<(&str, &ItemId)> = items
                .into_iter()
                .filter(|(item_id, _)| watchers.get(item_id) == Some(&1))
                .map(|(item_id, title)| (title, item_id))
                .collect();
            titles.sort_unstable();
            let titles: Vec<String> = titles
                .into_iter()
                .map(|(title, _)| title.to_string())
                .collect();
            (user.clone(), titles)
        })
        .collect()
}
