//! Media metadata lookup (posters and genres).

use std::collections::HashMap;
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};

use crate::event::WatchEvent;
use crate::types::ItemId;

/// Presentation metadata for a library item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Poster reference (a server path or URL), opaque to the engine.
    #[serde(default, alias = "thumb")]
    pub poster: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Read-only metadata source keyed by item identifier.
///
/// Returning `None` means "unknown"; it is never an error.
pub trait MetadataLookup {
    fn lookup(&self, item_id: &ItemId) -> Option<MediaMetadata>;
}

/// A lookup that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataLookup for NoMetadata {
    fn lookup(&self, _item_id: &ItemId) -> Option<MediaMetadata> {
        None
    }
}

impl<S: BuildHasher> MetadataLookup for HashMap<String, MediaMetadata, S> {
    fn lookup(&self, item_id: &ItemId) -> Option<MediaMetadata> {
        self.get(item_id.as_str()).cloned()
    }
}

/// Fills missing genres and posters from `lookup`.
///
/// Each library item (show for episodes, the item itself for movies) is looked
/// up once. Genres already present on an event are kept. Returns the number of
/// events that gained data.
pub fn apply_metadata<M>(events: &mut [WatchEvent], lookup: &M) -> usize
where
    M: MetadataLookup + ?Sized,
{
    let mut cache: HashMap<ItemId, Option<MediaMetadata>> = HashMap::new();
    let mut enriched = 0;

    for event in events.iter_mut() {
        let key = event.library_item().0.clone();
        let metadata = cache
            .entry(key)
            .or_insert_with_key(|key| lookup.lookup(key));
        let Some(metadata) = metadata else {
            continue;
        };

        let mut changed = false;
        if event.genres.is_empty() && !metadata.genres.is_empty() {
            event.genres.clone_from(&metadata.genres);
            changed = true;
        }
        if event.poster.is_none() && metadata.poster.is_some() {
            event.poster.clone_from(&metadata.poster);
            changed = true;
        }
        if changed {
            enriched += 1;
        }
    }

    tracing::debug!(
        items = cache.len(),
        enriched,
        "applied media metadata"
    );
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::{episode, movie, origin};

    fn catalog() -> HashMap<String, MediaMetadata> {
        HashMap::from([
            (
                "show-Severance".to_string(),
                MediaMetadata {
                    poster: Some("/library/metadata/900/thumb".to_string()),
                    genres: vec!["Drama".to_string(), "Thriller".to_string()],
                },
            ),
            (
                "m1".to_string(),
                MediaMetadata {
                    poster: None,
                    genres: vec!["Comedy".to_string()],
                },
            ),
        ])
    }

    #[test]
    fn episodes_use_show_metadata() {
        let mut events = vec![episode("a", "e1", "Severance", origin(), 50)];
        let enriched = apply_metadata(&mut events, &catalog());

        assert_eq!(enriched, 1);
        assert_eq!(events[0].genres, vec!["Drama", "Thriller"]);
        assert_eq!(
            events[0].poster.as_deref(),
            Some("/library/metadata/900/thumb")
        );
    }

    #[test]
    fn existing_genres_are_kept() {
        let mut event = movie("a", "m1", origin(), 90);
        event.genres = vec!["Family".to_string()];
        let mut events = vec![event];

        let enriched = apply_metadata(&mut events, &catalog());
        assert_eq!(enriched, 0);
        assert_eq!(events[0].genres, vec!["Family"]);
    }

    #[test]
    fn unknown_items_are_left_empty() {
        let mut events = vec![movie("a", "m2", origin(), 90)];
        assert_eq!(apply_metadata(&mut events, &catalog()), 0);
        assert!(events[0].genres.is_empty());
        assert_eq!(events[0].poster, None);

        assert_eq!(apply_metadata(&mut events, &NoMetadata), 0);
    }

    #[test]
    fn metadata_accepts_thumb_alias() {
        let metadata: MediaMetadata =
            serde_json::from_str(r#"{"thumb": "/t.jpg", "genres": ["Anime"]}"#).unwrap();
        assert_eq!(metadata.poster.as_deref(), Some("/t.jpg"));
        assert_eq!(metadata.genres, vec!["Anime"]);
    }
}
