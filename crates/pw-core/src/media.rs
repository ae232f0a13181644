//! Media kinds as the single source of truth for media type strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of media a playback record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Episode,
    Track,
    Clip,
}

impl MediaKind {
    /// Kinds tracked when nothing else is configured.
    pub const DEFAULT_TRACKED: [Self; 2] = [Self::Movie, Self::Episode];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
            Self::Track => "track",
            Self::Clip => "clip",
        }
    }

    /// Whether plays of this kind roll up to a parent (episode to show, track to artist)
    /// for top-item and metadata purposes.
    #[must_use]
    pub const fn rolls_up(&self) -> bool {
        matches!(self, Self::Episode | Self::Track)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "episode" => Ok(Self::Episode),
            "track" => Ok(Self::Track),
            "clip" => Ok(Self::Clip),
            _ => Err(UnknownMediaKind(s.to_string())),
        }
    }
}

/// Error type for unknown media type strings.
#[derive(Debug, Clone, Error)]
#[error("unknown media kind: {0}")]
pub struct UnknownMediaKind(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_all_variants() {
        for kind in [
            MediaKind::Movie,
            MediaKind::Episode,
            MediaKind::Track,
            MediaKind::Clip,
        ] {
            let parsed: MediaKind = kind.to_string().parse().expect("should parse");
            assert_eq!(parsed, kind, "roundtrip failed for {kind:?}");
        }
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!("Episode".parse::<MediaKind>().unwrap(), MediaKind::Episode);
    }

    #[test]
    fn unknown_kind_errors() {
        let err = "photo".parse::<MediaKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown media kind: photo");
    }

    #[test]
    fn only_children_roll_up() {
        assert!(MediaKind::Episode.rolls_up());
        assert!(MediaKind::Track.rolls_up());
        assert!(!MediaKind::Movie.rolls_up());
    }
}
