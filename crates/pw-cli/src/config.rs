//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pw_core::{MediaKind, ReportConfig};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Media kinds that count towards reports. Default: movies and episodes.
    pub tracked_kinds: Vec<MediaKind>,

    /// Longest gap (minutes) between plays that keeps a session going.
    pub binge_idle_threshold_minutes: i64,

    /// Plays of one kind a session needs to count as a binge.
    pub binge_min_items: i64,

    /// Missed days tolerated inside a streak.
    pub streak_grace_days: i64,

    /// Top items and unique titles listed per user.
    pub top_items_limit: i64,

    /// Summarize users in parallel.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        let report = ReportConfig::default();
        Self {
            tracked_kinds: MediaKind::DEFAULT_TRACKED.to_vec(),
            binge_idle_threshold_minutes: report.binge_idle_threshold_minutes,
            binge_min_items: report.binge_min_items,
            streak_grace_days: report.streak_grace_days,
            top_items_limit: report.top_items_limit,
            parallel: report.parallel,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // PW_BINGE_MIN_ITEMS=4 etc.
        figment = figment.merge(Env::prefixed("PW_"));

        figment.extract()
    }

    /// The engine settings carried by this configuration.
    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            binge_idle_threshold_minutes: self.binge_idle_threshold_minutes,
            binge_min_items: self.binge_min_items,
            streak_grace_days: self.streak_grace_days,
            top_items_limit: self.top_items_limit,
            as_of: None,
            parallel: self.parallel,
        }
    }
}

/// Returns the platform-specific config directory for pw.
///
/// On Linux: `~/.config/pw`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pw"))
}
