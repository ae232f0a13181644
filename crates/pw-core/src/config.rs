//! Tunable thresholds for report generation.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Configuration for report generation.
///
/// Values are signed so that out-of-range input from config files or the
/// environment can be represented and rejected by [`ReportConfig::validate`]
/// instead of being clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Longest gap between plays that still continues a viewing session.
    /// Default: 60 minutes.
    pub binge_idle_threshold_minutes: i64,

    /// Plays of one media kind a session needs to count as a binge.
    /// Default: 3.
    pub binge_min_items: i64,

    /// Days without a play that may sit inside a streak without breaking it.
    /// Default: 0 (strict day-to-day contiguity).
    pub streak_grace_days: i64,

    /// Maximum number of top items (and unique titles) kept per user.
    /// Default: 10.
    pub top_items_limit: i64,

    /// Day the current streak is measured against. Defaults to the last day of
    /// the report window.
    pub as_of: Option<NaiveDate>,

    /// Summarize users on the rayon thread pool. Results are identical either way.
    pub parallel: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            binge_idle_threshold_minutes: 60,
            binge_min_items: 3,
            streak_grace_days: 0,
            top_items_limit: 10,
            as_of: None,
            parallel: true,
        }
    }
}

impl ReportConfig {
    /// Checks every threshold, returning the first out-of-range value.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.binge_idle_threshold_minutes < 0 {
            return Err(invalid(
                "binge_idle_threshold_minutes",
                self.binge_idle_threshold_minutes,
                "must not be negative",
            ));
        }
        if Duration::try_minutes(self.binge_idle_threshold_minutes).is_none() {
            return Err(invalid(
                "binge_idle_threshold_minutes",
                self.binge_idle_threshold_minutes,
                "is too large",
            ));
        }
        if self.binge_min_items < 1 {
            return Err(invalid(
                "binge_min_items",
                self.binge_min_items,
                "must be at least 1",
            ));
        }
        if self.streak_grace_days < 0 {
            return Err(invalid(
                "streak_grace_days",
                self.streak_grace_days,
                "must not be negative",
            ));
        }
        if self.top_items_limit < 0 {
            return Err(invalid(
                "top_items_limit",
                self.top_items_limit,
                "must not be negative",
            ));
        }
        Ok(())
    }

    pub(crate) fn idle_threshold(&self) -> Duration {
        Duration::try_minutes(self.binge_idle_threshold_minutes).unwrap_or(Duration::MAX)
    }

    pub(crate) fn min_binge_items(&self) -> usize {
        usize::try_from(self.binge_min_items).unwrap_or(usize::MAX)
    }

    pub(crate) fn top_items(&self) -> usize {
        usize::try_from(self.top_items_limit).unwrap_or(usize::MAX)
    }
}

const fn invalid(field: &'static str, value: i64, reason: &'static str) -> ReportError {
    ReportError::InvalidConfiguration {
        field,
        value,
        reason,
    }
}
