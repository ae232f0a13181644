//! Error types for report generation.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised before any aggregation takes place.
///
/// Once configuration and window are accepted, report generation cannot fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {field} = {value} ({reason})")]
    InvalidConfiguration {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },

    /// The report window is empty or inverted.
    #[error("invalid report window: {start} is not before {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The calendar period does not exist.
    #[error("invalid report period: year {year}, month {month}")]
    InvalidPeriod { year: i32, month: u32 },
}
