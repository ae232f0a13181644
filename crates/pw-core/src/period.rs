//! Calendar periods and the half-open windows they cover.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::error::ReportError;

/// Time period for a wrapped report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// Full calendar year (e.g., 2024)
    Year(i32),
    /// Specific month (year, month 1-12)
    Month(i32, u32),
}

impl ReportPeriod {
    /// Returns the `[start, end)` window covered by this period.
    pub fn window(self) -> Result<ReportWindow, ReportError> {
        let (start, end) = match self {
            Self::Year(year) => (
                first_instant(year, 1),
                year.checked_add(1).and_then(|next| first_instant(next, 1)),
            ),
            Self::Month(year, month) => {
                let next = if month == 12 {
                    year.checked_add(1).map(|next_year| (next_year, 1))
                } else {
                    month.checked_add(1).map(|next_month| (year, next_month))
                };
                (
                    first_instant(year, month),
                    next.and_then(|(next_year, next_month)| first_instant(next_year, next_month)),
                )
            }
        };

        match (start, end) {
            (Some(start), Some(end)) => ReportWindow::new(start, end),
            _ => {
                let (year, month) = match self {
                    Self::Year(year) => (year, 1),
                    Self::Month(year, month) => (year, month),
                };
                Err(ReportError::InvalidPeriod { year, month })
            }
        }
    }

    /// Human-readable label, e.g. "2024" or "March 2024".
    pub fn label(&self) -> String {
        match self {
            Self::Year(year) => year.to_string(),
            Self::Month(year, month) => {
                let name = match month {
                    1 => "January",
                    2 => "February",
                    3 => "March",
                    4 => "April",
                    5 => "May",
                    6 => "June",
                    7 => "July",
                    8 => "August",
                    9 => "September",
                    10 => "October",
                    11 => "November",
                    12 => "December",
                    _ => "Unknown",
                };
                format!("{name} {year}")
            }
        }
    }
}

fn first_instant(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// A half-open reporting interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportWindow {
    /// Creates a window; `start` must be strictly before `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ReportError> {
        if start >= end {
            return Err(ReportError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `instant` falls inside the window (start inclusive, end exclusive).
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// The last calendar day that overlaps the window.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        (self.end - Duration::seconds(1)).date_naive()
    }
}
