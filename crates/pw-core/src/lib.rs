//! Watch-history analytics for media-server "wrapped" reports.
//!
//! This crate contains the domain types and logic for:
//! - Normalization: turning raw history rows into validated watch events
//! - Per-user summaries: totals, top items, platforms, genres, peak hours
//! - Binge sessions and watch streaks
//! - Server-wide aggregation with deterministic user ranking

mod binge;
pub mod config;
pub mod error;
mod event;
pub mod media;
pub mod metadata;
pub mod period;
mod report;
mod server;
pub mod source;
mod streak;
pub mod summary;
pub mod types;
mod user;

pub use binge::{BingeSession, detect_binges};
pub use config::ReportConfig;
pub use error::ReportError;
pub use event::{Normalized, RawWatchRecord, UNKNOWN_PLATFORM, WatchEvent, normalize};
pub use media::{MediaKind, UnknownMediaKind};
pub use metadata::{MediaMetadata, MetadataLookup, NoMetadata, apply_metadata};
pub use period::{ReportPeriod, ReportWindow};
pub use report::build_report;
pub use server::aggregate;
pub use source::{HistorySource, SourceError, parse_history_json};
pub use streak::{StreakStats, compute_streaks};
pub use summary::{ServerSummary, UserSummary};
pub use types::{ItemId, UserId, ValidationError};
pub use user::summarize_user;
