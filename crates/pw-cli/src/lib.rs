//! Watch-history wrapped CLI library.
//!
//! This crate provides the CLI interface over `pw-core`: argument parsing,
//! configuration loading and file-backed history input.

mod cli;
pub mod commands;
mod config;
pub mod history;

pub use cli::{Cli, Commands, PeriodArgs};
pub use config::Config;
