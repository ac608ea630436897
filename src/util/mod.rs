//! Shared utilities for `ljsync`.
//!
//! - Time parsing and formatting (RFC3339)
//! - Progress indicators for sync runs

pub mod progress;
pub mod time;

pub use progress::{SyncProgressBar, should_show_progress};
pub use time::{format_timestamp, parse_since};
