//! Error types and handling for `linear_jira_sync`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for ad-hoc context
//! - Provides recovery hints for user-facing errors
//! - Maps every variant onto a stable [`ErrorCode`] and exit code

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    // === Configuration Errors ===
    /// Configuration is present but unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required configuration key is absent.
    #[error("{what} is required ({env} or {key})")]
    MissingConfig {
        what: &'static str,
        key: &'static str,
        env: &'static str,
    },

    // === Remote Errors ===
    /// The Source tracker rejected or failed a request.
    #[error("Linear API error{}: {message}", status_suffix(.status))]
    SourceApi {
        status: Option<u16>,
        message: String,
    },

    /// The Destination tracker returned a non-success status.
    #[error("Jira API error - status {status}: {body}")]
    DestinationApi { status: u16, body: String },

    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Lookup Errors ===
    /// Single-issue sync target does not exist in the Source tracker.
    #[error("Issue not found: {identifier}")]
    IssueNotFound { identifier: String },

    // === Input Errors ===
    /// A timestamp argument could not be parsed.
    #[error("Invalid timestamp '{value}': use RFC3339 like 2024-01-01T00:00:00Z")]
    InvalidTimestamp { value: String },

    /// Attachment download/upload precondition failed.
    #[error("Attachment error: {0}")]
    Attachment(String),

    // === State Errors ===
    /// The state file could not be written.
    #[error("Failed to write sync state at '{path}': {source}")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::MissingConfig { .. }
                | Self::IssueNotFound { .. }
                | Self::InvalidTimestamp { .. }
        )
    }

    /// Did this fail on the wire rather than in our own logic?
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::SourceApi { .. } | Self::DestinationApi { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingConfig { .. } | Self::Config(_) => Some(
                "Set it in the environment, a .env file, or ~/.linear-jira-sync/config.yaml",
            ),
            Self::IssueNotFound { .. } => Some("Check the identifier, e.g. ENG-123"),
            Self::InvalidTimestamp { .. } => Some("Example: --updated-after 2024-01-01T00:00:00Z"),
            Self::DestinationApi { status: 401 | 403, .. } => {
                Some("Check JIRA_USERNAME and JIRA_API_TOKEN")
            }
            Self::SourceApi {
                status: Some(401 | 403),
                ..
            } => Some("Check LINEAR_API_TOKEN"),
            Self::Http(_) => Some("Check network connectivity and the configured API URLs"),
            _ => None,
        }
    }

    /// Build a destination error, substituting a marker for an empty body.
    #[must_use]
    pub fn destination(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::DestinationApi {
            status,
            body: if body.trim().is_empty() {
                "<empty>".to_string()
            } else {
                body
            },
        }
    }

    /// Build a source error from a message and optional HTTP status.
    #[must_use]
    pub fn source_api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::SourceApi {
            status,
            message: message.into(),
        }
    }
}

#[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Result type using `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;
