//! Structured error output.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Fallback hint for failures the user cannot fix by changing input.
const DETAILS_HINT: &str = "Re-run with -vv or RUST_LOG=debug for details";

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Config Errors (exit code 2) ===
    /// Configuration value is malformed
    ConfigError,
    /// Required configuration key missing
    ConfigMissing,

    // === Source Errors (exit code 3) ===
    /// Source tracker API failure
    SourceApiError,

    // === Destination Errors (exit code 4) ===
    /// Destination tracker API failure
    DestinationApiError,
    /// Network/transport failure
    NetworkError,

    // === State / I/O Errors (exit code 5) ===
    /// State file could not be written
    StateWriteError,
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Input Errors (exit code 6) ===
    /// Single-issue target not found
    IssueNotFound,
    /// Timestamp argument invalid
    InvalidTimestamp,
    /// Attachment precondition failed
    AttachmentError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConfigMissing => "CONFIG_MISSING",
            Self::SourceApiError => "SOURCE_API_ERROR",
            Self::DestinationApiError => "DESTINATION_API_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::StateWriteError => "STATE_WRITE_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::AttachmentError => "ATTACHMENT_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Configuration errors
    /// - 3: Source errors
    /// - 4: Destination and network errors
    /// - 5: State and I/O errors
    /// - 6: Input errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError | Self::ConfigMissing => 2,
            Self::SourceApiError => 3,
            Self::DestinationApiError | Self::NetworkError => 4,
            Self::StateWriteError | Self::IoError | Self::JsonError | Self::YamlError => 5,
            Self::IssueNotFound | Self::InvalidTimestamp | Self::AttachmentError => 6,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `SyncError`.
    #[must_use]
    pub fn from_error(err: &SyncError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);

        let hint = err.suggestion().map(str::to_string).or_else(|| {
            (!err.is_user_recoverable()).then(|| DETAILS_HINT.to_string())
        });

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: err.is_transport(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &SyncError) -> (ErrorCode, Option<Value>) {
        match err {
            SyncError::Config(_) => (ErrorCode::ConfigError, None),
            SyncError::MissingConfig { key, env, .. } => (
                ErrorCode::ConfigMissing,
                Some(json!({"key": key, "env": env})),
            ),
            SyncError::SourceApi { status, .. } => {
                (ErrorCode::SourceApiError, Some(json!({"status": status})))
            }
            SyncError::DestinationApi { status, body } => (
                ErrorCode::DestinationApiError,
                Some(json!({"status": status, "body": body})),
            ),
            SyncError::Http(e) => (
                ErrorCode::NetworkError,
                e.url().map(|url| json!({"url": url.as_str()})),
            ),
            SyncError::IssueNotFound { identifier } => (
                ErrorCode::IssueNotFound,
                Some(json!({"identifier": identifier})),
            ),
            SyncError::InvalidTimestamp { value } => (
                ErrorCode::InvalidTimestamp,
                Some(json!({"provided": value})),
            ),
            SyncError::Attachment(_) => (ErrorCode::AttachmentError, None),
            SyncError::StateWrite { path, .. } => (
                ErrorCode::StateWriteError,
                Some(json!({"path": path.display().to_string()})),
            ),
            SyncError::Io(_) => (ErrorCode::IoError, None),
            SyncError::Json(_) => (ErrorCode::JsonError, None),
            SyncError::Yaml(_) => (ErrorCode::YamlError, None),
            SyncError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
