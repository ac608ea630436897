//! The Source tracker boundary.
//!
//! The reconciler only ever sees these traits; `linear` and `download`
//! provide the live implementations.

pub mod download;
pub mod linear;

pub use download::HttpAttachmentDownloader;
pub use linear::LinearClient;

use crate::error::Result;
use crate::model::{AttachmentInput, Issue, StateType, User};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Server-side filter for a batch fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    /// Team key, e.g. `ENG`.
    pub team: Option<String>,
    pub state_type: Option<StateType>,
    /// Only issues updated at or after this instant.
    pub updated_after: Option<DateTime<Utc>>,
}

impl IssueFilter {
    #[must_use]
    pub fn with_updated_after(mut self, updated_after: Option<DateTime<Utc>>) -> Self {
        self.updated_after = updated_after;
        self
    }
}

/// Read access to the Source tracker.
pub trait IssueSource {
    /// Fetch every issue matching `filter`, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page cannot be fetched.
    fn fetch_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    /// Fetch one issue by its human identifier (e.g. `ENG-123`).
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure. A missing issue is `Ok(None)`.
    fn fetch_issue_by_identifier(&self, identifier: &str) -> Result<Option<Issue>>;

    /// Check credentials and return the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the Source cannot be reached or rejects the token.
    fn test_connection(&self) -> Result<User>;
}

/// A downloaded attachment held in a temporary file.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct DownloadedFile {
    pub file: NamedTempFile,
    /// Name to present to the Destination.
    pub file_name: String,
    pub size: u64,
    pub content_type: Option<String>,
}

impl DownloadedFile {
    /// Write `bytes` into a fresh temp file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created or written.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let file_name = file_name.into();
        let mut file = download::temp_file_for(&file_name)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            file_name,
            size: bytes.len() as u64,
            content_type: None,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Fetches attachment payloads from the Source.
pub trait AttachmentDownloader {
    /// Download an attachment into a temp file.
    ///
    /// `Ok(None)` means the attachment cannot be fetched (bad URL, too large,
    /// non-success status) and the caller should fall back to a comment.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or I/O failure.
    fn download(&self, attachment: &AttachmentInput) -> Result<Option<DownloadedFile>>;
}
