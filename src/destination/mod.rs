//! The Destination tracker boundary.

pub mod fields;
pub mod jira;
pub mod markup;

pub use jira::JiraClient;

use crate::error::Result;
use crate::model::{IssueInput, StateType};
use crate::source::DownloadedFile;
use serde::{Deserialize, Serialize};

/// Identifiers of a freshly created Destination issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    pub id: String,
}

/// An issue type available in the Destination project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// The account the Destination credentials belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

/// Write access to the Destination tracker.
///
/// Every failure surfaces as an error carrying status and body. The
/// reconciler only distinguishes success from failure.
pub trait IssueDestination {
    /// # Errors
    ///
    /// Returns an error if the Destination rejects the issue.
    fn create_issue(&self, issue: &IssueInput) -> Result<CreatedIssue>;

    /// # Errors
    ///
    /// Returns an error if the Destination rejects the update.
    fn update_issue(&self, key: &str, issue: &IssueInput) -> Result<()>;

    /// Look up an existing Destination issue by Source id.
    ///
    /// Implementations without a way to search return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the search itself fails.
    fn find_by_source_id(&self, _source_id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// # Errors
    ///
    /// Returns an error if the comment is rejected.
    fn add_comment(&self, key: &str, text: &str) -> Result<()>;

    /// Plain-text bodies of every comment on the issue.
    ///
    /// # Errors
    ///
    /// Returns an error if comments cannot be listed.
    fn list_comments(&self, key: &str) -> Result<Vec<String>>;

    /// Returns `true` when the Destination confirms the upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload request fails.
    fn upload_attachment(&self, key: &str, file: &DownloadedFile) -> Result<bool>;

    /// Move the issue to the status matching `state_type`.
    ///
    /// Returns whether a transition was performed.
    ///
    /// # Errors
    ///
    /// Returns an error if the Destination rejects the transition.
    fn transition_status(&self, _key: &str, _state_type: StateType) -> Result<bool> {
        Ok(false)
    }

    /// # Errors
    ///
    /// Returns an error if the Destination cannot be reached or rejects the credentials.
    fn test_connection(&self) -> Result<Account>;

    /// # Errors
    ///
    /// Returns an error if the project cannot be read.
    fn issue_types(&self) -> Result<Vec<IssueType>>;
}
