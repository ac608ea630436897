//! Durable sync state.
//!
//! The state document maps every Source issue id that has ever been created
//! in the Destination to its `SyncedIssue` record. It is loaded once per run,
//! mutated in memory, and written back at most once.

mod store;

pub use store::StateStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Schema version written into new documents.
pub const CURRENT_VERSION: &str = "1.0";

/// Outcome of the most recent reconciliation of one issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    #[default]
    Synced,
    Error,
}

impl SyncStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "SYNCED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The persisted sync-state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    #[serde(default)]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub synced_issues: BTreeMap<String, SyncedIssue>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::fresh()
    }
}

impl SyncState {
    /// An empty document that has never been saved.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            last_sync_time: None,
            version: CURRENT_VERSION.to_string(),
            synced_issues: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, source_id: &str) -> Option<&SyncedIssue> {
        self.synced_issues.get(source_id)
    }

    pub fn get_mut(&mut self, source_id: &str) -> Option<&mut SyncedIssue> {
        self.synced_issues.get_mut(source_id)
    }

    #[must_use]
    pub fn is_synced(&self, source_id: &str) -> bool {
        self.synced_issues.contains_key(source_id)
    }

    /// Insert or replace the record for `issue.source_issue_id`.
    pub fn record(&mut self, issue: SyncedIssue) {
        self.synced_issues
            .insert(issue.source_issue_id.clone(), issue);
    }

    /// Number of tracked issues with the given status.
    #[must_use]
    pub fn count_with_status(&self, status: SyncStatus) -> usize {
        self.synced_issues
            .values()
            .filter(|issue| issue.status == status)
            .count()
    }
}

/// Mapping from one Source issue to the Destination issue created for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedIssue {
    #[serde(alias = "linearIssueId", default, deserialize_with = "null_as_default")]
    pub source_issue_id: String,
    #[serde(alias = "jiraIssueKey", default, deserialize_with = "null_as_default")]
    pub destination_issue_key: String,
    #[serde(alias = "jiraIssueId", default, deserialize_with = "null_as_default")]
    pub destination_issue_id: String,
    #[serde(default)]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(alias = "linearUpdatedAt", default)]
    pub source_updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SyncStatus,
    #[serde(
        alias = "syncedAttachments",
        default,
        deserialize_with = "null_as_default"
    )]
    pub synced_attachment_ids: BTreeSet<String>,
}

impl SyncedIssue {
    #[must_use]
    pub fn new(
        source_issue_id: impl Into<String>,
        destination_issue_key: impl Into<String>,
        destination_issue_id: impl Into<String>,
        source_updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            source_issue_id: source_issue_id.into(),
            destination_issue_key: destination_issue_key.into(),
            destination_issue_id: destination_issue_id.into(),
            last_sync_time: Some(Utc::now()),
            source_updated_at,
            status: SyncStatus::Synced,
            synced_attachment_ids: BTreeSet::new(),
        }
    }

    /// Record a confirmed create/update against `source_updated_at`.
    pub fn mark_synced(&mut self, source_updated_at: Option<DateTime<Utc>>) {
        if source_updated_at.is_some() {
            self.source_updated_at = source_updated_at;
        }
        self.last_sync_time = Some(Utc::now());
        self.status = SyncStatus::Synced;
    }

    pub fn mark_error(&mut self) {
        self.last_sync_time = Some(Utc::now());
        self.status = SyncStatus::Error;
    }

    #[must_use]
    pub fn has_attachment(&self, attachment_id: &str) -> bool {
        self.synced_attachment_ids.contains(attachment_id)
    }

    /// Returns `true` if the id was not already recorded.
    pub fn mark_attachment_synced(&mut self, attachment_id: impl Into<String>) -> bool {
        self.synced_attachment_ids.insert(attachment_id.into())
    }
}
