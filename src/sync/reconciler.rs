//! Per-issue create/update/skip decision.
//!
//! An issue is NEW when the state has no record for its Source id, and KNOWN
//! otherwise. NEW issues are created; KNOWN issues are updated only when the
//! Source `updatedAt` is strictly after the stored baseline.

use super::result::{IssueAction, IssueResult};
use super::subresources::SubResourceReconciler;
use crate::destination::IssueDestination;
use crate::model::IssueInput;
use crate::source::AttachmentDownloader;
use crate::state::{SyncState, SyncedIssue};
use chrono::{DateTime, Utc};

/// Switches that shape how an issue is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub dry_run: bool,
    pub attachments_enabled: bool,
    pub status_sync: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            attachments_enabled: true,
            status_sync: true,
        }
    }
}

/// Whether a KNOWN issue must be pushed again.
///
/// Equal timestamps count as unchanged.
#[must_use]
pub fn needs_update(updated_at: Option<DateTime<Utc>>, baseline: Option<DateTime<Utc>>) -> bool {
    match (updated_at, baseline) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(updated), Some(baseline)) => updated > baseline,
    }
}

pub struct IssueReconciler<'a> {
    destination: &'a dyn IssueDestination,
    subresources: SubResourceReconciler<'a>,
    options: ReconcileOptions,
}

impl<'a> IssueReconciler<'a> {
    #[must_use]
    pub fn new(
        destination: &'a dyn IssueDestination,
        downloader: &'a dyn AttachmentDownloader,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            destination,
            subresources: SubResourceReconciler::new(
                destination,
                downloader,
                options.attachments_enabled,
            ),
            options,
        }
    }

    /// Reconcile one issue against `state`, mutating it on success.
    pub fn reconcile(&self, state: &mut SyncState, issue: &IssueInput) -> IssueResult {
        match state.get(&issue.id) {
            None => self.reconcile_new(state, issue),
            Some(record) => {
                let key = record.destination_issue_key.clone();
                if needs_update(issue.updated_at, record.source_updated_at) {
                    self.reconcile_update(state, issue, &key)
                } else {
                    tracing::debug!(issue = %issue.identifier, key = %key, "No changes, skipping");
                    IssueResult::skipped(&issue.id, &issue.identifier, &key)
                }
            }
        }
    }

    fn reconcile_new(&self, state: &mut SyncState, issue: &IssueInput) -> IssueResult {
        if self.options.dry_run {
            tracing::info!(issue = %issue.identifier, "Dry run: would create Jira issue");
            return IssueResult::would_create(&issue.id, &issue.identifier);
        }

        // A lost state file must not turn into duplicate issues.
        match self.destination.find_by_source_id(&issue.id) {
            Ok(Some(key)) => {
                tracing::info!(issue = %issue.identifier, key = %key, "Linked existing Jira issue");
                state.record(SyncedIssue::new(&issue.id, &key, "", None));
                return self.reconcile_update(state, issue, &key);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(issue = %issue.identifier, "Lookup by Linear id failed: {e}");
            }
        }

        let created = match self.destination.create_issue(issue) {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(issue = %issue.identifier, "Failed to create Jira issue: {e}");
                return IssueResult::failed(
                    &issue.id,
                    &issue.identifier,
                    None,
                    IssueAction::Create,
                    format!("Failed to create Jira issue: {e}"),
                );
            }
        };

        let mut record = SyncedIssue::new(&issue.id, &created.key, &created.id, None);
        self.after_write(issue, &created.key, &mut record);
        record.mark_synced(issue.updated_at);
        state.record(record);

        tracing::info!(issue = %issue.identifier, key = %created.key, "Created");
        IssueResult::created(&issue.id, &issue.identifier, &created.key)
    }

    fn reconcile_update(&self, state: &mut SyncState, issue: &IssueInput, key: &str) -> IssueResult {
        if self.options.dry_run {
            tracing::info!(issue = %issue.identifier, key, "Dry run: would update Jira issue");
            return IssueResult::would_update(&issue.id, &issue.identifier, key);
        }

        let Some(record) = state.get_mut(&issue.id) else {
            return IssueResult::failed(
                &issue.id,
                &issue.identifier,
                Some(key),
                IssueAction::Update,
                "sync state record disappeared",
            );
        };

        if let Err(e) = self.destination.update_issue(key, issue) {
            tracing::error!(issue = %issue.identifier, key, "Failed to update Jira issue: {e}");
            record.mark_error();
            return IssueResult::failed(
                &issue.id,
                &issue.identifier,
                Some(key),
                IssueAction::Update,
                format!("Failed to update Jira issue {key}: {e}"),
            );
        }

        self.after_write(issue, key, record);
        record.mark_synced(issue.updated_at);

        tracing::info!(issue = %issue.identifier, key, "Updated");
        IssueResult::updated(&issue.id, &issue.identifier, key)
    }

    /// Best-effort work after a confirmed create/update. Never fails the issue.
    fn after_write(&self, issue: &IssueInput, key: &str, record: &mut SyncedIssue) {
        if let Err(e) = self.subresources.propagate(key, issue, record) {
            tracing::warn!(issue = %issue.identifier, key, "Comment/attachment sync failed: {e}");
        }

        if let Some(state_type) = issue.state_type.filter(|_| self.options.status_sync) {
            if let Err(e) = self.destination.transition_status(key, state_type) {
                tracing::warn!(issue = %issue.identifier, key, "Status transition failed: {e}");
            }
        }
    }
}
