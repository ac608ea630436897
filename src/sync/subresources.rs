//! Idempotent propagation of comments and attachments.
//!
//! Comments are deduplicated by rendered text because the Destination keeps
//! no foreign id for them. Attachments are deduplicated by Source id via
//! `SyncedIssue::synced_attachment_ids`.

use crate::destination::{IssueDestination, markup};
use crate::error::Result;
use crate::model::{AttachmentInput, CommentInput, IssueInput};
use crate::source::AttachmentDownloader;
use crate::state::SyncedIssue;
use serde::Serialize;
use std::collections::HashSet;

/// Classification of one attempted attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentOutcome {
    /// Uploaded; the id is recorded and never retried.
    Success,
    /// Deliberately not uploaded (sync disabled); posted as a comment.
    Skipped,
    /// Download or upload failed; retried next run.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubResourceReport {
    pub comments_added: usize,
    pub attachments_uploaded: usize,
    pub attachments_skipped: usize,
    pub attachments_failed: usize,
}

impl SubResourceReport {
    fn count(&mut self, outcome: AttachmentOutcome) {
        match outcome {
            AttachmentOutcome::Success => self.attachments_uploaded += 1,
            AttachmentOutcome::Skipped => self.attachments_skipped += 1,
            AttachmentOutcome::Failed => self.attachments_failed += 1,
        }
    }
}

/// Normalized form used for comment dedupe.
fn dedupe_key(text: &str) -> String {
    text.trim().to_string()
}

pub struct SubResourceReconciler<'a> {
    destination: &'a dyn IssueDestination,
    downloader: &'a dyn AttachmentDownloader,
    attachments_enabled: bool,
}

impl<'a> SubResourceReconciler<'a> {
    #[must_use]
    pub fn new(
        destination: &'a dyn IssueDestination,
        downloader: &'a dyn AttachmentDownloader,
        attachments_enabled: bool,
    ) -> Self {
        Self {
            destination,
            downloader,
            attachments_enabled,
        }
    }

    /// Propagate every comment and unsynced attachment of `issue` to `key`.
    ///
    /// Individual comment and attachment failures are logged and absorbed.
    ///
    /// # Errors
    ///
    /// Returns an error only if existing Destination comments cannot be
    /// listed, since dedupe is impossible without them.
    pub fn propagate(
        &self,
        key: &str,
        issue: &IssueInput,
        synced: &mut SyncedIssue,
    ) -> Result<SubResourceReport> {
        let mut report = SubResourceReport::default();
        if issue.comments.is_empty() && issue.attachments.is_empty() {
            return Ok(report);
        }

        let mut existing: HashSet<String> = self
            .destination
            .list_comments(key)?
            .iter()
            .map(|text| dedupe_key(text))
            .filter(|text| !text.is_empty())
            .collect();

        report.comments_added = self.sync_comments(key, &issue.comments, &mut existing);

        let pending: Vec<&AttachmentInput> = issue
            .attachments
            .iter()
            .filter(|a| !synced.has_attachment(&a.id))
            .collect();
        for attachment in pending {
            let outcome = self.sync_attachment(key, attachment, &mut existing);
            if outcome == AttachmentOutcome::Success {
                synced.mark_attachment_synced(attachment.id.clone());
            }
            report.count(outcome);
        }

        if !issue.attachments.is_empty() {
            tracing::info!(
                issue = %issue.identifier,
                key,
                successful = report.attachments_uploaded,
                skipped = report.attachments_skipped,
                failed = report.attachments_failed,
                "Attachment sync finished"
            );
        }
        Ok(report)
    }

    /// Add each comment whose rendered text is not already on the issue.
    ///
    /// Returns the number of comments added.
    pub fn sync_comments(
        &self,
        key: &str,
        comments: &[CommentInput],
        existing: &mut HashSet<String>,
    ) -> usize {
        let mut added = 0;
        for comment in comments {
            let text = markup::format_comment(comment);
            match self.add_unique_comment(key, &text, existing) {
                Ok(true) => added += 1,
                Ok(false) => {
                    tracing::debug!(comment = %comment.id, key, "Comment already exists, skipping");
                }
                Err(e) => {
                    tracing::warn!(comment = %comment.id, key, "Failed to add comment: {e}");
                }
            }
        }
        added
    }

    /// Upload one attachment, falling back to an info comment on failure.
    pub fn sync_attachment(
        &self,
        key: &str,
        attachment: &AttachmentInput,
        existing: &mut HashSet<String>,
    ) -> AttachmentOutcome {
        if !self.attachments_enabled {
            self.post_fallback(key, attachment, existing);
            return AttachmentOutcome::Skipped;
        }

        let downloaded = match self.downloader.download(attachment) {
            Ok(Some(file)) => file,
            Ok(None) => {
                tracing::warn!(attachment = %attachment.id, key, "Attachment could not be downloaded");
                self.post_fallback(key, attachment, existing);
                return AttachmentOutcome::Failed;
            }
            Err(e) => {
                tracing::warn!(attachment = %attachment.id, key, "Attachment download failed: {e}");
                self.post_fallback(key, attachment, existing);
                return AttachmentOutcome::Failed;
            }
        };

        // `downloaded` owns the temp file and removes it when it goes out of scope.
        match self.destination.upload_attachment(key, &downloaded) {
            Ok(true) => {
                tracing::debug!(
                    attachment = %attachment.id,
                    key,
                    size = downloaded.size,
                    "Uploaded attachment"
                );
                AttachmentOutcome::Success
            }
            Ok(false) => {
                tracing::warn!(attachment = %attachment.id, key, "Upload returned no attachment");
                self.post_fallback(key, attachment, existing);
                AttachmentOutcome::Failed
            }
            Err(e) => {
                tracing::warn!(attachment = %attachment.id, key, "Attachment upload failed: {e}");
                self.post_fallback(key, attachment, existing);
                AttachmentOutcome::Failed
            }
        }
    }

    fn post_fallback(&self, key: &str, attachment: &AttachmentInput, existing: &mut HashSet<String>) {
        let text = markup::format_attachment(attachment);
        if let Err(e) = self.add_unique_comment(key, &text, existing) {
            tracing::warn!(attachment = %attachment.id, key, "Failed to post attachment info: {e}");
        }
    }

    fn add_unique_comment(
        &self,
        key: &str,
        text: &str,
        existing: &mut HashSet<String>,
    ) -> Result<bool> {
        let normalized = dedupe_key(text);
        if normalized.is_empty() || existing.contains(&normalized) {
            return Ok(false);
        }
        self.destination.add_comment(key, text)?;
        existing.insert(normalized);
        Ok(true)
    }
}
