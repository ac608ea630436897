//! Run orchestration: fetch from Linear, reconcile each issue, persist once.

use super::coordinator::{SyncCoordinator, determine_watermark};
use super::mapper::to_issue_input;
use super::reconciler::{IssueReconciler, ReconcileOptions};
use super::result::{IssueResult, SyncResult};
use crate::destination::IssueDestination;
use crate::error::SyncError;
use crate::model::Issue;
use crate::source::{AttachmentDownloader, IssueFilter, IssueSource};
use crate::state::SyncState;
use chrono::{DateTime, Utc};

/// Observer for per-issue progress, e.g. a terminal progress bar.
pub trait SyncProgress {
    fn start(&self, total: usize);
    fn advance(&self, result: &IssueResult);
    fn finish(&self);
}

pub struct Synchronizer<'a> {
    source: &'a dyn IssueSource,
    destination: &'a dyn IssueDestination,
    downloader: &'a dyn AttachmentDownloader,
    coordinator: SyncCoordinator,
    options: ReconcileOptions,
    progress: Option<&'a dyn SyncProgress>,
}

impl<'a> Synchronizer<'a> {
    /// The coordinator's dry-run flag overrides `options.dry_run`.
    #[must_use]
    pub fn new(
        source: &'a dyn IssueSource,
        destination: &'a dyn IssueDestination,
        downloader: &'a dyn AttachmentDownloader,
        coordinator: SyncCoordinator,
        options: ReconcileOptions,
    ) -> Self {
        let options = ReconcileOptions {
            dry_run: coordinator.is_dry_run(),
            ..options
        };
        Self {
            source,
            destination,
            downloader,
            coordinator,
            options,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn SyncProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Incremental batch sync.
    ///
    /// Individual issue failures are reported in `errors` but leave `success`
    /// set; only a failed fetch or state write marks the run unsuccessful.
    #[must_use]
    pub fn synchronize(
        &self,
        filter: &IssueFilter,
        since: Option<DateTime<Utc>>,
        force_full_sync: bool,
    ) -> SyncResult {
        let mut result = SyncResult::new();
        let mut state = self.coordinator.prepare();

        let watermark = determine_watermark(&state, since, force_full_sync);
        match watermark {
            Some(at) => tracing::info!(since = %at.to_rfc3339(), "Fetching Linear issues updated since watermark"),
            None => tracing::info!("Fetching all Linear issues (full sync)"),
        }
        let filter = filter.clone().with_updated_after(watermark);

        let issues = match self.source.fetch_issues(&filter) {
            Ok(issues) => issues,
            Err(e) => {
                tracing::error!("Failed to fetch Linear issues: {e}");
                result.fail(format!("Failed to fetch Linear issues: {e}"));
                result.finish();
                return result;
            }
        };
        tracing::info!(count = issues.len(), "Fetched Linear issues");

        self.reconcile_all(&mut state, &issues, &mut result);
        self.complete(state, &mut result);
        result.finish();

        tracing::info!("{}", result.short_summary());
        result
    }

    /// Sync exactly one issue by its human identifier (e.g. `ENG-123`).
    ///
    /// Unlike the batch entry point, any error marks the run unsuccessful.
    #[must_use]
    pub fn synchronize_single_issue(&self, identifier: &str) -> SyncResult {
        let mut result = SyncResult::new();
        let mut state = self.coordinator.prepare();

        let issue = match self.source.fetch_issue_by_identifier(identifier) {
            Ok(Some(issue)) => issue,
            Ok(None) => {
                tracing::warn!(identifier, "Linear issue not found");
                let missing = SyncError::IssueNotFound {
                    identifier: identifier.to_string(),
                };
                result.fail(missing.to_string());
                result.finish();
                return result;
            }
            Err(e) => {
                tracing::error!(identifier, "Failed to fetch Linear issue: {e}");
                result.fail(format!("Failed to fetch Linear issue {identifier}: {e}"));
                result.finish();
                return result;
            }
        };

        self.reconcile_all(&mut state, std::slice::from_ref(&issue), &mut result);
        self.complete(state, &mut result);
        result.success = result.errors.is_empty();
        result.finish();
        result
    }

    fn reconcile_all(&self, state: &mut SyncState, issues: &[Issue], result: &mut SyncResult) {
        let reconciler = IssueReconciler::new(self.destination, self.downloader, self.options);

        if let Some(progress) = self.progress {
            progress.start(issues.len());
        }
        for issue in issues {
            let input = to_issue_input(issue);
            let outcome = reconciler.reconcile(state, &input);
            if let Some(progress) = self.progress {
                progress.advance(&outcome);
            }
            result.add_issue_result(outcome);
        }
        if let Some(progress) = self.progress {
            progress.finish();
        }
    }

    /// Save only when something was created or updated. A run whose only
    /// outcome is a failed update leaves the file (and its watermark) alone,
    /// so the next incremental run fetches the issue again.
    fn complete(&self, state: SyncState, result: &mut SyncResult) {
        if let Err(e) = self.coordinator.complete(state, result.has_changes()) {
            tracing::error!("Failed to save sync state: {e}");
            result.fail(format!("Failed to save sync state: {e}"));
        }
    }
}
