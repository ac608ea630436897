//! Per-run report types.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt::Write;

/// What the reconciler decided for one issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueAction {
    Create,
    Update,
    Skip,
}

/// Outcome of reconciling one Source issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueResult {
    pub source_id: String,
    pub identifier: String,
    pub destination_key: Option<String>,
    pub action: IssueAction,
    pub success: bool,
    pub message: Option<String>,
    /// Reported by a dry run; nothing was written.
    pub dry_run: bool,
}

impl IssueResult {
    fn new(
        source_id: &str,
        identifier: &str,
        destination_key: Option<&str>,
        action: IssueAction,
        success: bool,
        message: Option<String>,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            identifier: identifier.to_string(),
            destination_key: destination_key.map(str::to_string),
            action,
            success,
            message,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn created(source_id: &str, identifier: &str, key: &str) -> Self {
        Self::new(source_id, identifier, Some(key), IssueAction::Create, true, None)
    }

    #[must_use]
    pub fn updated(source_id: &str, identifier: &str, key: &str) -> Self {
        Self::new(source_id, identifier, Some(key), IssueAction::Update, true, None)
    }

    #[must_use]
    pub fn skipped(source_id: &str, identifier: &str, key: &str) -> Self {
        Self::new(
            source_id,
            identifier,
            Some(key),
            IssueAction::Skip,
            true,
            Some("No changes since last sync".to_string()),
        )
    }

    #[must_use]
    pub fn would_create(source_id: &str, identifier: &str) -> Self {
        Self {
            dry_run: true,
            ..Self::new(
                source_id,
                identifier,
                None,
                IssueAction::Create,
                true,
                Some("Would create new Jira issue".to_string()),
            )
        }
    }

    #[must_use]
    pub fn would_update(source_id: &str, identifier: &str, key: &str) -> Self {
        Self {
            dry_run: true,
            ..Self::new(
                source_id,
                identifier,
                Some(key),
                IssueAction::Update,
                true,
                Some(format!("Would update Jira issue {key}")),
            )
        }
    }

    #[must_use]
    pub fn failed(
        source_id: &str,
        identifier: &str,
        key: Option<&str>,
        action: IssueAction,
        message: impl Into<String>,
    ) -> Self {
        Self::new(source_id, identifier, key, action, false, Some(message.into()))
    }
}

/// Report of one sync run. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub success: bool,
    pub created_count: usize,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub issue_results: Vec<IssueResult>,
    pub errors: Vec<String>,
}

impl Default for SyncResult {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncResult {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            end_time: None,
            success: true,
            created_count: 0,
            updated_count: 0,
            skipped_count: 0,
            issue_results: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Count and record one issue outcome.
    pub fn add_issue_result(&mut self, result: IssueResult) {
        if result.success {
            match result.action {
                IssueAction::Create if !result.dry_run => self.created_count += 1,
                IssueAction::Update if !result.dry_run => self.updated_count += 1,
                IssueAction::Skip => self.skipped_count += 1,
                IssueAction::Create | IssueAction::Update => {}
            }
        } else {
            let message = result.message.as_deref().unwrap_or("unknown error");
            self.errors
                .push(format!("{}: {message}", result.identifier));
        }
        self.issue_results.push(result);
    }

    /// Abort the run with a single run-level error.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_time.unwrap_or_else(Utc::now) - self.start_time
    }

    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.created_count > 0 || self.updated_count > 0
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// One-line outcome, e.g. `Done - 1 created, 2 skipped`.
    #[must_use]
    pub fn short_summary(&self) -> String {
        let parts: Vec<String> = [
            (self.created_count, "created"),
            (self.updated_count, "updated"),
            (self.skipped_count, "skipped"),
            (self.error_count(), "errors"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect();

        if parts.is_empty() {
            "Done - no changes".to_string()
        } else {
            format!("Done - {}", parts.join(", "))
        }
    }

    /// Multi-line report.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Success: {}", self.success);
        let _ = writeln!(out, "Duration: {}ms", self.duration().num_milliseconds());
        let _ = writeln!(out, "Created: {}", self.created_count);
        let _ = writeln!(out, "Updated: {}", self.updated_count);
        let _ = writeln!(out, "Skipped: {}", self.skipped_count);
        let _ = writeln!(out, "Errors: {}", self.errors.len());
        for error in &self.errors {
            let _ = writeln!(out, "  - {error}");
        }
        out
    }
}
