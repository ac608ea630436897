//! Status command implementation.
//!
//! Summarizes the local state document. Needs no credentials.

use super::print_json;
use crate::config::{self, CliOverrides};
use crate::error::Result;
use crate::state::{StateStore, SyncState, SyncStatus};
use crate::util::format_timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub state_file: PathBuf,
    pub exists: bool,
    pub version: String,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub tracked_issues: usize,
    pub synced: usize,
    pub errors: usize,
    pub backups: usize,
    pub error_issues: Vec<ErrorIssue>,
}

#[derive(Debug, Serialize)]
pub struct ErrorIssue {
    pub source_issue_id: String,
    pub destination_issue_key: String,
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl StatusReport {
    #[must_use]
    pub fn build(store: &StateStore, state: &SyncState, backups: usize) -> Self {
        let error_issues = state
            .synced_issues
            .values()
            .filter(|issue| issue.status == SyncStatus::Error)
            .map(|issue| ErrorIssue {
                source_issue_id: issue.source_issue_id.clone(),
                destination_issue_key: issue.destination_issue_key.clone(),
                last_sync_time: issue.last_sync_time,
            })
            .collect();

        Self {
            state_file: store.path().to_path_buf(),
            exists: store.exists(),
            version: state.version.clone(),
            last_sync_time: state.last_sync_time,
            tracked_issues: state.synced_issues.len(),
            synced: state.count_with_status(SyncStatus::Synced),
            errors: state.count_with_status(SyncStatus::Error),
            backups,
            error_issues,
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "State file:     {}", self.state_file.display());
        if !self.exists {
            let _ = writeln!(out, "No sync has been recorded yet.");
            return out;
        }
        let _ = writeln!(out, "Version:        {}", self.version);
        let _ = writeln!(out, "Last sync:      {}", format_timestamp(self.last_sync_time));
        let _ = writeln!(out, "Tracked issues: {}", self.tracked_issues);
        let _ = writeln!(out, "  Synced:       {}", self.synced);
        let _ = writeln!(out, "  Error:        {}", self.errors);
        let _ = writeln!(out, "Backups:        {}", self.backups);
        if !self.error_issues.is_empty() {
            let _ = writeln!(out, "\nIssues in ERROR:");
            for issue in &self.error_issues {
                let _ = writeln!(
                    out,
                    "  {} -> {} (last attempt {})",
                    issue.source_issue_id,
                    issue.destination_issue_key,
                    format_timestamp(issue.last_sync_time)
                );
            }
        }
        out
    }
}

/// Execute the status command.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or backups cannot be listed.
pub fn execute(json: bool, cli: &CliOverrides) -> Result<()> {
    let config = config::load_config(cli)?;
    let store = StateStore::from_config(&config);
    let state = StateStore::validate(store.load());
    let report = StatusReport::build(&store, &state, store.list_backups()?.len());

    if json {
        print_json(&report)?;
    } else {
        print!("{}", report.render());
    }
    Ok(())
}
