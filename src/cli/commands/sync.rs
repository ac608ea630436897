//! Sync command implementation.

use super::print_json;
use crate::cli::SyncArgs;
use crate::config::{self, CliOverrides};
use crate::destination::JiraClient;
use crate::error::Result;
use crate::source::{HttpAttachmentDownloader, IssueFilter, LinearClient};
use crate::state::StateStore;
use crate::sync::{ReconcileOptions, SyncCoordinator, SyncResult, Synchronizer};
use crate::util::{SyncProgressBar, parse_since};
use std::fmt::Write;
use tracing::info;

/// Execute the sync command.
///
/// Returns the run's success flag.
///
/// # Errors
///
/// Returns an error for configuration problems or an invalid `--updated-after`.
/// Failures during the run itself are reported in the printed result.
pub fn execute(args: &SyncArgs, json: bool, quiet: bool, cli: &CliOverrides) -> Result<bool> {
    let since = args.updated_after.as_deref().map(parse_since).transpose()?;

    let overrides = CliOverrides {
        dry_run: args.dry_run.then_some(true),
        ..cli.clone()
    };
    let config = config::load_config(&overrides)?;
    config.validate()?;

    let source = LinearClient::from_config(&config)?;
    let destination = JiraClient::from_config(&config)?;
    let downloader = HttpAttachmentDownloader::from_config(&config)?;
    let coordinator = SyncCoordinator::new(
        StateStore::from_config(&config),
        config.dry_run,
        args.dry_run,
    );
    let options = ReconcileOptions {
        dry_run: false,
        attachments_enabled: config.attachment_sync_enabled,
        status_sync: config.enable_status_sync,
    };

    let progress = SyncProgressBar::for_terminal(quiet || json);
    let synchronizer = Synchronizer::new(&source, &destination, &downloader, coordinator, options)
        .with_progress(&progress);
    let dry_run = synchronizer.is_dry_run();
    info!(dry_run, "Starting Linear to Jira sync");

    let result = if let Some(identifier) = &args.issue {
        synchronizer.synchronize_single_issue(identifier)
    } else {
        let filter = IssueFilter {
            team: args.team.clone(),
            state_type: args.state,
            updated_after: None,
        };
        synchronizer.synchronize(&filter, since, args.force_full_sync)
    };

    if json {
        print_json(&result)?;
    } else if !quiet {
        print!("{}", render_result(&result, dry_run));
    }
    Ok(result.success)
}

fn render_result(result: &SyncResult, dry_run: bool) -> String {
    let mut out = String::new();
    if dry_run {
        for issue in result.issue_results.iter().filter(|r| r.dry_run) {
            let _ = writeln!(
                out,
                "[dry-run] {}: {}",
                issue.identifier,
                issue.message.as_deref().unwrap_or_default()
            );
        }
    }
    let _ = writeln!(out, "{}", result.short_summary());
    if !result.errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        for error in &result.errors {
            let _ = writeln!(out, "  - {error}");
        }
    }
    out
}
