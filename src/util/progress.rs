//! Terminal progress for sync runs.

use crate::sync::{IssueAction, IssueResult, SyncProgress};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};

/// Progress is shown only if stderr is an interactive terminal.
#[must_use]
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Create a determinate progress bar.
///
/// # Panics
/// Panics if the progress bar template string is invalid.
#[must_use]
pub fn create_progress_bar(total: u64, message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);

    if show {
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .expect("valid template")
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}

/// Progress bar over the issues of one sync run.
///
/// The bar is created lazily once the issue count is known.
pub struct SyncProgressBar {
    bar: ProgressBar,
    showing: bool,
}

impl SyncProgressBar {
    #[must_use]
    pub fn new(show: bool) -> Self {
        Self {
            bar: create_progress_bar(0, "Syncing issues", show),
            showing: show,
        }
    }

    /// Visible only on a terminal and when not quiet.
    #[must_use]
    pub fn for_terminal(quiet: bool) -> Self {
        Self::new(!quiet && should_show_progress())
    }

    #[must_use]
    pub const fn is_showing(&self) -> bool {
        self.showing
    }
}

impl SyncProgress for SyncProgressBar {
    fn start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn advance(&self, result: &IssueResult) {
        let verb = match (result.success, result.action) {
            (false, _) => "failed",
            (true, IssueAction::Create) => "created",
            (true, IssueAction::Update) => "updated",
            (true, IssueAction::Skip) => "skipped",
        };
        self.bar.set_message(format!("{} {verb}", result.identifier));
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_hidden_when_not_shown() {
        let pb = create_progress_bar(100, "Test", false);
        pb.inc(50);
        pb.finish();
    }

    #[test]
    fn test_sync_progress_bar_tracks_position() {
        let progress = SyncProgressBar::new(false);
        assert!(!progress.is_showing());
        progress.start(2);
        progress.advance(&IssueResult::created("lin-1", "ENG-1", "PROJ-1"));
        assert_eq!(progress.bar.position(), 1);
        assert_eq!(progress.bar.length(), Some(2));
        progress.finish();
    }

    #[test]
    fn test_quiet_never_shows() {
        assert!(!SyncProgressBar::for_terminal(true).is_showing());
    }
}
