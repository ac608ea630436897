//! Run lifecycle around the state document: load, back up, save.

use crate::error::Result;
use crate::state::{StateStore, SyncState};
use chrono::{DateTime, Utc};

/// Wraps a run with state loading and saving, and owns the dry-run flag.
pub struct SyncCoordinator {
    store: StateStore,
    dry_run: bool,
}

impl SyncCoordinator {
    /// `dry_run` is the configured default; `dry_run_override` comes from the
    /// caller. Either one switches the run to dry-run.
    #[must_use]
    pub const fn new(store: StateStore, dry_run: bool, dry_run_override: bool) -> Self {
        Self {
            store,
            dry_run: dry_run || dry_run_override,
        }
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    #[must_use]
    pub const fn store(&self) -> &StateStore {
        &self.store
    }

    /// Load, repair, and (outside dry-run) back up the state.
    #[must_use]
    pub fn prepare(&self) -> SyncState {
        let state = StateStore::validate(self.store.load());

        if self.dry_run {
            tracing::debug!("Dry run: skipping state backup");
        } else if let Err(e) = self.store.backup() {
            tracing::warn!(path = %self.store.path().display(), "State backup failed: {e}");
        }
        state
    }

    /// Persist `state` when the run changed something and is not a dry run.
    ///
    /// Returns whether the state was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn complete(&self, mut state: SyncState, has_changes: bool) -> Result<bool> {
        if self.dry_run {
            tracing::debug!("Dry run: not saving state");
            return Ok(false);
        }
        if !has_changes {
            tracing::debug!("No changes, state left untouched");
            return Ok(false);
        }
        self.store.save(&mut state)?;
        Ok(true)
    }
}

/// Effective lower bound for the Source fetch.
///
/// Precedence: a forced full sync wins, then an explicit `since`, then the
/// state's last sync time. `None` means fetch everything.
#[must_use]
pub fn determine_watermark(
    state: &SyncState,
    requested_since: Option<DateTime<Utc>>,
    force_full_sync: bool,
) -> Option<DateTime<Utc>> {
    if force_full_sync {
        return None;
    }
    requested_since.or(state.last_sync_time)
}
