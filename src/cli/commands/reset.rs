//! Reset command implementation.

use super::print_json;
use crate::cli::ResetArgs;
use crate::config::{self, CliOverrides};
use crate::error::Result;
use crate::state::StateStore;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ResetOutcome {
    state_file: PathBuf,
    deleted: bool,
    backup: Option<PathBuf>,
    confirmed: bool,
}

/// Execute the reset command.
///
/// Without `--yes` nothing is touched.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the file cannot be
/// backed up or removed.
pub fn execute(args: &ResetArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let config = config::load_config(cli)?;
    let store = StateStore::from_config(&config);
    let outcome = reset(&store, args.yes)?;

    if json {
        return print_json(&outcome);
    }
    if !outcome.confirmed {
        if store.exists() {
            println!(
                "Would delete {}. Re-run with --yes to confirm.",
                store.path().display()
            );
        } else {
            println!("Nothing to reset: {} does not exist.", store.path().display());
        }
        return Ok(());
    }
    match (&outcome.backup, outcome.deleted) {
        (Some(backup), true) => println!(
            "Deleted {} (backup: {})",
            store.path().display(),
            backup.display()
        ),
        (None, true) => println!("Deleted {}", store.path().display()),
        (_, false) => println!("Nothing to reset: {} does not exist.", store.path().display()),
    }
    Ok(())
}

fn reset(store: &StateStore, confirmed: bool) -> Result<ResetOutcome> {
    let mut outcome = ResetOutcome {
        state_file: store.path().to_path_buf(),
        deleted: false,
        backup: None,
        confirmed,
    };
    if !confirmed {
        return Ok(outcome);
    }
    outcome.backup = store.backup()?;
    outcome.deleted = store.delete()?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SyncState;
    use tempfile::TempDir;

    fn seeded() -> (TempDir, StateStore) {
        let temp = TempDir::new().expect("tempdir");
        let store = StateStore::new(temp.path().join(".syncstate.json"), 5);
        store.save(&mut SyncState::fresh()).expect("save");
        (temp, store)
    }

    #[test]
    fn test_unconfirmed_reset_keeps_file() {
        let (_temp, store) = seeded();
        let outcome = reset(&store, false).expect("reset");
        assert!(!outcome.deleted);
        assert!(store.exists());
    }

    #[test]
    fn test_confirmed_reset_backs_up_and_deletes() {
        let (_temp, store) = seeded();
        let outcome = reset(&store, true).expect("reset");
        assert!(outcome.deleted);
        assert!(outcome.backup.as_ref().is_some_and(|p| p.exists()));
        assert!(!store.exists());

        let again = reset(&store, true).expect("idempotent");
        assert!(!again.deleted);
        assert!(again.backup.is_none());
    }
}
