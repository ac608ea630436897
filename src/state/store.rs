//! On-disk persistence for `SyncState`.
//!
//! This module handles:
//! - Loading the state document, degrading to a fresh state on any failure
//! - Repairing loaded documents
//! - Atomic saves (temp file, fsync, rename)
//! - Timestamped backups rotated to the N most recent

use super::{CURRENT_VERSION, SyncState};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Marker between the state file name and the backup timestamp.
const BACKUP_MARKER: &str = ".backup.";

/// Reads and writes the state document at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    max_backups: usize,
    backup_dir: Option<PathBuf>,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            path: path.into(),
            max_backups,
            backup_dir: None,
        }
    }

    /// Keep backups in `dir` instead of next to the state file.
    #[must_use]
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        let store = Self::new(config.state_file(), config.max_backups);
        match &config.backup_location {
            Some(dir) => store.with_backup_dir(dir),
            None => store,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the state document.
    ///
    /// A missing, unreadable, or corrupt file yields a fresh state. The
    /// failure is logged; it never reaches the caller.
    #[must_use]
    pub fn load(&self) -> SyncState {
        if !self.exists() {
            tracing::debug!(path = %self.path.display(), "No sync state yet, starting fresh");
            return SyncState::fresh();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read sync state, starting fresh: {e}");
                return SyncState::fresh();
            }
        };

        match serde_json::from_str::<SyncState>(&contents) {
            Ok(state) => {
                tracing::debug!(
                    path = %self.path.display(),
                    issues = state.synced_issues.len(),
                    "Loaded sync state"
                );
                state
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Sync state is corrupt, starting fresh: {e}");
                SyncState::fresh()
            }
        }
    }

    /// Repair a loaded document.
    ///
    /// Fills a blank version and evicts records missing their Source id or
    /// Destination key. Applying it twice changes nothing further.
    #[must_use]
    pub fn validate(mut state: SyncState) -> SyncState {
        if state.version.trim().is_empty() {
            state.version = CURRENT_VERSION.to_string();
        }

        let before = state.synced_issues.len();
        state.synced_issues.retain(|key, issue| {
            if issue.source_issue_id.trim().is_empty() && !key.trim().is_empty() {
                issue.source_issue_id.clone_from(key);
            }
            !issue.source_issue_id.trim().is_empty()
                && !issue.destination_issue_key.trim().is_empty()
        });

        let evicted = before - state.synced_issues.len();
        if evicted > 0 {
            tracing::warn!(evicted, "Dropped incomplete sync state entries");
        }
        state
    }

    /// Stamp `last_sync_time` and atomically rewrite the document.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::StateWrite` if any step of the write fails.
    pub fn save(&self, state: &mut SyncState) -> Result<()> {
        state.last_sync_time = Some(Utc::now());
        let json = serde_json::to_string_pretty(state)?;

        let write_err = |source: std::io::Error| SyncError::StateWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        if let Err(e) = write_then_rename(&temp_path, &self.path, json.as_bytes()) {
            match fs::remove_file(&temp_path) {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %temp_path.display(), "Failed to remove temp state file: {cleanup}");
                }
                _ => {}
            }
            return Err(write_err(e));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = fs::set_permissions(&self.path, perms) {
                tracing::warn!(path = %self.path.display(), "Failed to restrict state file permissions: {e}");
            }
        }

        tracing::info!(
            path = %self.path.display(),
            issues = state.synced_issues.len(),
            "Saved sync state"
        );
        Ok(())
    }

    /// Copy the current file to `<name>.backup.<millis>` and rotate.
    ///
    /// A name already taken within the same millisecond is bumped to the next
    /// free one, so an earlier backup is never overwritten.
    ///
    /// Returns the backup path, or `None` when there is nothing to back up.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy or the rotation fails.
    pub fn backup(&self) -> Result<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }

        if let Some(dir) = &self.backup_dir {
            fs::create_dir_all(dir)?;
        }
        let mut millis = Utc::now().timestamp_millis();
        let mut backup_path = self.backup_path(millis);
        while backup_path.exists() {
            millis += 1;
            backup_path = self.backup_path(millis);
        }
        fs::copy(&self.path, &backup_path)?;
        tracing::debug!("Created backup: {}", backup_path.display());

        self.rotate_backups()?;
        Ok(Some(backup_path))
    }

    /// Delete all but the `max_backups` most recent backups.
    ///
    /// A backup that cannot be removed is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backups cannot be listed.
    pub fn rotate_backups(&self) -> Result<usize> {
        let backups = self.list_backups()?;
        let mut deleted_count = 0;

        for path in backups.iter().skip(self.max_backups) {
            match fs::remove_file(path) {
                Ok(()) => deleted_count += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to delete old backup: {e}");
                }
            }
        }

        if deleted_count > 0 {
            tracing::debug!("Pruned {} old backup(s)", deleted_count);
        }
        Ok(deleted_count)
    }

    /// List backups of this state file, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let Some(dir) = self.backups_dir() else {
            return Ok(Vec::new());
        };
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}{BACKUP_MARKER}", self.file_name());
        let mut backups: Vec<(i64, PathBuf)> = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(millis) = name
                .strip_prefix(&prefix)
                .and_then(|ts| ts.parse::<i64>().ok())
            else {
                continue;
            };
            backups.push((millis, path));
        }

        backups.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Remove the state file. Missing files are not an error.
    ///
    /// Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Deleted sync state");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn dir(&self) -> Option<&Path> {
        match self.path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Some(Path::new(".")),
            other => other,
        }
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| "state".to_string(), |n| n.to_string_lossy().to_string())
    }

    fn backups_dir(&self) -> Option<&Path> {
        self.backup_dir.as_deref().or_else(|| self.dir())
    }

    fn backup_path(&self, millis: i64) -> PathBuf {
        let name = format!("{}{BACKUP_MARKER}{millis}", self.file_name());
        self.backups_dir()
            .map_or_else(|| PathBuf::from(&name), |dir| dir.join(&name))
    }
}

fn write_then_rename(temp_path: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(temp_path)?);
    writer.write_all(contents)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(std::io::IntoInnerError::into_error)?
        .sync_all()?;
    fs::rename(temp_path, path)
}
