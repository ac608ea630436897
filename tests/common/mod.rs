#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use linear_jira_sync::model::{Connection, Issue};
use linear_jira_sync::state::StateStore;
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

pub mod cli;
pub mod fakes;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        linear_jira_sync::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

/// `2024-06-01T12:00:00Z`
pub fn t1() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn linear_issue(id: &str, identifier: &str, updated_at: DateTime<Utc>) -> Issue {
    Issue {
        id: id.to_string(),
        identifier: identifier.to_string(),
        title: format!("{identifier} title"),
        description: Some("Steps to reproduce".to_string()),
        priority: Some(2),
        state: None,
        assignee: None,
        creator: None,
        team: None,
        labels: Connection::default(),
        comments: Connection::default(),
        attachments: Connection::default(),
        created_at: Some(updated_at),
        updated_at: Some(updated_at),
        url: Some(format!("https://linear.app/acme/issue/{identifier}")),
    }
}

/// A state store inside a fresh temp dir.
pub fn temp_store(max_backups: usize) -> (TempDir, StateStore) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path().join(".syncstate.json"), max_backups);
    (dir, store)
}
