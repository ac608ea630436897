//! In-memory collaborators for unit tests.

use crate::destination::{Account, CreatedIssue, IssueDestination, IssueType};
use crate::error::{Result, SyncError};
use crate::model::{AttachmentInput, Issue, IssueInput, StateType, User};
use crate::source::{AttachmentDownloader, DownloadedFile, IssueFilter, IssueSource};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn issue(id: &str, identifier: &str, updated_at: Option<DateTime<Utc>>) -> Issue {
    Issue {
        id: id.to_string(),
        identifier: identifier.to_string(),
        title: format!("Title of {identifier}"),
        description: Some("Body".to_string()),
        priority: Some(3),
        state: None,
        assignee: None,
        creator: None,
        team: None,
        labels: crate::model::Connection::default(),
        comments: crate::model::Connection::default(),
        attachments: crate::model::Connection::default(),
        created_at: updated_at,
        updated_at,
        url: None,
    }
}

#[derive(Default)]
pub struct FakeSource {
    issues: Mutex<Vec<Issue>>,
    fail: Mutex<bool>,
    filters: Mutex<Vec<IssueFilter>>,
}

impl FakeSource {
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
            ..Self::default()
        }
    }

    pub fn set_issues(&self, issues: Vec<Issue>) {
        *self.issues.lock().unwrap() = issues;
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn last_filter(&self) -> Option<IssueFilter> {
        self.filters.lock().unwrap().last().cloned()
    }
}

impl IssueSource for FakeSource {
    fn fetch_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.filters.lock().unwrap().push(filter.clone());
        if *self.fail.lock().unwrap() {
            return Err(SyncError::source_api(Some(503), "unavailable"));
        }
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|i| match (filter.updated_after, i.updated_at) {
                (Some(after), Some(updated)) => updated >= after,
                _ => true,
            })
            .cloned()
            .collect())
    }

    fn fetch_issue_by_identifier(&self, identifier: &str) -> Result<Option<Issue>> {
        if *self.fail.lock().unwrap() {
            return Err(SyncError::source_api(Some(503), "unavailable"));
        }
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.identifier == identifier)
            .cloned())
    }

    fn test_connection(&self) -> Result<User> {
        Ok(User::default())
    }
}

#[derive(Default)]
struct DestinationState {
    next_number: u32,
    issues: HashMap<String, IssueInput>,
    comments: HashMap<String, Vec<String>>,
    uploads: Vec<(String, String)>,
    transitions: Vec<(String, StateType)>,
    by_source: HashMap<String, String>,
    creates: usize,
    updates: usize,
    fail_create: bool,
    fail_update: bool,
    fail_uploads: bool,
    fail_listing: bool,
    fail_comments_containing: Option<String>,
}

#[derive(Default)]
pub struct FakeDestination {
    state: Mutex<DestinationState>,
}

impl FakeDestination {
    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_update(&self, fail: bool) {
        self.state.lock().unwrap().fail_update = fail;
    }

    pub fn fail_uploads(&self) {
        self.state.lock().unwrap().fail_uploads = true;
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().fail_listing = true;
    }

    pub fn fail_comments_containing(&self, needle: &str) {
        self.state.lock().unwrap().fail_comments_containing = Some(needle.to_string());
    }

    pub fn link_existing(&self, source_id: &str, key: &str) {
        self.state
            .lock()
            .unwrap()
            .by_source
            .insert(source_id.to_string(), key.to_string());
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn update_count(&self) -> usize {
        self.state.lock().unwrap().updates
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    pub fn transitions(&self) -> Vec<(String, StateType)> {
        self.state.lock().unwrap().transitions.clone()
    }

    pub fn comments_for(&self, key: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

impl IssueDestination for FakeDestination {
    fn create_issue(&self, issue: &IssueInput) -> Result<CreatedIssue> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(SyncError::destination(400, "create rejected"));
        }
        state.next_number += 1;
        state.creates += 1;
        let key = format!("PROJ-{}", state.next_number);
        state.issues.insert(key.clone(), issue.clone());
        Ok(CreatedIssue {
            id: (10_000 + state.next_number).to_string(),
            key,
        })
    }

    fn update_issue(&self, key: &str, issue: &IssueInput) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_update {
            return Err(SyncError::destination(500, "update rejected"));
        }
        state.updates += 1;
        state.issues.insert(key.to_string(), issue.clone());
        Ok(())
    }

    fn find_by_source_id(&self, source_id: &str) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().by_source.get(source_id).cloned())
    }

    fn add_comment(&self, key: &str, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(needle) = &state.fail_comments_containing {
            if text.contains(needle.as_str()) {
                return Err(SyncError::destination(400, "comment rejected"));
            }
        }
        state
            .comments
            .entry(key.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    fn list_comments(&self, key: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(SyncError::destination(503, "listing unavailable"));
        }
        Ok(state.comments.get(key).cloned().unwrap_or_default())
    }

    fn upload_attachment(&self, key: &str, file: &DownloadedFile) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state.fail_uploads {
            return Err(SyncError::destination(413, "too large"));
        }
        assert!(file.path().exists(), "temp file must exist during upload");
        state.uploads.push((key.to_string(), file.file_name.clone()));
        Ok(true)
    }

    fn transition_status(&self, key: &str, state_type: StateType) -> Result<bool> {
        self.state
            .lock()
            .unwrap()
            .transitions
            .push((key.to_string(), state_type));
        Ok(true)
    }

    fn test_connection(&self) -> Result<Account> {
        Ok(Account::default())
    }

    fn issue_types(&self) -> Result<Vec<IssueType>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    fail: bool,
    downloads: Mutex<usize>,
}

impl FakeDownloader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn download_count(&self) -> usize {
        *self.downloads.lock().unwrap()
    }
}

impl AttachmentDownloader for FakeDownloader {
    fn download(&self, attachment: &AttachmentInput) -> Result<Option<DownloadedFile>> {
        *self.downloads.lock().unwrap() += 1;
        if self.fail {
            return Ok(None);
        }
        let name = attachment.title.clone().unwrap_or_else(|| "file".to_string());
        DownloadedFile::from_bytes(name, b"payload").map(Some)
    }
}
