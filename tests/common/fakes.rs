//! In-memory Linear and Jira stand-ins.

use linear_jira_sync::destination::{Account, CreatedIssue, IssueDestination, IssueType};
use linear_jira_sync::model::{AttachmentInput, Issue, IssueInput, StateType, User};
use linear_jira_sync::source::{AttachmentDownloader, DownloadedFile, IssueFilter, IssueSource};
use linear_jira_sync::{Result, SyncError};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryLinear {
    issues: Mutex<Vec<Issue>>,
    down: Mutex<bool>,
    filters: Mutex<Vec<IssueFilter>>,
}

impl MemoryLinear {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
            ..Self::default()
        }
    }

    pub fn replace(&self, issues: Vec<Issue>) {
        *self.issues.lock().unwrap() = issues;
    }

    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }

    pub fn filters(&self) -> Vec<IssueFilter> {
        self.filters.lock().unwrap().clone()
    }
}

impl IssueSource for MemoryLinear {
    fn fetch_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.filters.lock().unwrap().push(filter.clone());
        if *self.down.lock().unwrap() {
            return Err(SyncError::source_api(Some(502), "Bad Gateway"));
        }
        let issues = self.issues.lock().unwrap();
        Ok(issues
            .iter()
            .filter(|issue| match (filter.updated_after, issue.updated_at) {
                (Some(after), Some(updated)) => updated >= after,
                _ => true,
            })
            .cloned()
            .collect())
    }

    fn fetch_issue_by_identifier(&self, identifier: &str) -> Result<Option<Issue>> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .find(|issue| issue.identifier == identifier)
            .cloned())
    }

    fn test_connection(&self) -> Result<User> {
        Ok(User::default())
    }
}

#[derive(Default)]
struct JiraData {
    next: u32,
    issues: HashMap<String, IssueInput>,
    comments: HashMap<String, Vec<String>>,
    uploads: Vec<(String, String)>,
    creates: usize,
    updates: usize,
    reject_updates: bool,
    reject_uploads: bool,
}

#[derive(Default)]
pub struct MemoryJira {
    data: Mutex<JiraData>,
}

impl MemoryJira {
    pub fn reject_updates(&self, reject: bool) {
        self.data.lock().unwrap().reject_updates = reject;
    }

    pub fn reject_uploads(&self, reject: bool) {
        self.data.lock().unwrap().reject_uploads = reject;
    }

    pub fn creates(&self) -> usize {
        self.data.lock().unwrap().creates
    }

    pub fn updates(&self) -> usize {
        self.data.lock().unwrap().updates
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.data.lock().unwrap().uploads.clone()
    }

    pub fn comments(&self, key: &str) -> Vec<String> {
        self.data
            .lock()
            .unwrap()
            .comments
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn summary(&self, key: &str) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .issues
            .get(key)
            .map(|issue| issue.title.clone())
    }
}

impl IssueDestination for MemoryJira {
    fn create_issue(&self, issue: &IssueInput) -> Result<CreatedIssue> {
        let mut data = self.data.lock().unwrap();
        data.next += 1;
        data.creates += 1;
        let key = format!("PROJ-{}", data.next);
        data.issues.insert(key.clone(), issue.clone());
        Ok(CreatedIssue {
            id: (10_000 + data.next).to_string(),
            key,
        })
    }

    fn update_issue(&self, key: &str, issue: &IssueInput) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        if data.reject_updates {
            return Err(SyncError::destination(500, "Internal Server Error"));
        }
        data.updates += 1;
        data.issues.insert(key.to_string(), issue.clone());
        Ok(())
    }

    fn add_comment(&self, key: &str, text: &str) -> Result<()> {
        self.data
            .lock()
            .unwrap()
            .comments
            .entry(key.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    fn list_comments(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.comments(key))
    }

    fn upload_attachment(&self, key: &str, file: &DownloadedFile) -> Result<bool> {
        let mut data = self.data.lock().unwrap();
        if data.reject_uploads {
            return Err(SyncError::destination(413, "Request Entity Too Large"));
        }
        data.uploads.push((key.to_string(), file.file_name.clone()));
        Ok(true)
    }

    fn transition_status(&self, _key: &str, _state_type: StateType) -> Result<bool> {
        Ok(false)
    }

    fn test_connection(&self) -> Result<Account> {
        Ok(Account::default())
    }

    fn issue_types(&self) -> Result<Vec<IssueType>> {
        Ok(Vec::new())
    }
}

/// Serves every attachment as a small in-memory payload.
#[derive(Default)]
pub struct StaticDownloader {
    count: Mutex<usize>,
}

impl StaticDownloader {
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap()
    }
}

impl AttachmentDownloader for StaticDownloader {
    fn download(&self, attachment: &AttachmentInput) -> Result<Option<DownloadedFile>> {
        *self.count.lock().unwrap() += 1;
        let name = attachment
            .title
            .clone()
            .unwrap_or_else(|| "attachment".to_string());
        DownloadedFile::from_bytes(name, b"\x89PNG").map(Some)
    }
}
