//! Core data types for `linear_jira_sync`.
//!
//! Two families live here:
//! - Source-native shapes (`Issue`, `WorkflowState`, `User`, `Team`, `Label`,
//!   `Comment`, `Attachment`) deserialized straight from Linear GraphQL.
//! - The canonical `IssueInput` family the reconciler works with. It carries
//!   no knowledge of the Source schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow state category reported by Linear.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Triage,
    Backlog,
    Unstarted,
    Started,
    Completed,
    Canceled,
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl StateType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::Backlog => "backlog",
            Self::Unstarted => "unstarted",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateType {
    type Err = crate::error::SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "triage" => Ok(Self::Triage),
            "backlog" => Ok(Self::Backlog),
            "unstarted" => Ok(Self::Unstarted),
            "started" => Ok(Self::Started),
            "completed" => Ok(Self::Completed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            other => Err(crate::error::SyncError::Config(format!(
                "unknown state type '{other}'"
            ))),
        }
    }
}

/// GraphQL connection wrapper (`{ nodes: [...] }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl User {
    /// Display name when set, otherwise the full name.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An issue as returned by the Linear API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 0 = none, 1 = urgent, 2 = high, 3 = medium, 4 = low.
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub state: Option<WorkflowState>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub labels: Connection<Label>,
    #[serde(default)]
    pub comments: Connection<Comment>,
    #[serde(default)]
    pub attachments: Connection<Attachment>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Canonical, destination-agnostic issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueInput {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub state_name: Option<String>,
    pub state_type: Option<StateType>,
    pub assignee_id: Option<String>,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
    pub creator_id: Option<String>,
    pub creator_name: Option<String>,
    pub team_id: Option<String>,
    pub team_key: Option<String>,
    pub team_name: Option<String>,
    pub labels: Vec<LabelInput>,
    pub comments: Vec<CommentInput>,
    pub attachments: Vec<AttachmentInput>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelInput {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentInput {
    pub id: String,
    pub body: Option<String>,
    pub author_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentInput {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub source_type: Option<String>,
    pub creator_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_deserializes_from_graphql_shape() {
        let json = r##"{
            "id": "lin-1",
            "identifier": "ENG-1",
            "title": "Crash on start",
            "priority": 2,
            "state": {"id": "s1", "name": "In Progress", "type": "started"},
            "team": {"id": "t1", "name": "Engineering", "key": "ENG"},
            "labels": {"nodes": [{"id": "l1", "name": "bug", "color": "#f00"}]},
            "comments": {"nodes": [{"id": "c1", "body": "hi", "user": {"id": "u1", "name": "Ann"}}]},
            "attachments": {"nodes": []},
            "updatedAt": "2024-03-01T10:00:00.000Z"
        }"##;
        let issue: Issue = serde_json::from_str(json).expect("parse issue");
        assert_eq!(issue.identifier, "ENG-1");
        assert_eq!(issue.state.as_ref().map(|s| s.state_type), Some(StateType::Started));
        assert_eq!(issue.labels.nodes.len(), 1);
        assert_eq!(issue.comments.nodes[0].user.as_ref().and_then(User::label), Some("Ann"));
        assert!(issue.updated_at.is_some());
        assert!(issue.description.is_none());
    }

    #[test]
    fn test_unknown_state_type_is_tolerated() {
        let state: WorkflowState =
            serde_json::from_str(r#"{"name": "Odd", "type": "archived"}"#).expect("parse");
        assert_eq!(state.state_type, StateType::Unknown);
    }

    #[test]
    fn test_state_type_from_str() {
        assert_eq!("Cancelled".parse::<StateType>().ok(), Some(StateType::Canceled));
        assert!("nope".parse::<StateType>().is_err());
        assert_eq!(StateType::Unstarted.to_string(), "unstarted");
    }

    #[test]
    fn test_user_label_prefers_display_name() {
        let user = User {
            id: "u".into(),
            name: Some("Ann Smith".into()),
            email: None,
            display_name: Some("ann".into()),
        };
        assert_eq!(user.label(), Some("ann"));

        let blank = User {
            display_name: Some("  ".into()),
            ..user
        };
        assert_eq!(blank.label(), Some("Ann Smith"));
    }
}
