//! Live `IssueDestination` backed by the Jira Cloud REST API (v3).

use super::{Account, CreatedIssue, IssueDestination, IssueType, fields};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::model::{IssueInput, StateType};
use crate::source::DownloadedFile;
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

const API_PREFIX: &str = "/rest/api/3";
const COMMENT_PAGE_SIZE: usize = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Static settings that shape request payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JiraSettings {
    pub project_key: String,
    pub issue_type: String,
    /// `customfield_<N>` holding the Linear id, when configured.
    pub linear_id_field: Option<String>,
    pub enable_priority: bool,
    pub enable_status_sync: bool,
}

impl JiraSettings {
    /// Body for `POST /issue`.
    #[must_use]
    pub fn create_payload(&self, issue: &IssueInput) -> Value {
        let mut map = self.common_fields(issue);
        map.insert("project".into(), json!({ "key": self.project_key }));
        map.insert("issuetype".into(), json!({ "name": self.issue_type }));
        if let Some(field) = &self.linear_id_field {
            map.insert(field.clone(), Value::String(issue.id.clone()));
        }
        json!({ "fields": map })
    }

    /// Body for `PUT /issue/{key}`. Project, type and custom field are fixed at creation.
    #[must_use]
    pub fn update_payload(&self, issue: &IssueInput) -> Value {
        json!({ "fields": self.common_fields(issue) })
    }

    fn common_fields(&self, issue: &IssueInput) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "summary".into(),
            Value::String(fields::summary(&issue.identifier, &issue.title)),
        );
        map.insert(
            "description".into(),
            adf_document(issue.description.as_deref().unwrap_or_default()),
        );

        let labels = fields::labels(&issue.labels);
        if !labels.is_empty() {
            map.insert("labels".into(), json!(labels));
        }
        if let Some(priority) = issue.priority.filter(|_| self.enable_priority) {
            map.insert(
                "priority".into(),
                json!({ "name": fields::priority_name(priority) }),
            );
        }
        map
    }
}

/// Wrap plain text in a single-paragraph Atlassian Document.
#[must_use]
pub fn adf_document(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }]
        }]
    })
}

/// Concatenate every text node of an ADF value, space separated.
///
/// Plain string bodies (API v2 style) are returned trimmed.
#[must_use]
pub fn adf_plain_text(value: &Value) -> String {
    fn collect<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
        match value {
            Value::Object(map) => {
                let is_text = map.get("type").and_then(Value::as_str) == Some("text");
                if let Some(text) = map.get("text").and_then(Value::as_str).filter(|_| is_text) {
                    out.push(text);
                }
                if let Some(content) = map.get("content") {
                    collect(content, out);
                }
            }
            Value::Array(items) => {
                for item in items {
                    collect(item, out);
                }
            }
            _ => {}
        }
    }

    if let Value::String(text) = value {
        return text.trim().to_string();
    }
    let mut parts = Vec::new();
    collect(value, &mut parts);
    parts.join(" ").trim().to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub to: Option<TransitionTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionTarget {
    #[serde(default)]
    pub name: Option<String>,
}

/// First transition whose target status matches `status` case-insensitively.
#[must_use]
pub fn select_transition<'a>(transitions: &'a [Transition], status: &str) -> Option<&'a Transition> {
    transitions.iter().find(|t| {
        t.to.as_ref()
            .and_then(|to| to.name.as_deref())
            .is_some_and(|name| name.eq_ignore_ascii_case(status))
    })
}

#[derive(Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Deserialize)]
struct CreateResponse {
    key: String,
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsResponse {
    #[serde(default)]
    start_at: usize,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    comments: Vec<CommentBody>,
}

#[derive(Deserialize)]
struct CommentBody {
    #[serde(default)]
    body: Value,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    key: String,
}

#[derive(Deserialize)]
struct IssueStatusResponse {
    #[serde(default)]
    fields: Option<StatusFields>,
}

#[derive(Deserialize)]
struct StatusFields {
    #[serde(default)]
    status: Option<StatusName>,
}

#[derive(Deserialize)]
struct StatusName {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    #[serde(default)]
    issue_types: Vec<IssueType>,
}

/// Blocking Jira REST client using basic auth.
pub struct JiraClient {
    client: Client,
    base_url: String,
    username: String,
    token: String,
    settings: JiraSettings,
}

impl JiraClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
        settings: JiraSettings,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            token: token.into(),
            settings,
        })
    }

    /// # Errors
    ///
    /// Returns `SyncError::MissingConfig` for any absent Jira setting.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let missing = |what, key, env| SyncError::MissingConfig { what, key, env };
        let settings = JiraSettings {
            project_key: config.jira_project_key.clone().ok_or_else(|| {
                missing("Jira project key", "jira.project.key", "JIRA_PROJECT_KEY")
            })?,
            issue_type: config.jira_issue_type.clone(),
            linear_id_field: config.linear_id_field_name(),
            enable_priority: config.enable_priority,
            enable_status_sync: config.enable_status_sync,
        };
        Self::new(
            config
                .jira_api_url
                .clone()
                .ok_or_else(|| missing("Jira API URL", "jira.api.url", "JIRA_API_URL"))?,
            config
                .jira_username
                .clone()
                .ok_or_else(|| missing("Jira username", "jira.api.username", "JIRA_USERNAME"))?,
            config
                .jira_api_token
                .clone()
                .ok_or_else(|| missing("Jira API token", "jira.api.token", "JIRA_API_TOKEN"))?,
            settings,
        )
    }

    #[must_use]
    pub const fn settings(&self) -> &JiraSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.username, Some(&self.token))
            .header("Accept", "application/json")
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.request(builder).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SyncError::destination(status.as_u16(), body))
    }

    fn current_status(&self, key: &str) -> Result<Option<String>> {
        let response: IssueStatusResponse = self
            .send(
                self.client
                    .get(self.url(&format!("/issue/{key}")))
                    .query(&[("fields", "status")]),
            )?
            .json()?;
        Ok(response.fields.and_then(|f| f.status).map(|s| s.name))
    }
}

impl IssueDestination for JiraClient {
    fn create_issue(&self, issue: &IssueInput) -> Result<CreatedIssue> {
        let payload = self.settings.create_payload(issue);
        let created: CreateResponse = self
            .send(self.client.post(self.url("/issue")).json(&payload))?
            .json()?;
        tracing::info!(issue = %issue.identifier, key = %created.key, "Created Jira issue");
        Ok(CreatedIssue {
            key: created.key,
            id: created.id,
        })
    }

    fn update_issue(&self, key: &str, issue: &IssueInput) -> Result<()> {
        let payload = self.settings.update_payload(issue);
        self.send(
            self.client
                .put(self.url(&format!("/issue/{key}")))
                .json(&payload),
        )?;
        tracing::info!(issue = %issue.identifier, key, "Updated Jira issue");
        Ok(())
    }

    fn find_by_source_id(&self, source_id: &str) -> Result<Option<String>> {
        let Some(jql) = self
            .settings
            .linear_id_field
            .as_deref()
            .and_then(|field| fields::source_id_jql(field, source_id))
        else {
            return Ok(None);
        };

        let response: SearchResponse = self
            .send(self.client.get(self.url("/search")).query(&[
                ("jql", jql.as_str()),
                ("maxResults", "1"),
                ("fields", "key"),
            ]))?
            .json()?;
        Ok(response.issues.into_iter().next().map(|hit| hit.key))
    }

    fn add_comment(&self, key: &str, text: &str) -> Result<()> {
        self.send(
            self.client
                .post(self.url(&format!("/issue/{key}/comment")))
                .json(&json!({ "body": adf_document(text) })),
        )?;
        tracing::debug!(key, "Added comment");
        Ok(())
    }

    fn list_comments(&self, key: &str) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        let mut start_at = 0_usize;

        loop {
            let page: CommentsResponse = self
                .send(
                    self.client
                        .get(self.url(&format!("/issue/{key}/comment")))
                        .query(&[
                            ("startAt", start_at.to_string()),
                            ("maxResults", COMMENT_PAGE_SIZE.to_string()),
                        ]),
                )?
                .json()?;

            let fetched = page.comments.len();
            texts.extend(
                page.comments
                    .iter()
                    .map(|c| adf_plain_text(&c.body))
                    .filter(|text| !text.is_empty()),
            );

            if fetched < COMMENT_PAGE_SIZE || page.start_at + COMMENT_PAGE_SIZE >= page.total {
                break;
            }
            start_at = page.start_at + COMMENT_PAGE_SIZE;
        }

        Ok(texts)
    }

    fn upload_attachment(&self, key: &str, file: &DownloadedFile) -> Result<bool> {
        let mut part = multipart::Part::file(file.path())?.file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new().part("file", part);

        let uploaded: Vec<Value> = self
            .send(
                self.client
                    .post(self.url(&format!("/issue/{key}/attachments")))
                    .header("X-Atlassian-Token", "no-check")
                    .multipart(form),
            )?
            .json()?;
        Ok(!uploaded.is_empty())
    }

    fn transition_status(&self, key: &str, state_type: StateType) -> Result<bool> {
        if !self.settings.enable_status_sync {
            return Ok(false);
        }
        let Some(target) = fields::status_for(state_type) else {
            tracing::warn!(key, state = %state_type, "Unknown state type, skipping transition");
            return Ok(false);
        };

        let current = self.current_status(key)?;
        if current
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(target))
        {
            tracing::debug!(key, status = target, "Already in target status");
            return Ok(false);
        }

        let response: TransitionsResponse = self
            .send(
                self.client
                    .get(self.url(&format!("/issue/{key}/transitions"))),
            )?
            .json()?;
        let Some(transition) = select_transition(&response.transitions, target) else {
            tracing::warn!(
                key,
                from = current.as_deref().unwrap_or("?"),
                to = target,
                "No transition available"
            );
            return Ok(false);
        };

        self.send(
            self.client
                .post(self.url(&format!("/issue/{key}/transitions")))
                .json(&json!({ "transition": { "id": transition.id } })),
        )?;
        tracing::info!(
            key,
            from = current.as_deref().unwrap_or("?"),
            to = target,
            "Transitioned issue"
        );
        Ok(true)
    }

    fn test_connection(&self) -> Result<Account> {
        Ok(self.send(self.client.get(self.url("/myself")))?.json()?)
    }

    fn issue_types(&self) -> Result<Vec<IssueType>> {
        let project: ProjectResponse = self
            .send(
                self.client
                    .get(self.url(&format!("/project/{}", self.settings.project_key))),
            )?
            .json()?;
        Ok(project.issue_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LabelInput;

    fn settings() -> JiraSettings {
        JiraSettings {
            project_key: "PROJ".into(),
            issue_type: "Task".into(),
            linear_id_field: Some("customfield_10042".into()),
            enable_priority: true,
            enable_status_sync: true,
        }
    }

    fn issue() -> IssueInput {
        IssueInput {
            id: "lin-1".into(),
            identifier: "ENG-1".into(),
            title: "Crash on start".into(),
            description: Some("Steps".into()),
            priority: Some(2),
            labels: vec![LabelInput {
                name: "Needs Triage".into(),
                ..LabelInput::default()
            }],
            ..IssueInput::default()
        }
    }

    #[test]
    fn test_create_payload() {
        let payload = settings().create_payload(&issue());
        let fields = &payload["fields"];
        assert_eq!(fields["project"]["key"], "PROJ");
        assert_eq!(fields["summary"], "[ENG-1] Crash on start");
        assert_eq!(fields["issuetype"]["name"], "Task");
        assert_eq!(fields["labels"], json!(["needs_triage"]));
        assert_eq!(fields["priority"]["name"], "High");
        assert_eq!(fields["customfield_10042"], "lin-1");
        assert_eq!(
            fields["description"]["content"][0]["content"][0]["text"],
            "Steps"
        );
    }

    #[test]
    fn test_update_payload_omits_creation_fields() {
        let payload = settings().update_payload(&issue());
        let fields = payload["fields"].as_object().expect("object");
        assert!(fields.contains_key("summary"));
        assert!(!fields.contains_key("project"));
        assert!(!fields.contains_key("issuetype"));
        assert!(!fields.contains_key("customfield_10042"));
    }

    #[test]
    fn test_priority_omitted_when_disabled() {
        let settings = JiraSettings {
            enable_priority: false,
            ..settings()
        };
        let payload = settings.create_payload(&issue());
        assert!(payload["fields"].get("priority").is_none());
    }

    #[test]
    fn test_missing_description_is_empty_text() {
        let input = IssueInput {
            description: None,
            ..issue()
        };
        let payload = settings().update_payload(&input);
        assert_eq!(
            payload["fields"]["description"]["content"][0]["content"][0]["text"],
            ""
        );
    }

    #[test]
    fn test_adf_plain_text() {
        let body = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "h4. Comment"},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "body"}
                ]},
                {"type": "paragraph", "content": [{"type": "text", "text": "more "}]}
            ]
        });
        assert_eq!(adf_plain_text(&body), "h4. Comment body more");
        assert_eq!(adf_plain_text(&json!("  legacy  ")), "legacy");
        assert_eq!(adf_plain_text(&Value::Null), "");
    }

    #[test]
    fn test_adf_round_trips_single_text() {
        let text = "h4. Comment from Source\n\nAuthor: Ann";
        assert_eq!(adf_plain_text(&adf_document(text)), text);
    }

    #[test]
    fn test_select_transition_case_insensitive() {
        let transitions: Vec<Transition> = serde_json::from_value(json!([
            {"id": "11", "name": "Start", "to": {"name": "In Progress"}},
            {"id": "21", "name": "Finish", "to": {"name": "DONE"}},
            {"id": "31", "name": "Odd"}
        ]))
        .expect("parse");
        assert_eq!(select_transition(&transitions, "done").map(|t| t.id.as_str()), Some("21"));
        assert!(select_transition(&transitions, "To Do").is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = JiraClient::new("https://x.atlassian.net/", "u", "t", settings()).expect("client");
        assert_eq!(client.url("/myself"), "https://x.atlassian.net/rest/api/3/myself");
    }
}
