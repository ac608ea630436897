//! Live `IssueSource` backed by the Linear GraphQL API.

use super::{IssueFilter, IssueSource};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::model::{Issue, User};
use chrono::SecondsFormat;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

const PAGE_SIZE: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const ISSUE_FIELDS: &str = r"
    id
    identifier
    title
    description
    priority
    state { id name type }
    assignee { id name email displayName }
    creator { id name email displayName }
    team { id name key }
    labels { nodes { id name color } }
    comments(first: 100) {
      nodes {
        id
        body
        user { id name email displayName }
        createdAt
        updatedAt
        url
      }
    }
    attachments(first: 50) {
      nodes {
        id
        title
        url
        sourceType
        creator { id name email displayName }
        metadata
        createdAt
      }
    }
    createdAt
    updatedAt
    url
";

const VIEWER_QUERY: &str = "query Viewer { viewer { id name email displayName } }";

fn issues_query() -> String {
    format!(
        "query Issues($filter: IssueFilter, $first: Int, $after: String) {{
  issues(filter: $filter, first: $first, after: $after) {{
    nodes {{ {ISSUE_FIELDS} }}
    pageInfo {{ hasNextPage endCursor }}
  }}
}}"
    )
}

fn issue_query() -> String {
    format!("query Issue($id: String!) {{ issue(id: $id) {{ {ISSUE_FIELDS} }} }}")
}

/// Request body for every GraphQL call.
#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct IssuesData {
    issues: Option<IssuePage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuePage {
    #[serde(default)]
    nodes: Vec<Issue>,
    page_info: PageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct IssueData {
    issue: Option<Issue>,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: User,
}

/// Blocking Linear GraphQL client.
pub struct LinearClient {
    client: Client,
    api_url: String,
    token: String,
}

impl LinearClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
        })
    }

    /// # Errors
    ///
    /// Returns `SyncError::MissingConfig` if no Linear token is configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let token = config
            .linear_api_token
            .clone()
            .ok_or(SyncError::MissingConfig {
                what: "Linear API token",
                key: "linear.api.token",
                env: "LINEAR_API_TOKEN",
            })?;
        Self::new(config.linear_api_url.clone(), token)
    }

    fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<Option<T>> {
        let body = GraphQlRequest { query, variables };
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", &self.token)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<GraphQlResponse<Value>>(&text)
                .ok()
                .and_then(|r| join_errors(&r.errors))
                .unwrap_or(text);
            return Err(SyncError::source_api(Some(status.as_u16()), message));
        }

        let parsed: GraphQlResponse<T> = serde_json::from_str(&text)
            .map_err(|e| SyncError::source_api(None, format!("unexpected response: {e}")))?;
        if let Some(message) = join_errors(&parsed.errors) {
            return Err(SyncError::source_api(None, message));
        }
        Ok(parsed.data)
    }
}

fn join_errors(errors: &[GraphQlError]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Build the GraphQL `IssueFilter` object, or `null` when unfiltered.
#[must_use]
pub fn filter_variables(filter: &IssueFilter) -> Value {
    let mut object = Map::new();
    if let Some(team) = &filter.team {
        object.insert("team".into(), json!({ "key": { "eq": team } }));
    }
    if let Some(state_type) = filter.state_type {
        object.insert(
            "state".into(),
            json!({ "type": { "eq": state_type.as_str() } }),
        );
    }
    if let Some(updated_after) = filter.updated_after {
        object.insert(
            "updatedAt".into(),
            json!({ "gte": updated_after.to_rfc3339_opts(SecondsFormat::Millis, true) }),
        );
    }
    if object.is_empty() {
        Value::Null
    } else {
        Value::Object(object)
    }
}

impl IssueSource for LinearClient {
    fn fetch_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let query = issues_query();
        let filter_value = filter_variables(filter);
        let mut issues = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let variables = json!({
                "filter": filter_value,
                "first": PAGE_SIZE,
                "after": cursor,
            });
            let Some(data) = self.execute::<IssuesData>(&query, variables)? else {
                break;
            };
            let Some(page) = data.issues else {
                break;
            };

            tracing::debug!(count = page.nodes.len(), "Fetched page of Linear issues");
            issues.extend(page.nodes);

            match page.page_info.end_cursor {
                Some(next) if page.page_info.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        tracing::info!(count = issues.len(), "Fetched Linear issues");
        Ok(issues)
    }

    fn fetch_issue_by_identifier(&self, identifier: &str) -> Result<Option<Issue>> {
        let result = self.execute::<IssueData>(&issue_query(), json!({ "id": identifier }));
        match result {
            Ok(data) => Ok(data.and_then(|d| d.issue)),
            // Linear reports an unknown identifier as a GraphQL error, not null.
            Err(SyncError::SourceApi {
                status: None,
                message,
            }) if message.contains("not found") || message.contains("Entity not found") => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn test_connection(&self) -> Result<User> {
        self.execute::<ViewerData>(VIEWER_QUERY, json!({}))?
            .map(|d| d.viewer)
            .ok_or_else(|| SyncError::source_api(None, "viewer query returned no data"))
    }
}
