//! List-issue-types command implementation.

use super::print_json;
use crate::config::{self, CliOverrides};
use crate::destination::{IssueDestination, IssueType, JiraClient};
use crate::error::Result;
use std::fmt::Write;
use tracing::info;

/// Execute the list-issue-types command.
///
/// # Errors
///
/// Returns an error if configuration is missing or Jira rejects the request.
pub fn execute(json: bool, cli: &CliOverrides) -> Result<()> {
    let config = config::load_config(cli)?;
    let jira = JiraClient::from_config(&config)?;
    let project = &jira.settings().project_key;
    info!(project = %project, "Fetching Jira issue types");

    let types = jira.issue_types()?;
    if json {
        print_json(&types)?;
    } else {
        print!("{}", render(project, &types));
    }
    Ok(())
}

fn render(project: &str, types: &[IssueType]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Issue types for project {project}:");
    for issue_type in types {
        let marker = if issue_type.subtask { " [subtask]" } else { "" };
        let _ = writeln!(out, "  - {}{marker}", issue_type.name);
        if let Some(description) = issue_type
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
        {
            let _ = writeln!(out, "      {}", description.trim());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_render_marks_subtasks() {
        let types = vec![
            IssueType {
                name: "Task".into(),
                subtask: false,
                description: Some("A task that needs to be done.".into()),
            },
            IssueType {
                name: "Sub-task".into(),
                subtask: true,
                description: Some("  ".into()),
            },
        ];
        assert_snapshot!(render("PROJ", &types), @r"
        Issue types for project PROJ:
          - Task
              A task that needs to be done.
          - Sub-task [subtask]
        ");
    }
}
