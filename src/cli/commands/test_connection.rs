//! Test-connection command implementation.

use super::print_json;
use crate::config::{self, CliOverrides};
use crate::destination::{IssueDestination, JiraClient};
use crate::error::Result;
use crate::source::{IssueSource, LinearClient};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
pub struct ConnectionCheck {
    pub system: &'static str,
    pub ok: bool,
    /// Authenticated user on success, error message on failure.
    pub detail: String,
    pub hint: Option<&'static str>,
}

impl ConnectionCheck {
    fn from_result(system: &'static str, result: Result<String>) -> Self {
        match result {
            Ok(who) => Self {
                system,
                ok: true,
                detail: who,
                hint: None,
            },
            Err(e) => {
                warn!(system, "Connection check failed: {e}");
                Self {
                    system,
                    ok: false,
                    hint: e.suggestion(),
                    detail: e.to_string(),
                }
            }
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut line = if self.ok {
            format!("✓ {}: connected as {}", self.system, self.detail)
        } else {
            format!("✗ {}: {}", self.system, self.detail)
        };
        if let Some(hint) = self.hint {
            line.push_str("\n    Hint: ");
            line.push_str(hint);
        }
        line
    }
}

/// Check both trackers in turn. Returns whether both succeeded.
///
/// # Errors
///
/// Returns an error if configuration is missing or the clients cannot be built.
pub fn execute(json: bool, cli: &CliOverrides) -> Result<bool> {
    let config = config::load_config(cli)?;
    config.validate()?;

    let linear = LinearClient::from_config(&config)?;
    let jira = JiraClient::from_config(&config)?;
    debug!(linear = %config.linear_api_url, "Testing connections");

    let checks = [
        ConnectionCheck::from_result(
            "Linear",
            linear.test_connection().map(|user| {
                user.label()
                    .map_or_else(|| user.id.clone(), str::to_string)
            }),
        ),
        ConnectionCheck::from_result(
            "Jira",
            jira.test_connection().map(|account| {
                account
                    .display_name
                    .or(account.email_address)
                    .or(account.account_id)
                    .unwrap_or_else(|| "unknown account".to_string())
            }),
        ),
    ];

    if json {
        print_json(&checks)?;
    } else {
        for check in &checks {
            println!("{}", check.render());
        }
    }
    Ok(checks.iter().all(|check| check.ok))
}
