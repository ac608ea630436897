//! Field mapping tables between Linear and Jira.

use crate::model::{LabelInput, StateType};
use once_cell::sync::Lazy;
use regex::Regex;

static INVALID_LABEL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid regex"));
static REPEATED_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("valid regex"));

pub const STATUS_TO_DO: &str = "To Do";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_DONE: &str = "Done";

/// `[ENG-1] Title`
#[must_use]
pub fn summary(identifier: &str, title: &str) -> String {
    format!("[{identifier}] {title}")
}

/// Jira priority name for a Linear priority (0 none, 1 urgent .. 4 low).
#[must_use]
pub const fn priority_name(priority: i32) -> &'static str {
    match priority {
        1 => "Highest",
        2 => "High",
        4 => "Low",
        _ => "Medium",
    }
}

/// Jira status name a Linear state type should land in.
#[must_use]
pub const fn status_for(state_type: StateType) -> Option<&'static str> {
    match state_type {
        StateType::Triage | StateType::Backlog | StateType::Unstarted => Some(STATUS_TO_DO),
        StateType::Started => Some(STATUS_IN_PROGRESS),
        StateType::Completed | StateType::Canceled => Some(STATUS_DONE),
        StateType::Unknown => None,
    }
}

/// Jira labels may not contain spaces; normalize to `[a-z0-9_-]`.
#[must_use]
pub fn sanitize_label(name: &str) -> Option<String> {
    let replaced = INVALID_LABEL_CHARS.replace_all(name.trim(), "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    let label = collapsed.to_lowercase();
    if label.is_empty() || label == "_" {
        None
    } else {
        Some(label)
    }
}

/// Sanitized, deduplicated label names in input order.
#[must_use]
pub fn labels(labels: &[LabelInput]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for label in labels.iter().filter_map(|l| sanitize_label(&l.name)) {
        if !out.contains(&label) {
            out.push(label);
        }
    }
    out
}

/// Numeric id of a `customfield_<N>` name, for JQL `cf[N]`.
#[must_use]
pub fn custom_field_number(field_name: &str) -> Option<&str> {
    let number = field_name.strip_prefix("customfield_").unwrap_or(field_name);
    if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
        Some(number)
    } else {
        None
    }
}

/// JQL matching issues whose custom field holds `source_id`.
#[must_use]
pub fn source_id_jql(field_name: &str, source_id: &str) -> Option<String> {
    let escaped = source_id.replace('\\', "\\\\").replace('"', "\\\"");
    custom_field_number(field_name).map(|n| format!("cf[{n}] = \"{escaped}\""))
}
