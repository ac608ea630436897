//! Subcommand implementations.

pub mod completions;
pub mod list_issue_types;
pub mod reset;
pub mod status;
pub mod sync;
pub mod test_connection;

use crate::error::Result;
use serde::Serialize;

/// Pretty-print `value` as JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
