//! `linear_jira_sync` - one-way incremental Linear to Jira issue synchronization.
//!
//! The crate is organized around a reconciliation engine ([`sync`]) that pulls
//! issues from a Source tracker ([`source`]), pushes them into a Destination
//! tracker ([`destination`]), and remembers what it has done in a durable state
//! document ([`state`]) so repeated runs never create duplicates.

pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod logging;
pub mod model;
pub mod source;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{ErrorCode, Result, StructuredError, SyncError};
