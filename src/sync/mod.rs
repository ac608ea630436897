//! One-way Linear -> Jira reconciliation.
//!
//! A run is driven by [`Synchronizer`]:
//! - [`SyncCoordinator`] loads and backs up the state, then saves it once at the end
//! - each fetched issue is mapped to an [`IssueInput`](crate::model::IssueInput)
//!   and handed to [`IssueReconciler`] (create / update / skip)
//! - comments and attachments follow through [`SubResourceReconciler`]
//!
//! Outcomes are collected into a [`SyncResult`].

pub mod coordinator;
pub mod mapper;
pub mod reconciler;
pub mod result;
pub mod subresources;
pub mod synchronizer;

#[cfg(test)]
mod testing;

pub use coordinator::{SyncCoordinator, determine_watermark};
pub use mapper::to_issue_input;
pub use reconciler::{IssueReconciler, ReconcileOptions, needs_update};
pub use result::{IssueAction, IssueResult, SyncResult};
pub use subresources::{AttachmentOutcome, SubResourceReconciler, SubResourceReport};
pub use synchronizer::{SyncProgress, Synchronizer};
