//! Jira wiki-markup rendering of Source comments and attachments.
//!
//! Output must be byte-for-byte stable for identical input: comment dedupe
//! compares rendered text across runs.

use crate::model::{AttachmentInput, CommentInput};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[must_use]
pub fn format_comment(comment: &CommentInput) -> String {
    let mut out = String::from("h4. Comment from Source\n\n");

    if let Some(author) = comment.author_name.as_deref().filter(|a| !a.is_empty()) {
        let _ = writeln!(out, "Author: {author}");
    }
    if let Some(created) = comment.created_at {
        let _ = write!(out, "Created: {}\n\n", timestamp(created));
    }
    if let Some(body) = comment.body.as_deref().filter(|b| !b.is_empty()) {
        out.push_str(body);
    }
    out
}

#[must_use]
pub fn format_attachment(attachment: &AttachmentInput) -> String {
    let mut out = String::from("h4. Attachment from Source\n\n");

    if let Some(title) = &attachment.title {
        let _ = writeln!(out, "Title: {title}");
    }
    if let Some(url) = &attachment.url {
        let _ = writeln!(out, "URL: [{url}|{url}]");
    }
    if let Some(source_type) = &attachment.source_type {
        let _ = writeln!(out, "Type: {source_type}");
    }
    if let Some(creator) = &attachment.creator_name {
        let _ = writeln!(out, "Created by: {creator}");
    }
    if let Some(created) = attachment.created_at {
        let _ = writeln!(out, "Created: {}", timestamp(created));
    }
    out
}
