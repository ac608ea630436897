//! HTTP download of Source attachments into temp files.

use super::{AttachmentDownloader, DownloadedFile};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::model::AttachmentInput;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::io::{Read, Write};
use std::time::Duration;
use tempfile::NamedTempFile;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("valid regex"));

const CHUNK_SIZE: usize = 64 * 1024;

/// Replace anything outside `[a-zA-Z0-9._-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return "attachment".to_string();
    }
    UNSAFE_FILENAME_CHARS.replace_all(trimmed, "_").into_owned()
}

/// Split a sanitized name into `(base, extension-with-dot)`.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], &name[idx..]),
        _ => (name, ".tmp"),
    }
}

/// Create a temp file named after the attachment.
pub(crate) fn temp_file_for(file_name: &str) -> Result<NamedTempFile> {
    let sanitized = sanitize_file_name(file_name);
    let (base, ext) = split_extension(&sanitized);
    let file = tempfile::Builder::new()
        .prefix(&format!("linear-attachment-{base}-"))
        .suffix(ext)
        .tempfile()?;
    Ok(file)
}

/// Only absolute `http(s)` URLs with a host are fetched.
#[must_use]
pub fn is_downloadable_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url.trim()) else {
        return false;
    };
    matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some_and(|h| !h.is_empty())
}

/// Whether `url` is served by Linear itself (e.g. `uploads.linear.app`).
///
/// The API token is only attached for these hosts; external links never see it.
#[must_use]
pub fn is_linear_host(url: &str) -> bool {
    reqwest::Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == "linear.app" || host.ends_with(".linear.app"))
}

/// Downloads attachments with a size cap and timeout.
pub struct HttpAttachmentDownloader {
    client: Client,
    token: Option<String>,
    max_size: u64,
}

impl HttpAttachmentDownloader {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration, max_size: u64, token: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token,
            max_size,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(
            config.download_timeout,
            config.download_max_size,
            config.linear_api_token.clone(),
        )
    }

    fn file_name_for(attachment: &AttachmentInput, url: &str) -> String {
        attachment
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                reqwest::Url::parse(url).ok().and_then(|u| {
                    u.path_segments()
                        .and_then(|mut segments| segments.next_back().map(str::to_string))
                        .filter(|s| !s.is_empty())
                })
            })
            .unwrap_or_else(|| "attachment".to_string())
    }
}

impl AttachmentDownloader for HttpAttachmentDownloader {
    fn download(&self, attachment: &AttachmentInput) -> Result<Option<DownloadedFile>> {
        let url = attachment.url.as_deref().unwrap_or_default().trim();
        if attachment.id.trim().is_empty() || url.is_empty() {
            tracing::debug!(attachment = %attachment.id, "Attachment has no id or URL");
            return Ok(None);
        }
        if !is_downloadable_url(url) {
            tracing::debug!(attachment = %attachment.id, url, "Attachment URL is not downloadable");
            return Ok(None);
        }

        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_ref().filter(|_| is_linear_host(url)) {
            request = request.header("Authorization", token);
        }
        let mut response = request.send()?;

        if response.status() != StatusCode::OK {
            tracing::warn!(
                attachment = %attachment.id,
                status = response.status().as_u16(),
                "Attachment download failed"
            );
            return Ok(None);
        }

        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(length) = declared.filter(|len| *len > self.max_size) {
            tracing::warn!(
                attachment = %attachment.id,
                size = length,
                max = self.max_size,
                "Attachment exceeds size limit"
            );
            return Ok(None);
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let file_name = Self::file_name_for(attachment, url);
        let mut file = temp_file_for(&file_name)?;
        let mut buffer = vec![0_u8; CHUNK_SIZE];
        let mut size: u64 = 0;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|e| SyncError::Attachment(format!("read failed: {e}")))?;
            if read == 0 {
                break;
            }
            size += read as u64;
            if size > self.max_size {
                tracing::warn!(
                    attachment = %attachment.id,
                    max = self.max_size,
                    "Attachment exceeded size limit while streaming"
                );
                return Ok(None);
            }
            file.write_all(&buffer[..read])?;
        }
        file.flush()?;

        tracing::debug!(attachment = %attachment.id, size, "Downloaded attachment");
        Ok(Some(DownloadedFile {
            file,
            file_name,
            size,
            content_type,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_only_sent_to_linear_hosts() {
        assert!(is_linear_host("https://uploads.linear.app/abc/screenshot.png"));
        assert!(is_linear_host("https://LINEAR.app/files/1"));
        assert!(!is_linear_host("https://github.com/org/repo/pull/1"));
        assert!(!is_linear_host("https://www.figma.com/file/x"));
        assert!(!is_linear_host("https://linear.app.evil.example/x"));
        assert!(!is_linear_host("https://notlinear.app/x"));
        assert!(!is_linear_host("not a url"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_file_name("   "), "attachment");
        assert_eq!(sanitize_file_name("ok-name_1.txt"), "ok-name_1.txt");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("shot.png"), ("shot", ".png"));
        assert_eq!(split_extension("README"), ("README", ".tmp"));
        assert_eq!(split_extension(".hidden"), (".hidden", ".tmp"));
        assert_eq!(split_extension("trailing."), ("trailing.", ".tmp"));
    }

    #[test]
    fn test_temp_file_naming() {
        let file = temp_file_for("screen shot.png").expect("temp");
        let name = file
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .expect("name")
            .to_string();
        assert!(name.starts_with("linear-attachment-screen_shot-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_downloadable_urls() {
        assert!(is_downloadable_url("https://uploads.linear.app/a/b.png"));
        assert!(is_downloadable_url("http://example.com/x"));
        assert!(!is_downloadable_url("ftp://example.com/x"));
        assert!(!is_downloadable_url("not a url"));
        assert!(!is_downloadable_url("file:///etc/passwd"));
    }

    #[test]
    fn test_blank_url_returns_none_without_request() {
        let downloader =
            HttpAttachmentDownloader::new(Duration::from_secs(1), 1024, None).expect("client");
        let attachment = AttachmentInput {
            id: "att-1".into(),
            url: Some("   ".into()),
            ..AttachmentInput::default()
        };
        assert!(downloader.download(&attachment).expect("ok").is_none());
    }

    #[test]
    fn test_file_name_falls_back_to_url_segment() {
        let attachment = AttachmentInput {
            id: "a".into(),
            ..AttachmentInput::default()
        };
        assert_eq!(
            HttpAttachmentDownloader::file_name_for(&attachment, "https://x.io/files/log.txt"),
            "log.txt"
        );
        assert_eq!(
            HttpAttachmentDownloader::file_name_for(&attachment, "https://x.io/"),
            "attachment"
        );
    }
}
