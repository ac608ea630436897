//! Configuration management for `ljsync`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (including a `.env` file in the working directory)
//! 3. Project config (`./.linear-jira-sync.yaml`)
//! 4. User config (`~/.linear-jira-sync/config.yaml`)
//! 5. Defaults
//!
//! Keys are compared case-insensitively with `.`, `-` and `_` ignored, so
//! `JIRA_API_URL`, `jira.api.url` and nested YAML `jira: { api: { url } }`
//! all address the same setting.

use crate::error::{Result, SyncError};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under `$HOME` holding user config and the default state file.
pub const APP_DIR_NAME: &str = ".linear-jira-sync";
/// State file name inside the storage location.
pub const STATE_FILE_NAME: &str = ".syncstate.json";
/// Project-level config file, looked up in the working directory.
const PROJECT_CONFIG_FILE: &str = ".linear-jira-sync.yaml";

const DEFAULT_LINEAR_API_URL: &str = "https://api.linear.app/graphql";
const DEFAULT_ISSUE_TYPE: &str = "Task";
const DEFAULT_MAX_BACKUPS: usize = 5;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Every key the tool understands, in canonical dotted form.
const KNOWN_KEYS: &[&str] = &[
    "linear.api.url",
    "linear.api.token",
    "jira.api.url",
    "jira.api.username",
    "jira.api.token",
    "jira.project.key",
    "jira.issue.type",
    "jira.custom-field.linear-id",
    "jira.enable-priority",
    "jira.enable-status-sync",
    "sync.storage.location",
    "sync.storage.max-backups",
    "sync.storage.backup-location",
    "sync.dry-run",
    "attachment.sync.enabled",
    "attachment.download.timeout",
    "attachment.download.max-size",
];

/// Environment names that do not squash onto a canonical key.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("JIRA_USERNAME", "jira.api.username"),
    ("LINEARSYNC_STORAGE_LOCATION", "sync.storage.location"),
    ("LINEARSYNC_MAX_BACKUPS", "sync.storage.max-backups"),
    ("LINEARSYNC_BACKUP_LOCATION", "sync.storage.backup-location"),
    ("LINEARSYNC_DRY_RUN", "sync.dry-run"),
];

/// A flat set of configuration values from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from arbitrary `(name, value)` pairs shaped like env vars.
    ///
    /// Only names that map onto a known key are kept, so unrelated variables
    /// such as `PATH` never leak into the configuration.
    #[must_use]
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (name, value) in vars {
            if let Some(canonical) = canonical_env_key(&name) {
                layer.values.insert(canonical.to_string(), value);
            }
        }
        layer
    }

    /// Look up a value by any spelling of its key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let wanted = squash_key(key);
        self.values
            .iter()
            .find(|(candidate, _)| squash_key(candidate) == wanted)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.trim().is_empty())
    }

    fn insert(&mut self, key: &str, value: String) {
        let squashed = squash_key(key);
        let canonical = KNOWN_KEYS
            .iter()
            .find(|known| squash_key(known) == squashed)
            .map_or_else(|| key.trim().to_lowercase(), |known| (*known).to_string());
        self.values.insert(canonical, value);
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub state_dir: Option<PathBuf>,
    pub dry_run: Option<bool>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(dir) = &self.state_dir {
            layer.insert("sync.storage.location", dir.to_string_lossy().to_string());
        }
        if let Some(dry_run) = self.dry_run {
            layer.insert("sync.dry-run", dry_run.to_string());
        }

        layer
    }
}

/// Immutable settings assembled once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub linear_api_url: String,
    pub linear_api_token: Option<String>,
    pub jira_api_url: Option<String>,
    pub jira_username: Option<String>,
    pub jira_api_token: Option<String>,
    pub jira_project_key: Option<String>,
    pub jira_issue_type: String,
    pub jira_linear_id_field: Option<String>,
    pub enable_priority: bool,
    pub enable_status_sync: bool,
    pub storage_location: PathBuf,
    pub max_backups: usize,
    /// Where state backups go; `None` keeps them next to the state file.
    pub backup_location: Option<PathBuf>,
    pub dry_run: bool,
    pub attachment_sync_enabled: bool,
    pub download_timeout: Duration,
    pub download_max_size: u64,
}

impl SyncConfig {
    /// Resolve typed settings from a merged layer.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Config` if a boolean or numeric value is malformed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let owned = |key: &str| layer.get(key).map(|v| v.trim().to_string());

        Ok(Self {
            linear_api_url: owned("linear.api.url")
                .unwrap_or_else(|| DEFAULT_LINEAR_API_URL.to_string()),
            linear_api_token: owned("linear.api.token"),
            jira_api_url: owned("jira.api.url").map(|url| url.trim_end_matches('/').to_string()),
            jira_username: owned("jira.api.username"),
            jira_api_token: owned("jira.api.token"),
            jira_project_key: owned("jira.project.key"),
            jira_issue_type: owned("jira.issue.type")
                .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string()),
            jira_linear_id_field: owned("jira.custom-field.linear-id"),
            enable_priority: bool_value(layer, "jira.enable-priority", false)?,
            enable_status_sync: bool_value(layer, "jira.enable-status-sync", true)?,
            storage_location: owned("sync.storage.location")
                .map_or_else(default_storage_location, PathBuf::from),
            max_backups: number_value(layer, "sync.storage.max-backups", DEFAULT_MAX_BACKUPS)?,
            backup_location: owned("sync.storage.backup-location")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            dry_run: bool_value(layer, "sync.dry-run", false)?,
            attachment_sync_enabled: bool_value(layer, "attachment.sync.enabled", true)?,
            download_timeout: Duration::from_secs(number_value(
                layer,
                "attachment.download.timeout",
                DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            )?),
            download_max_size: number_value(
                layer,
                "attachment.download.max-size",
                DEFAULT_DOWNLOAD_MAX_SIZE,
            )?,
        })
    }

    /// Check that every credential needed to talk to both trackers is set.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MissingConfig` naming the first absent key.
    pub fn validate(&self) -> Result<()> {
        let required: [(&Option<String>, &'static str, &'static str, &'static str); 5] = [
            (
                &self.linear_api_token,
                "Linear API token",
                "linear.api.token",
                "LINEAR_API_TOKEN",
            ),
            (
                &self.jira_username,
                "Jira username",
                "jira.api.username",
                "JIRA_USERNAME",
            ),
            (
                &self.jira_api_token,
                "Jira API token",
                "jira.api.token",
                "JIRA_API_TOKEN",
            ),
            (
                &self.jira_project_key,
                "Jira project key",
                "jira.project.key",
                "JIRA_PROJECT_KEY",
            ),
            (&self.jira_api_url, "Jira API URL", "jira.api.url", "JIRA_API_URL"),
        ];

        for (value, what, key, env) in required {
            if value.is_none() {
                return Err(SyncError::MissingConfig { what, key, env });
            }
        }
        Ok(())
    }

    /// Full path of the state document.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.storage_location.join(STATE_FILE_NAME)
    }

    /// The Linear-id custom field in `customfield_<N>` form, if configured.
    #[must_use]
    pub fn linear_id_field_name(&self) -> Option<String> {
        self.jira_linear_id_field.as_deref().map(|field| {
            if field.starts_with("customfield_") {
                field.to_string()
            } else {
                format!("customfield_{field}")
            }
        })
    }
}

/// Load user config (`~/.linear-jira-sync/config.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    ConfigLayer::from_yaml(&Path::new(&home).join(APP_DIR_NAME).join("config.yaml"))
}

/// Load project config from the given directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&dir.join(PROJECT_CONFIG_FILE))
}

/// Load and merge every configuration source into a `SyncConfig`.
///
/// # Errors
///
/// Returns an error if a config file is unreadable or a value is malformed.
pub fn load_config(cli: &CliOverrides) -> Result<SyncConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
    }

    let cwd = env::current_dir()?;
    let merged = ConfigLayer::merge_layers(&[
        load_user_config()?,
        load_project_config(&cwd)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]);
    SyncConfig::from_layer(&merged)
}

fn default_storage_location() -> PathBuf {
    env::var("HOME").map_or_else(
        |_| PathBuf::from(APP_DIR_NAME),
        |home| Path::new(&home).join(APP_DIR_NAME),
    )
}

fn squash_key(key: &str) -> String {
    key.trim()
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn canonical_env_key(name: &str) -> Option<&'static str> {
    if let Some((_, key)) = ENV_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
    {
        return Some(key);
    }
    let squashed = squash_key(name);
    KNOWN_KEYS
        .iter()
        .copied()
        .find(|known| squash_key(known) == squashed)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn bool_value(layer: &ConfigLayer, key: &str, default: bool) -> Result<bool> {
    layer.get(key).map_or(Ok(default), |raw| {
        parse_bool(raw)
            .ok_or_else(|| SyncError::Config(format!("{key}: expected a boolean, got '{raw}'")))
    })
}

fn number_value<T: std::str::FromStr>(layer: &ConfigLayer, key: &str, default: T) -> Result<T> {
    layer.get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|_| SyncError::Config(format!("{key}: expected a number, got '{raw}'")))
    })
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
