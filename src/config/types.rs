use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration document (after `extends` merging)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Backup sources, processed in order
    #[serde(default)]
    pub source: Vec<SourceConfig>,

    /// Destination stores, processed in order for every source
    #[serde(default)]
    pub destination: Vec<DestinationConfig>,

    /// Logging configuration
    #[serde(default)]
    pub log_directory: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,
    #[serde(default)]
    pub log_format: LogFormat,

    /// Lock file guarding against overlapping runs
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// One named data source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,

    /// Include patterns; may contain `%Y`, `%m`, `%d` and `%LATEST`
    pub include: Vec<String>,

    /// Exclude patterns, passed literally to the transfer tool
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub onerror: ErrorPolicy,
}

/// What a source does when one of its patterns or destinations fails
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    #[default]
    #[serde(alias = "exception")]
    Fail,
    Alert,
    Continue,
}

/// A configured destination; `options` are interpreted per store kind
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DestinationConfig {
    pub store: StoreKind,

    /// Label used in logs (defaults to the store kind)
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub options: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Amazons3,
    Filesystem,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Amazons3 => "amazons3",
            StoreKind::Filesystem => "filesystem",
        }
    }
}

/// Options shared by every transfer driver
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DriverOptions {
    /// Path to the transfer tool (defaults per driver)
    #[serde(default)]
    pub bin_path: Option<String>,

    /// Extra environment variables for the spawned tool
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Per-invocation timeout
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// `amazons3` store options
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AmazonS3Options {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub aws_access_key: Option<String>,
    #[serde(default)]
    pub aws_secret_key: Option<String>,
    #[serde(default)]
    pub aws_env_auth: Option<bool>,

    #[serde(default)]
    pub aws_region: Option<String>,
    #[serde(default)]
    pub aws_s3_acl: Option<String>,
    #[serde(default)]
    pub aws_s3_server_side_encryption: Option<String>,
    #[serde(default)]
    pub aws_s3_storage_class: Option<String>,

    #[serde(flatten)]
    pub driver: DriverOptions,
}

/// `filesystem` store options
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilesystemOptions {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(flatten)]
    pub driver: DriverOptions,
}

/// Alert webhook configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub discord_webhook_url: String,

    #[serde(default = "default_rate_limit")]
    pub rate_limit_minutes: u64,

    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            discord_webhook_url: String::new(),
            rate_limit_minutes: default_rate_limit(),
            cache_file: default_cache_file(),
        }
    }
}

// Default value functions

fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
fn default_lock_file() -> PathBuf { std::env::temp_dir().join("backup-rotator.lock") }
fn default_rate_limit() -> u64 { 60 }
fn default_cache_file() -> PathBuf {
    PathBuf::from("~/.cache/backup-rotator-alerts.json")
}
