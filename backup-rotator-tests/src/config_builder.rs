//! Fluent API for building test configurations
//!
//! Provides a builder pattern for creating test configurations with sensible defaults.
//! Every path the configuration touches (store roots, lock file, alert cache)
//! lives inside the builder's temp directory.

use backup_rotator::config::{
    Config, DestinationConfig, ErrorPolicy, LogFormat, NotificationConfig, SourceConfig, StoreKind,
};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    sources: Vec<SourceConfig>,
    destinations: Vec<DestinationConfig>,
    notifications: NotificationConfig,
    log_level: String,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder with no sources or destinations
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let notifications = NotificationConfig {
            cache_file: temp_dir.path().join("alerts.json"),
            ..NotificationConfig::default()
        };

        Self {
            temp_dir,
            sources: Vec::new(),
            destinations: Vec::new(),
            notifications,
            log_level: "info".to_string(),
        }
    }

    /// A `data` source with two files and a `local` filesystem destination
    pub fn minimal() -> Self {
        let builder = Self::new();

        let data = builder.temp_dir.path().join("data");
        fs::create_dir_all(&data).expect("Failed to create data dir");
        fs::write(data.join("a.txt"), "a").expect("Failed to write a.txt");
        fs::write(data.join("b.txt"), "b").expect("Failed to write b.txt");

        let backups = builder.temp_dir.path().join("backups");
        fs::create_dir_all(&backups).expect("Failed to create backup dir");

        let include = format!("{}/*.txt", data.display());
        builder
            .add_source("data", vec![include])
            .add_filesystem_destination("local", &backups)
    }

    /// Add a source with the default (`fail`) error policy
    pub fn add_source(self, name: &str, include: Vec<String>) -> Self {
        self.add_source_with_policy(name, include, ErrorPolicy::Fail)
    }

    /// Add a source with a specific error policy
    pub fn add_source_with_policy(
        mut self,
        name: &str,
        include: Vec<String>,
        onerror: ErrorPolicy,
    ) -> Self {
        self.sources.push(SourceConfig {
            name: name.to_string(),
            include,
            exclude: vec![],
            onerror,
        });
        self
    }

    /// Add a source with full configuration
    pub fn add_source_config(mut self, source: SourceConfig) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a filesystem destination rooted at `path`
    pub fn add_filesystem_destination(self, name: &str, path: &Path) -> Self {
        let mut options = Mapping::new();
        options.insert(Value::from("path"), Value::from(path.display().to_string()));
        self.add_destination(DestinationConfig {
            store: StoreKind::Filesystem,
            name: Some(name.to_string()),
            options,
        })
    }

    /// Add an S3 destination using environment credentials
    pub fn add_s3_destination(self, name: &str, bucket: &str) -> Self {
        let mut options = Mapping::new();
        options.insert(Value::from("bucket"), Value::from(bucket));
        options.insert(Value::from("aws_env_auth"), Value::from(true));
        self.add_destination(DestinationConfig {
            store: StoreKind::Amazons3,
            name: Some(name.to_string()),
            options,
        })
    }

    /// Add a destination with custom settings
    pub fn add_destination(mut self, destination: DestinationConfig) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    /// Set notification configuration
    pub fn with_notifications(mut self, config: NotificationConfig) -> Self {
        self.notifications = config;
        self
    }

    /// Get the temp directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root of a filesystem destination
    pub fn destination_path(&self, name: &str) -> Option<PathBuf> {
        self.destinations
            .iter()
            .find(|d| d.name.as_deref() == Some(name))
            .and_then(|d| d.options.get("path"))
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    fn config(&self) -> Config {
        Config {
            source: self.sources.clone(),
            destination: self.destinations.clone(),
            log_directory: None,
            log_level: self.log_level.clone(),
            log_max_files: 10,
            log_format: LogFormat::Text,
            lock_file: self.temp_dir.path().join("backup-rotator.lock"),
            notifications: self.notifications.clone(),
        }
    }

    /// Build the Config
    pub fn build(self) -> Config {
        self.config()
    }

    /// Keep the temp directory (don't delete on drop)
    pub fn persist(self) -> (Config, TempDir) {
        let config = self.config();
        (config, self.temp_dir)
    }

    /// Write the configuration as `config.yaml` in the temp directory
    pub fn write(self) -> (PathBuf, TempDir) {
        let config = self.config();
        let path = self.temp_dir.path().join("config.yaml");
        let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");
        fs::write(&path, yaml).expect("Failed to write config");
        (path, self.temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
