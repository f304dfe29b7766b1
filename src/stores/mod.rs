//! Destination stores
//!
//! A store pairs a storage root with a [`TransferDriver`] and maps
//! `(source, version)` to `<root>/<YYYY-MM-DD>/<source name>`.
//!
//! Store kinds are resolved once at startup from the `store` discriminator:
//! - `amazons3`: root `s3://<bucket>[/<prefix>]`, rclone driver
//! - `filesystem`: root `<path>`, rsync driver

mod amazon_s3;
mod filesystem;

pub use amazon_s3::s3_root;
pub use filesystem::check_writable_dir;

use crate::config::{
    AmazonS3Options, ConfigError, DestinationConfig, FilesystemOptions, StoreKind,
};
use crate::drivers::{RcloneDriver, RsyncDriver, TransferDriver};
use crate::error::Result;
use crate::source::BackupSource;
use crate::utils::executor::CommandExecutor;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Directory name format for a version
pub const VERSION_FORMAT: &str = "%Y-%m-%d";

pub struct DestinationStore {
    label: String,
    kind: StoreKind,
    root: String,
    driver: Box<dyn TransferDriver>,
}

impl DestinationStore {
    /// Build a store from its configuration, with the kind's default driver
    pub fn from_config(
        config: &DestinationConfig,
        executor: Arc<dyn CommandExecutor>,
    ) -> std::result::Result<Self, ConfigError> {
        let options = serde_yaml::Value::Mapping(config.options.clone());
        let label = config
            .name
            .clone()
            .unwrap_or_else(|| config.store.as_str().to_string());

        let store = match config.store {
            StoreKind::Amazons3 => {
                let options: AmazonS3Options = serde_yaml::from_value(options)?;
                Self::amazon_s3(label, &options, None, executor)?
            }
            StoreKind::Filesystem => {
                let options: FilesystemOptions = serde_yaml::from_value(options)?;
                Self::filesystem(label, &options, None, executor)?
            }
        };

        debug!(
            "Configured {} store '{}' at {} ({})",
            store.kind.as_str(),
            store.label,
            store.root,
            store.driver.name()
        );
        Ok(store)
    }

    /// Amazon S3 store; `driver` overrides the default rclone driver
    pub fn amazon_s3(
        label: impl Into<String>,
        options: &AmazonS3Options,
        driver: Option<Box<dyn TransferDriver>>,
        executor: Arc<dyn CommandExecutor>,
    ) -> std::result::Result<Self, ConfigError> {
        let root = s3_root(options)?;
        let driver = match driver {
            Some(driver) => driver,
            None => Box::new(RcloneDriver::new(options, executor)?),
        };

        Ok(Self {
            label: label.into(),
            kind: StoreKind::Amazons3,
            root,
            driver,
        })
    }

    /// Local filesystem store; `driver` overrides the default rsync driver
    pub fn filesystem(
        label: impl Into<String>,
        options: &FilesystemOptions,
        driver: Option<Box<dyn TransferDriver>>,
        executor: Arc<dyn CommandExecutor>,
    ) -> std::result::Result<Self, ConfigError> {
        let path = options.path.as_deref().ok_or_else(|| ConfigError::MissingField {
            field: "path".to_string(),
            context: "filesystem store".to_string(),
        })?;
        let path = crate::config::expand_tilde(path);
        check_writable_dir(&path)?;

        let driver = match driver {
            Some(driver) => driver,
            None => Box::new(RsyncDriver::new(&options.driver, executor)),
        };

        Ok(Self {
            label: label.into(),
            kind: StoreKind::Filesystem,
            root: path.to_string_lossy().into_owned(),
            driver,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Where `backup_name` lives for `version`
    pub fn destination(&self, backup_name: &str, version: NaiveDate) -> String {
        format!(
            "{}/{}/{}",
            self.root.trim_end_matches('/'),
            version.format(VERSION_FORMAT),
            backup_name
        )
    }

    /// Transfer the source's resolved paths as `version`
    pub fn add(&self, version: NaiveDate, source: &BackupSource) -> Result<()> {
        let destination = self.destination(source.name(), version);
        self.driver
            .sync(source.included_paths(), source.excluded_paths(), &destination)
    }

    /// Delete `version` of the source if present; absent versions are a no-op
    pub fn remove(&self, source: &BackupSource, version: NaiveDate) -> Result<()> {
        let destination = self.destination(source.name(), version);
        if self.driver.exists(&destination) {
            self.driver.remove(&destination)
        } else {
            debug!("Nothing to remove at '{}'", destination);
            Ok(())
        }
    }
}
