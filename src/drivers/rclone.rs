//! rclone driver for Amazon S3 destinations
//!
//! Uses rclone's on-the-fly `:s3:` remote, so no rclone config file is needed.
//! The S3 flag set (auth mode, region, ACL, encryption, storage class) is
//! built once at construction and appended to every invocation.

use super::TransferDriver;
use crate::config::{AmazonS3Options, ConfigError};
use crate::error::Result;
use crate::utils::command::Invocation;
use crate::utils::executor::CommandExecutor;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const DEFAULT_BIN: &str = "rclone";

pub struct RcloneDriver {
    bin_path: String,
    flags: Vec<String>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    executor: Arc<dyn CommandExecutor>,
}

/// How rclone authenticates against S3
#[derive(Debug, Clone, PartialEq, Eq)]
enum Credentials {
    Keys { access_key: String, secret_key: String },
    Environment,
}

impl Credentials {
    fn from_options(options: &AmazonS3Options) -> std::result::Result<Self, ConfigError> {
        let env_auth = options.aws_env_auth.unwrap_or(false);

        match (&options.aws_access_key, &options.aws_secret_key) {
            (Some(_), Some(_)) if env_auth => Err(ConfigError::Credentials(
                "aws_env_auth cannot be combined with access/secret keys".to_string(),
            )),
            (Some(access_key), Some(secret_key)) => Ok(Credentials::Keys {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            }),
            (Some(_), None) | (None, Some(_)) => Err(ConfigError::Credentials(
                "both aws_access_key and aws_secret_key must be set".to_string(),
            )),
            (None, None) if env_auth => Ok(Credentials::Environment),
            (None, None) => Err(ConfigError::Credentials(
                "Either configure aws_env_auth or configure access/secret key".to_string(),
            )),
        }
    }
}

impl RcloneDriver {
    pub fn new(
        options: &AmazonS3Options,
        executor: Arc<dyn CommandExecutor>,
    ) -> std::result::Result<Self, ConfigError> {
        let credentials = Credentials::from_options(options)?;

        Ok(Self {
            bin_path: options
                .driver
                .bin_path
                .clone()
                .unwrap_or_else(|| DEFAULT_BIN.to_string()),
            flags: build_flags(options, &credentials),
            env: options.driver.env.clone(),
            timeout: options.driver.timeout_seconds.map(Duration::from_secs),
            executor,
        })
    }

    /// Flags appended to every rclone invocation
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    fn invocation(&self, subcommand: &str) -> Invocation {
        Invocation::new(&self.bin_path)
            .arg(subcommand)
            .envs(&self.env)
            .timeout(self.timeout)
    }
}

fn build_flags(options: &AmazonS3Options, credentials: &Credentials) -> Vec<String> {
    let mut flags: Vec<String> = vec!["-v".into(), "--s3-provider".into(), "AWS".into()];

    match credentials {
        Credentials::Environment => flags.push("--s3-env-auth".into()),
        Credentials::Keys { access_key, secret_key } => {
            flags.extend(["--s3-access-key-id".to_string(), access_key.clone()]);
            flags.extend(["--s3-secret-access-key".to_string(), secret_key.clone()]);
        }
    }

    let optional = [
        ("--s3-region", &options.aws_region),
        ("--s3-acl", &options.aws_s3_acl),
        ("--s3-server-side-encryption", &options.aws_s3_server_side_encryption),
        ("--s3-storage-class", &options.aws_s3_storage_class),
    ];
    for (flag, value) in optional {
        if let Some(value) = value {
            flags.extend([flag.to_string(), value.clone()]);
        }
    }

    flags
}

/// Rewrite `s3://bucket/key` into rclone's on-the-fly remote syntax
fn to_rclone_path(path: &str) -> String {
    path.replace("s3://", ":s3:")
}

/// Where one included path lands under the version destination.
///
/// `rclone sync` makes its target mirror the source, so every directory gets
/// its own subfolder or the next sync would delete the previous one's objects.
/// A single file only ever touches itself and is copied to the top level.
fn sync_target(path: &Path, destination: &str) -> String {
    match path.file_name() {
        Some(name) if path.is_dir() => format!(
            "{}/{}",
            destination.trim_end_matches('/'),
            name.to_string_lossy()
        ),
        _ => destination.to_string(),
    }
}

impl TransferDriver for RcloneDriver {
    fn sync(&self, include: &[PathBuf], exclude: &[String], destination: &str) -> Result<()> {
        if include.is_empty() {
            info!("Skipping copy to '{}' as source list is empty", destination);
            return Ok(());
        }

        info!("rclone: syncing {} path(s) to '{}'", include.len(), destination);

        let destination = to_rclone_path(destination);
        let excludes = exclude
            .iter()
            .flat_map(|pattern| ["--exclude".to_string(), to_rclone_path(pattern)]);
        let excludes: Vec<String> = excludes.collect();

        // rclone sync takes a single source, so each included path is its own invocation
        for path in include {
            let invocation = self
                .invocation("sync")
                .arg(to_rclone_path(&path.to_string_lossy()))
                .arg(sync_target(path, &destination))
                .args(self.flags.iter().cloned())
                .args(excludes.iter().cloned());
            self.executor.execute(&invocation)?;
        }

        Ok(())
    }

    fn remove(&self, destination: &str) -> Result<()> {
        info!("rclone: removing '{}'", destination);

        let invocation = self
            .invocation("purge")
            .arg(to_rclone_path(destination))
            .args(self.flags.iter().cloned());
        self.executor.execute(&invocation)?;

        Ok(())
    }

    /// S3 has no cheap directory check; purging is attempted unconditionally
    fn exists(&self, _destination: &str) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "rclone"
    }
}
