//! rsync driver for local filesystem destinations

use super::TransferDriver;
use crate::config::{ConfigError, DriverOptions};
use crate::error::{BackupError, Result};
use crate::utils::command::Invocation;
use crate::utils::executor::CommandExecutor;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const DEFAULT_BIN: &str = "rsync";
const REMOVE_BIN: &str = "rm";

pub struct RsyncDriver {
    bin_path: String,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    executor: Arc<dyn CommandExecutor>,
}

impl RsyncDriver {
    pub fn new(options: &DriverOptions, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            bin_path: options
                .bin_path
                .clone()
                .unwrap_or_else(|| DEFAULT_BIN.to_string()),
            env: options.env.clone(),
            timeout: options.timeout_seconds.map(Duration::from_secs),
            executor,
        }
    }

    /// Create the destination directory, refusing paths that exist as non-directories
    fn prepare_destination(destination: &Path) -> Result<()> {
        if !destination.exists() {
            fs::create_dir_all(destination).map_err(|source| BackupError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        }

        if !destination.is_dir() {
            return Err(ConfigError::NotADirectory(destination.to_path_buf()).into());
        }

        Ok(())
    }
}

impl TransferDriver for RsyncDriver {
    fn sync(&self, include: &[PathBuf], exclude: &[String], destination: &str) -> Result<()> {
        if include.is_empty() {
            info!("Skipping copy to '{}' as source list is empty", destination);
            return Ok(());
        }

        info!("rsync: syncing {} path(s) to '{}'", include.len(), destination);

        Self::prepare_destination(Path::new(destination))?;

        let mut invocation = Invocation::new(&self.bin_path)
            .arg("-avP")
            .envs(&self.env)
            .timeout(self.timeout);
        for pattern in exclude {
            invocation = invocation.arg("--exclude").arg(pattern.as_str());
        }
        let invocation = invocation
            .args(include.iter().map(|p| p.to_string_lossy().into_owned()))
            .arg(destination);

        self.executor.execute(&invocation)?;
        Ok(())
    }

    fn remove(&self, destination: &str) -> Result<()> {
        if Path::new(destination) == Path::new("/") {
            error!("rsync: refusing to remove '/' directory");
            return Ok(());
        }

        info!("rsync: removing '{}' from filesystem", destination);

        let invocation = Invocation::new(REMOVE_BIN)
            .args(["-rf", destination])
            .envs(&self.env)
            .timeout(self.timeout);
        self.executor.execute(&invocation)?;

        Ok(())
    }

    fn exists(&self, destination: &str) -> bool {
        Path::new(destination).is_dir()
    }

    fn name(&self) -> &'static str {
        "rsync"
    }
}
