use crate::config::ConfigError;
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::debug;

/// The store root must be an existing directory we can create entries in
pub fn check_writable_dir(path: &Path) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }

    let probe = path.join(format!(".backup-rotator-probe-{}", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&probe) {
        Ok(_) => {
            if let Err(e) = fs::remove_file(&probe) {
                debug!("Failed to remove write probe {:?}: {}", probe, e);
            }
            Ok(())
        }
        Err(_) => Err(ConfigError::NotWritable(path.to_path_buf())),
    }
}
