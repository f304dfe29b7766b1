//! Transfer drivers: thin wrappers that turn sync/remove requests into
//! argument vectors for an external tool.

pub mod rclone;
pub mod rsync;

pub use rclone::RcloneDriver;
pub use rsync::RsyncDriver;

use crate::error::Result;
use std::path::PathBuf;

/// Capability set every destination backend provides
#[cfg_attr(test, mockall::automock)]
pub trait TransferDriver: Send + Sync {
    /// Copy `include` paths to `destination`, never transferring anything
    /// matched by `exclude`. An empty include list is a logged no-op.
    fn sync(&self, include: &[PathBuf], exclude: &[String], destination: &str) -> Result<()>;

    /// Recursively delete `destination`
    fn remove(&self, destination: &str) -> Result<()>;

    /// Whether `destination` is present (backends may answer conservatively)
    fn exists(&self, destination: &str) -> bool;

    /// Driver name (for logging)
    fn name(&self) -> &'static str;
}
