//! Error taxonomy shared by drivers, stores, sources and the backup manager

use crate::config::ConfigError;
use crate::utils::command::TransferError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Configuration problems are fatal wherever they surface
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Path not found {pattern}")]
    Resolution { pattern: String },

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{count} source(s) failed to back up:\n{details}")]
    SourcesFailed { count: usize, details: String },
}

impl BackupError {
    /// Fatal errors bypass per-source error policies and abort the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, BackupError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
