//! Configuration module for backup-rotator
//!
//! This module handles loading, merging and validating configuration documents
//! (YAML, or TOML when the file extension is `.toml`).
//!
//! ## Configuration Inheritance
//!
//! A document may name a base document with `extends: <path>` (relative to the
//! document itself). The base is loaded first and the child's top-level keys
//! replace the base's. Cycles in the `extends` chain are rejected.
//!
//! ## Example Usage
//!
//! ```no_run
//! use backup_rotator::config;
//!
//! let config = config::load_config("config.yaml")?;
//!
//! for source in &config.source {
//!     println!("Source: {}, Includes: {:?}", source.name, source.include);
//! }
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{load_config, merge, ConfigError, Result};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

impl Config {
    /// Lock file path with `~` expanded
    pub fn lock_path(&self) -> std::path::PathBuf {
        expand_tilde(&self.lock_file)
    }
}
