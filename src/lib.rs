//! Backup Rotator Library
//!
//! Copies named sources to dated snapshot directories on S3 (via rclone) and
//! local filesystems (via rsync), then thins old snapshots on a weekly,
//! monthly and yearly schedule.

pub mod config;
pub mod drivers;
pub mod error;
pub mod managers;
pub mod retention;
pub mod source;
pub mod stores;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config, ConfigError};
pub use error::BackupError;
pub use managers::backup::{BackupManager, RunSummary};
pub use managers::logging::{init_logging, LogGuard, LoggingConfig};
pub use managers::notification::{Alerter, LogAlerter, NotificationManager};
pub use retention::{obsolete_versions, RetentionSet};
pub use source::BackupSource;
pub use stores::DestinationStore;
