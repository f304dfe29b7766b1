//! Test utilities for backup-rotator
//!
//! This crate provides shared test utilities, configuration builders
//! and fixtures for testing the backup-rotator application.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, MockExecutor};
//!
//! #[test]
//! fn my_test() {
//!     let builder = ConfigBuilder::minimal();
//!     let config = builder.build();
//!     // ... test code
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use test_context::{OptionAssertions, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use backup_rotator::config::{
    AmazonS3Options, Config, DestinationConfig, DriverOptions, ErrorPolicy, FilesystemOptions,
    NotificationConfig, SourceConfig, StoreKind,
};

// Re-export mock implementations from the main crate
pub use backup_rotator::managers::notification::RecordingAlerter;
pub use backup_rotator::utils::executor::mock::{MockExecutor, MockResponse};
pub use backup_rotator::utils::executor::CommandExecutor;

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
