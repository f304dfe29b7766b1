use anyhow::{Context, Result};
use backup_rotator::managers::logging::{init_logging, LoggingConfig};
use backup_rotator::utils::executor::RealExecutor;
use backup_rotator::utils::locker::RunLock;
use backup_rotator::{config, BackupManager};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "backup-rotator")]
#[command(about = "Dated snapshot backups with weekly, monthly and yearly thinning", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short = 'c', long = "config-file", default_value = "./config.yaml")]
    config_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = config::load_config(&cli.config_file)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config_file))?;

    // Setup logging (must keep guard alive)
    let logging_config = LoggingConfig::from_config(&config);
    let _log_guard = init_logging(&logging_config)?;

    // Acquire lock to prevent overlapping runs
    let mut lock = RunLock::open(&config.lock_path())?;
    let _lock_guard = lock.try_acquire()?;

    let mut manager = BackupManager::from_config(&config, Arc::new(RealExecutor::new()))?;

    let now = Local::now().date_naive();
    let summary = manager.run(now)?;

    info!(
        "Done: {} source(s), {} succeeded, {} with handled errors",
        summary.sources, summary.succeeded, summary.failed
    );

    Ok(())
}
