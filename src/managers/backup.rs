//! Backup manager - orchestrates one backup pass
//!
//! Sources are processed in configured order; for each source every store
//! receives today's version and then loses the versions the retention policy
//! marks obsolete. Failures are routed to the owning source's error policy.

use crate::config::{Config, ConfigError};
use crate::error::{BackupError, Result};
use crate::managers::notification::{Alerter, LogAlerter, NotificationManager};
use crate::retention::{obsolete_versions, RetentionSet};
use crate::source::BackupSource;
use crate::stores::{DestinationStore, VERSION_FORMAT};
use crate::utils::executor::CommandExecutor;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// Outcome of a pass that did not abort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sources processed
    pub sources: usize,
    /// Sources whose every destination was updated
    pub succeeded: usize,
    /// Sources with errors swallowed by an `alert` or `continue` policy
    pub failed: usize,
}

pub struct BackupManager {
    sources: Vec<BackupSource>,
    stores: Vec<DestinationStore>,
    alerter: Box<dyn Alerter>,
}

impl BackupManager {
    /// Create new backup manager
    pub fn new(
        sources: Vec<BackupSource>,
        stores: Vec<DestinationStore>,
        alerter: Box<dyn Alerter>,
    ) -> Self {
        Self {
            sources,
            stores,
            alerter,
        }
    }

    /// Build sources and stores from configuration.
    ///
    /// Every store is resolved here, so an unknown kind or missing option
    /// fails before any transfer runs.
    pub fn from_config(
        config: &Config,
        executor: Arc<dyn CommandExecutor>,
    ) -> std::result::Result<Self, ConfigError> {
        let sources = config
            .source
            .iter()
            .map(BackupSource::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let stores = config
            .destination
            .iter()
            .map(|destination| DestinationStore::from_config(destination, executor.clone()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Create notification manager if webhook URL is configured
        let alerter: Box<dyn Alerter> = if !config.notifications.discord_webhook_url.is_empty() {
            Box::new(NotificationManager::new(config.notifications.clone()))
        } else {
            Box::new(LogAlerter)
        };

        Ok(Self::new(sources, stores, alerter))
    }

    pub fn sources(&self) -> &[BackupSource] {
        &self.sources
    }

    pub fn stores(&self) -> &[DestinationStore] {
        &self.stores
    }

    /// Run one pass dated `now`
    pub fn run(&mut self, now: NaiveDate) -> Result<RunSummary> {
        let start_time = Instant::now();
        let obsolete = obsolete_versions(now);

        info!(
            "Starting backup run for {} ({} source(s), {} destination(s))",
            now.format(VERSION_FORMAT),
            self.sources.len(),
            self.stores.len()
        );
        debug!(
            "Obsolete versions: {:?}",
            obsolete.iter().map(|d| d.format(VERSION_FORMAT).to_string()).collect::<Vec<_>>()
        );

        let mut summary = RunSummary {
            sources: self.sources.len(),
            ..RunSummary::default()
        };
        let mut failures = Vec::new();

        for source in self.sources.iter_mut() {
            let span = info_span!("source", name = %source.name());
            let _enter = span.enter();

            match process_source(source, &self.stores, self.alerter.as_ref(), now, &obsolete) {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(e) if e.is_fatal() => {
                    error!("Aborting run: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    error!("Backup of '{}' failed: {}", source.name(), e);
                    failures.push(format!("  {}: {}", source.name(), e));
                }
            }
        }

        let duration = start_time.elapsed().as_secs();

        if !failures.is_empty() {
            error!(
                "Backup run finished in {}s with {} failed source(s)",
                duration,
                failures.len()
            );
            return Err(BackupError::SourcesFailed {
                count: failures.len(),
                details: failures.join("\n"),
            });
        }

        if summary.failed > 0 {
            warn!(
                "Backup run finished in {}s: {}/{} source(s) completed with errors",
                duration, summary.failed, summary.sources
            );
        } else {
            info!(
                "Backup run finished in {}s: {} source(s) backed up",
                duration, summary.succeeded
            );
        }

        Ok(summary)
    }
}

/// Back up one source to every store.
///
/// `Ok(true)` when every store was updated, `Ok(false)` when an error was
/// swallowed by the source's policy.
fn process_source(
    source: &mut BackupSource,
    stores: &[DestinationStore],
    alerter: &dyn Alerter,
    now: NaiveDate,
    obsolete: &RetentionSet,
) -> Result<bool> {
    let paths = source.resolve_included_paths(now, alerter)?;
    debug!("Resolved {} path(s)", paths.len());

    let mut clean = true;

    for store in stores {
        let _span = info_span!("destination", name = %store.label()).entered();

        let result = store.add(now, source).and_then(|()| {
            for version in obsolete {
                store.remove(source, *version)?;
            }
            Ok(())
        });

        match result {
            Ok(()) => info!("Backed up '{}' to '{}'", source.name(), store.label()),
            Err(e) => {
                clean = false;
                source.handle_error(e, Some(store.label()), alerter)?;
            }
        }
    }

    Ok(clean)
}
