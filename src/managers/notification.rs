//! Alerts raised by sources configured with `onerror: alert`
//!
//! Every alert is logged at ERROR level. When a Discord webhook is
//! configured, alerts are also posted there, rate-limited per source and
//! destination.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use crate::config::{expand_tilde, NotificationConfig};
use crate::error::BackupError;

/// Receives alert-worthy failures
pub trait Alerter: Send + Sync {
    fn alert(&self, source: &str, destination: Option<&str>, error: &BackupError);
}

impl<A: Alerter + ?Sized> Alerter for std::sync::Arc<A> {
    fn alert(&self, source: &str, destination: Option<&str>, error: &BackupError) {
        (**self).alert(source, destination, error)
    }
}

/// Logs alerts; used when no webhook is configured
#[derive(Debug, Clone, Default)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn alert(&self, source: &str, destination: Option<&str>, error: &BackupError) {
        log_alert(source, destination, error);
    }
}

fn log_alert(source: &str, destination: Option<&str>, error: &BackupError) {
    match destination {
        Some(destination) => error!(
            "ALERT: backup of '{}' to '{}' failed: {}",
            source, destination, error
        ),
        None => error!("ALERT: backup of '{}' failed: {}", source, error),
    }
}

/// Collects alerts in memory
#[derive(Debug, Default)]
pub struct RecordingAlerter {
    alerts: Mutex<Vec<(String, Option<String>, String)>>,
}

impl RecordingAlerter {
    /// `(source, destination, error message)` for every alert so far
    pub fn alerts(&self) -> Vec<(String, Option<String>, String)> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Alerter for RecordingAlerter {
    fn alert(&self, source: &str, destination: Option<&str>, error: &BackupError) {
        self.alerts.lock().unwrap().push((
            source.to_string(),
            destination.map(String::from),
            error.to_string(),
        ));
    }
}

/// Discord embed color for alerts (decimal, #E74C3C)
const ALERT_COLOR: u32 = 15158332;

/// Notification manager for sending Discord webhooks
pub struct NotificationManager {
    config: NotificationConfig,
    cache_path: PathBuf,
}

/// Alert payload to send
#[derive(Debug, Clone)]
pub struct Notification {
    pub source_name: String,
    pub destination: Option<String>,
    pub message: String,
    pub error: String,
}

/// Discord webhook payload
#[derive(Debug, Serialize)]
struct DiscordPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<DiscordField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<DiscordFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

/// Rate limit cache entry
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Unix timestamp of last notification
    last_sent: u64,
    /// Count of notifications sent in current window
    count: u32,
}

/// Rate limit cache
#[derive(Debug, Serialize, Deserialize, Default)]
struct NotificationCache {
    /// Map of cache key to entry
    entries: HashMap<String, CacheEntry>,
}

impl NotificationManager {
    /// Create a new notification manager
    pub fn new(config: NotificationConfig) -> Self {
        let cache_path = expand_tilde(&config.cache_file);
        Self { config, cache_path }
    }

    /// Check if webhook delivery is configured
    pub fn is_enabled(&self) -> bool {
        !self.config.discord_webhook_url.is_empty()
    }

    /// Send a notification if enabled and not rate-limited
    pub fn send(&self, notification: Notification) -> Result<()> {
        if !self.is_enabled() {
            debug!("No webhook configured, skipping notification");
            return Ok(());
        }

        // Check rate limit
        let cache_key = format!(
            "{}:{}",
            notification.source_name,
            notification.destination.as_deref().unwrap_or("all"),
        );

        if self.is_rate_limited(&cache_key)? {
            debug!("Notification rate-limited for key: {}", cache_key);
            return Ok(());
        }

        // Build and send the webhook
        let payload = build_payload(&notification);
        self.send_webhook(&payload)?;

        // Update rate limit cache
        self.update_cache(&cache_key)?;

        info!(
            "Sent alert notification for source '{}'",
            notification.source_name
        );

        Ok(())
    }

    /// Send webhook to Discord
    fn send_webhook(&self, payload: &DiscordPayload) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .post(&self.config.discord_webhook_url)
            .json(payload)
            .send()
            .context("Failed to send Discord webhook")?;

        let status = response.status();
        if status.is_success() {
            debug!("Discord webhook sent successfully");
            Ok(())
        } else {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Discord webhook failed with status {}: {}", status, body)
        }
    }

    /// Check if a notification is rate-limited
    fn is_rate_limited(&self, cache_key: &str) -> Result<bool> {
        let cache = self.load_cache()?;

        if let Some(entry) = cache.entries.get(cache_key) {
            let rate_limit_secs = self.config.rate_limit_minutes * 60;
            if unix_now().saturating_sub(entry.last_sent) < rate_limit_secs {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Update the rate limit cache
    fn update_cache(&self, cache_key: &str) -> Result<()> {
        let mut cache = self.load_cache()?;
        let now = unix_now();

        let count = cache.entries.get(cache_key).map_or(1, |e| e.count + 1);
        cache.entries.insert(
            cache_key.to_string(),
            CacheEntry {
                last_sent: now,
                count,
            },
        );

        // Clean up old entries (older than 24 hours)
        let cutoff = now.saturating_sub(86400);
        cache.entries.retain(|_, v| v.last_sent > cutoff);

        self.save_cache(&cache)
    }

    /// Load the notification cache from disk
    fn load_cache(&self) -> Result<NotificationCache> {
        if !self.cache_path.exists() {
            return Ok(NotificationCache::default());
        }

        let content = fs::read_to_string(&self.cache_path)
            .context("Failed to read notification cache")?;

        serde_json::from_str(&content)
            .context("Failed to parse notification cache")
    }

    /// Save the notification cache to disk
    fn save_cache(&self, cache: &NotificationCache) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(cache)
            .context("Failed to serialize notification cache")?;

        fs::write(&self.cache_path, content)
            .context("Failed to write notification cache")?;

        Ok(())
    }
}

impl Alerter for NotificationManager {
    fn alert(&self, source: &str, destination: Option<&str>, error: &BackupError) {
        log_alert(source, destination, error);

        let notification = Notification {
            source_name: source.to_string(),
            destination: destination.map(String::from),
            message: format!("Backup failed for source '{}'", source),
            error: error.to_string(),
        };

        if let Err(e) = self.send(notification) {
            warn!("Failed to send alert notification: {}", e);
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Build Discord webhook payload
fn build_payload(notification: &Notification) -> DiscordPayload {
    let mut fields = vec![DiscordField {
        name: "Source".to_string(),
        value: notification.source_name.clone(),
        inline: true,
    }];

    if let Some(ref dest) = notification.destination {
        fields.push(DiscordField {
            name: "Destination".to_string(),
            value: dest.clone(),
            inline: true,
        });
    }

    // Truncate error message if too long
    let error_display = if notification.error.chars().count() > 500 {
        let truncated: String = notification.error.chars().take(497).collect();
        format!("{}...", truncated)
    } else {
        notification.error.clone()
    };
    fields.push(DiscordField {
        name: "Error".to_string(),
        value: format!("```\n{}\n```", error_display),
        inline: false,
    });

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    DiscordPayload {
        username: Some("Backup Rotator".to_string()),
        embeds: vec![DiscordEmbed {
            title: "\u{274C} Backup Rotator: Alert".to_string(),
            description: Some(notification.message.clone()),
            color: ALERT_COLOR,
            fields,
            footer: Some(DiscordFooter {
                text: "backup-rotator".to_string(),
            }),
            timestamp: Some(timestamp),
        }],
    }
}
