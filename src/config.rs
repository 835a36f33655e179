//! Bridge configuration
//!
//! Defaults mirror the host shell: bundled assets are served under the
//! platform asset-loader domain, upstream calls time out after 60 seconds and
//! inserted calendar events carry the `Europe/Berlin` timezone. Every value can
//! be overridden from a JSON file or from `WEBSHELL_*` environment variables.

use crate::error::{AppError, AppResult};
use chrono_tz::Tz;
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_SYNTHETIC_ORIGIN: &str = "https://appassets.androidplatform.net";
pub const DEFAULT_EVENT_TIMEZONE: &str = "Europe/Berlin";
pub const DEFAULT_MAX_NOTIFICATIONS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Origin under which bundled assets are served
    pub synthetic_origin: String,
    /// Upstream timeout for proxied requests, in seconds
    pub upstream_timeout_secs: u64,
    pub pending_body_capacity: usize,
    /// Seconds before a captured request body expires
    pub pending_body_ttl_secs: u64,
    /// Timezone stored alongside every inserted calendar event
    pub event_timezone: String,
    /// Zone used to anchor iCalendar wall-clock digits; `None` uses the system zone
    pub date_anchor_zone: Option<String>,
    /// Upper bound of notifications emitted per pull cycle
    pub max_notifications: usize,
    pub database_path: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            synthetic_origin: DEFAULT_SYNTHETIC_ORIGIN.to_string(),
            upstream_timeout_secs: 60,
            pending_body_capacity: 256,
            pending_body_ttl_secs: 300,
            event_timezone: DEFAULT_EVENT_TIMEZONE.to_string(),
            date_anchor_zone: None,
            max_notifications: DEFAULT_MAX_NOTIFICATIONS,
            database_path: None,
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: BridgeConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Applies `WEBSHELL_*` overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> AppResult<Self> {
        if let Ok(origin) = env::var("WEBSHELL_SYNTHETIC_ORIGIN") {
            self.synthetic_origin = origin;
        }
        if let Ok(timeout) = env::var("WEBSHELL_UPSTREAM_TIMEOUT_SECS") {
            self.upstream_timeout_secs = parse_env("WEBSHELL_UPSTREAM_TIMEOUT_SECS", &timeout)?;
        }
        if let Ok(capacity) = env::var("WEBSHELL_PENDING_BODY_CAPACITY") {
            self.pending_body_capacity = parse_env("WEBSHELL_PENDING_BODY_CAPACITY", &capacity)?;
        }
        if let Ok(ttl) = env::var("WEBSHELL_PENDING_BODY_TTL_SECS") {
            self.pending_body_ttl_secs = parse_env("WEBSHELL_PENDING_BODY_TTL_SECS", &ttl)?;
        }
        if let Ok(tz) = env::var("WEBSHELL_EVENT_TIMEZONE") {
            self.event_timezone = tz;
        }
        if let Ok(zone) = env::var("WEBSHELL_DATE_ANCHOR_ZONE") {
            self.date_anchor_zone = if zone.trim().is_empty() { None } else { Some(zone) };
        }
        if let Ok(max) = env::var("WEBSHELL_MAX_NOTIFICATIONS") {
            self.max_notifications = parse_env("WEBSHELL_MAX_NOTIFICATIONS", &max)?;
        }
        if let Ok(path) = env::var("WEBSHELL_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    pub fn validate(&self) -> AppResult<()> {
        let origin = Url::parse(&self.synthetic_origin).map_err(|e| {
            AppError::config(format!("Invalid synthetic origin '{}': {}", self.synthetic_origin, e))
        })?;
        if origin.scheme() != "https" && origin.scheme() != "http" {
            return Err(AppError::config(format!(
                "Synthetic origin must be http(s), got '{}://'",
                origin.scheme()
            )));
        }
        if origin.host_str().is_none() {
            return Err(AppError::config("Synthetic origin must have a host"));
        }

        if self.upstream_timeout_secs == 0 {
            return Err(AppError::config("Upstream timeout must be at least one second"));
        }
        if self.pending_body_capacity == 0 {
            return Err(AppError::config("Pending body capacity must be greater than zero"));
        }
        if self.pending_body_ttl_secs == 0 {
            return Err(AppError::config("Pending body TTL must be at least one second"));
        }

        Tz::from_str(&self.event_timezone).map_err(|_| {
            AppError::config(format!("Unknown event timezone '{}'", self.event_timezone))
        })?;
        if let Some(zone) = &self.date_anchor_zone {
            Tz::from_str(zone)
                .map_err(|_| AppError::config(format!("Unknown date anchor zone '{}'", zone)))?;
        }

        info!(
            "Configuration valid (origin {}, upstream timeout {}s)",
            self.synthetic_origin, self.upstream_timeout_secs
        );
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn pending_body_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_body_ttl_secs)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("webshell-bridge")
                .join("calendar.db")
        })
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::config(format!("{} has an invalid value '{}'", key, value)))
}
