//! Configuration for the kroute controller
//!
//! Every field has a serde default so partial documents deserialize, and
//! `from_env` overlays `KROUTE_*` environment variables on top.

use crate::error::ControlError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Controller configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Initial sync barrier
    #[serde(default)]
    pub sync: SyncConfig,

    /// Ingress watch subscription
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Bounds for the startup sync barrier
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Ceiling on how long construction waits for the initial list (default: 30s)
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    /// How often the sync signal is polled (default: 1000ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_max_wait() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl SyncConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Ingress watch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Restrict the watch to one namespace (None = all namespaces)
    #[serde(default)]
    pub namespace: Option<String>,

    /// Label selector applied to the watch
    #[serde(default)]
    pub label_selector: Option<String>,

    /// Capacity of the channel between the watcher and the event processor
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_event_buffer() -> usize {
    256
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            label_selector: None,
            event_buffer: default_event_buffer(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ControlError> {
        let mut config = Self::default();

        if let Some(val) = env_parse::<u64>("KROUTE_SYNC_MAX_WAIT_SECS")? {
            config.sync.max_wait_secs = val;
        }

        if let Some(val) = env_parse::<u64>("KROUTE_SYNC_POLL_INTERVAL_MS")? {
            config.sync.poll_interval_ms = val;
        }

        if let Ok(val) = env::var("KROUTE_WATCH_NAMESPACE") {
            if !val.is_empty() {
                config.watch.namespace = Some(val);
            }
        }

        if let Ok(val) = env::var("KROUTE_WATCH_LABEL_SELECTOR") {
            if !val.is_empty() {
                config.watch.label_selector = Some(val);
            }
        }

        if let Some(val) = env_parse::<usize>("KROUTE_EVENT_BUFFER")? {
            config.watch.event_buffer = val;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller cannot run with
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.sync.poll_interval_ms == 0 {
            return Err(ControlError::Config(
                "sync poll interval must be greater than zero".to_string(),
            ));
        }

        if self.watch.event_buffer == 0 {
            return Err(ControlError::Config(
                "event buffer must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ControlError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| {
                ControlError::Config(format!("{} has invalid value '{}': {}", key, raw, e))
            }),
        Err(_) => Ok(None),
    }
}
