//! MatchDaemon configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pool::PoolConfig;
use crate::scheduler::SchedulerConfig;

/// Main MatchDaemon configuration
///
/// Fixed at startup; nothing is hot-reloaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosting application API
    pub service: ServiceConfig,

    /// Worker pool limits and circuit breaker
    pub pool: PoolConfig,

    /// Poll cadence and restart behavior
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.service.base_url.is_empty() {
            return Err(eyre::eyre!("service.base-url must not be empty"));
        }
        if self.pool.max_workers == 0 {
            return Err(eyre::eyre!("pool.max-workers must be at least 1"));
        }
        if self.pool.breaker_threshold == 0 {
            return Err(eyre::eyre!("pool.breaker-threshold must be at least 1"));
        }
        if self.scheduler.standard_poll_interval_ms == 0 {
            return Err(eyre::eyre!("scheduler.standard-poll-interval-ms must be at least 1"));
        }
        if self.scheduler.reduced_poll_interval_ms < self.scheduler.standard_poll_interval_ms {
            return Err(eyre::eyre!(
                "scheduler.reduced-poll-interval-ms must not be shorter than the standard interval"
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .matchdaemon.yml
        let local_config = PathBuf::from(".matchdaemon.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/matchdaemon/matchdaemon.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("matchdaemon").join("matchdaemon.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Hosting application API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the hosting application
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}
