//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Max matches dispatched per poll tick
    #[serde(rename = "max-concurrent-matches")]
    pub max_concurrent_matches: usize,

    /// Standard interval between poll ticks, in milliseconds
    #[serde(rename = "standard-poll-interval-ms")]
    pub standard_poll_interval_ms: u64,

    /// Longer interval used while the breaker is tripped or the pool is
    /// saturated, in milliseconds
    #[serde(rename = "reduced-poll-interval-ms")]
    pub reduced_poll_interval_ms: u64,

    /// Cooldown before restarting a crashed scheduler loop, in milliseconds
    #[serde(rename = "restart-delay-ms")]
    pub restart_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_matches: 10,
            standard_poll_interval_ms: 60_000,
            reduced_poll_interval_ms: 120_000,
            restart_delay_ms: 5_000,
        }
    }
}

impl SchedulerConfig {
    /// Get the standard poll interval as a Duration
    pub fn standard_poll_interval(&self) -> Duration {
        Duration::from_millis(self.standard_poll_interval_ms)
    }

    /// Get the reduced poll interval as a Duration
    pub fn reduced_poll_interval(&self) -> Duration {
        Duration::from_millis(self.reduced_poll_interval_ms)
    }

    /// Get the restart cooldown as a Duration
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_concurrent_matches, 10);
        assert_eq!(config.standard_poll_interval_ms, 60_000);
        assert_eq!(config.reduced_poll_interval_ms, 120_000);
        assert_eq!(config.restart_delay_ms, 5_000);
    }

    #[test]
    fn test_interval_helpers() {
        let config = SchedulerConfig {
            standard_poll_interval_ms: 100,
            reduced_poll_interval_ms: 200,
            ..Default::default()
        };
        assert_eq!(config.standard_poll_interval(), Duration::from_millis(100));
        assert_eq!(config.reduced_poll_interval(), Duration::from_millis(200));
    }
}
