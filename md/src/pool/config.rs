//! Worker pool configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker pool configuration
///
/// Fixed at startup; the pool is never reconfigured while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Max concurrent match workers
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Consecutive database-class failures before the breaker trips
    #[serde(rename = "breaker-threshold")]
    pub breaker_threshold: u32,

    /// Delay before a tripped breaker auto-resets, in milliseconds
    #[serde(rename = "breaker-reset-ms")]
    pub breaker_reset_ms: u64,

    /// How long a worker lingers after reporting its outcome, in
    /// milliseconds, so the message flushes before the task ends
    #[serde(rename = "grace-delay-ms")]
    pub grace_delay_ms: u64,

    /// Request/outcome channel buffer size
    #[serde(rename = "channel-buffer")]
    pub channel_buffer: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            breaker_threshold: 5,
            breaker_reset_ms: 60_000,
            grace_delay_ms: 250,
            channel_buffer: 64,
        }
    }
}

impl PoolConfig {
    /// Get the breaker reset delay as a Duration
    pub fn breaker_reset(&self) -> Duration {
        Duration::from_millis(self.breaker_reset_ms)
    }

    /// Get the worker grace delay as a Duration
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }
}
