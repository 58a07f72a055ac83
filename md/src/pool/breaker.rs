//! Circuit breaker for repeated database-class failures
//!
//! Purely synchronous state; all mutation happens on the pool task. The
//! timed auto-reset lives in the pool, not here.

use std::time::Instant;

/// Failure-counting guard protecting the downstream database
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    consecutive_failures: u32,
    tripped: bool,
    tripped_at: Option<Instant>,
    generation: u64,
}

impl CircuitBreaker {
    /// Create a breaker that trips after `threshold` consecutive failures
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_failures: 0,
            tripped: false,
            tripped_at: None,
            generation: 0,
        }
    }

    /// Record a database-class failure
    ///
    /// Returns true if this failure tripped the breaker (false if it was
    /// already tripped or the threshold is not yet reached).
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        if !self.tripped && self.consecutive_failures >= self.threshold {
            self.tripped = true;
            self.tripped_at = Some(Instant::now());
            self.generation += 1;
            return true;
        }
        false
    }

    /// Record a successful outcome
    ///
    /// A single success is evidence the system has recovered: the counter
    /// zeroes entirely rather than decrementing, and any trip clears.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.tripped = false;
        self.tripped_at = None;
    }

    /// Clear the trip and the counter (timed auto-reset path)
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.tripped = false;
        self.tripped_at = None;
    }

    /// Whether the breaker is currently tripped
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Current consecutive failure count
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// When the breaker tripped, if it is tripped
    pub fn tripped_at(&self) -> Option<Instant> {
        self.tripped_at
    }

    /// Identifier of the most recent trip
    ///
    /// Increments on every trip and never resets, so a timed reset armed for
    /// an earlier trip can be told apart from one armed for the current trip.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
