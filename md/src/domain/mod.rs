//! Core domain types shared across the daemon

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a match, assigned by the hosting application
pub type MatchId = i64;

/// A match the hosting application has identified as ready to play
///
/// Produced by the match service collaborator and consumed read-only by the
/// scheduler loop. Only the id crosses into a worker; the full match record
/// stays on the application side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibleMatch {
    /// Match identifier
    pub id: MatchId,

    /// When the match was scheduled to start
    #[serde(rename = "date")]
    pub scheduled_at: DateTime<Utc>,
}

/// Point-in-time status projection for health/monitoring consumers
///
/// Derived from the worker pool registry and scheduler state; has no
/// independent lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatus {
    /// Number of workers currently executing a match
    #[serde(rename = "active-workers")]
    pub active_workers: usize,

    /// Configured concurrency ceiling
    #[serde(rename = "max-workers")]
    pub max_workers: usize,

    /// Whether the scheduler loop is live
    #[serde(rename = "scheduler-active")]
    pub scheduler_active: bool,

    /// Whether dispatch is paused (operator or circuit breaker)
    pub paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligible_match_deserializes_date_field() {
        let json = r#"{"id": 42, "date": "2026-08-29T18:00:00Z"}"#;
        let m: EligibleMatch = serde_json::from_str(json).unwrap();
        assert_eq!(m.id, 42);
        assert_eq!(m.scheduled_at.to_rfc3339(), "2026-08-29T18:00:00+00:00");
    }

    #[test]
    fn test_worker_status_serialization() {
        let status = WorkerStatus {
            active_workers: 2,
            max_workers: 4,
            scheduler_active: true,
            paused: false,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("active-workers"));
        assert!(json.contains("scheduler-active"));

        let roundtrip: WorkerStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, status);
    }
}
