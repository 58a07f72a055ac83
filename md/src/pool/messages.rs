//! Message types for the worker pool

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::domain::MatchId;
use crate::error::ErrorKind;

/// Terminal outcome reported by a match worker
///
/// Each worker sends exactly one of these; delivery is at-most-once and
/// ordered per worker.
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    /// Match ran to completion and its result was persisted
    Success { match_id: MatchId },

    /// Match execution failed, with a classified kind
    Failed {
        match_id: MatchId,
        kind: ErrorKind,
        message: String,
    },
}

impl WorkerOutcome {
    /// The match this outcome belongs to
    pub fn match_id(&self) -> MatchId {
        match self {
            WorkerOutcome::Success { match_id } => *match_id,
            WorkerOutcome::Failed { match_id, .. } => *match_id,
        }
    }
}

/// Requests to the worker pool task
#[derive(Debug)]
pub enum PoolRequest {
    /// Admit and spawn a worker for a match
    ///
    /// Replies false on duplicate match id or at capacity, with no side
    /// effect. Admission succeeds even while paused, so already-admitted
    /// retries are never silently dropped.
    Spawn {
        match_id: MatchId,
        reply_tx: oneshot::Sender<bool>,
    },

    /// Operator pause override, independent of the circuit breaker
    SetPaused { paused: bool },

    /// Forcibly terminate every live worker and clear the registry
    ///
    /// Replies with the number of workers terminated.
    Cleanup { reply_tx: oneshot::Sender<usize> },

    /// Point-in-time pool status
    Status { reply_tx: oneshot::Sender<PoolStatus> },

    /// Detailed listing of active workers
    Details {
        reply_tx: oneshot::Sender<Vec<ActiveWorkerInfo>>,
    },

    /// Clear a tripped breaker (sent by the armed reset timer)
    ///
    /// Carries the generation of the trip it was armed for; a reset whose
    /// generation no longer matches the current trip is ignored.
    ResetBreaker { generation: u64 },

    /// Cleanup and stop the pool task
    Shutdown,
}

/// Snapshot of the pool for the scheduler and status surface
#[derive(Debug, Clone, PartialEq)]
pub struct PoolStatus {
    pub active_workers: usize,
    pub max_workers: usize,
    pub paused: bool,
    pub breaker_tripped: bool,
    pub consecutive_failures: u32,
}

impl PoolStatus {
    /// Whether every worker slot is occupied
    pub fn saturated(&self) -> bool {
        self.active_workers >= self.max_workers
    }
}

/// Detail row for one active worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveWorkerInfo {
    #[serde(rename = "match-id")]
    pub match_id: MatchId,

    #[serde(rename = "started-at")]
    pub started_at: DateTime<Utc>,

    #[serde(rename = "running-for-ms")]
    pub running_for_ms: u64,
}

impl ActiveWorkerInfo {
    /// How long this worker has been running
    pub fn running_for(&self) -> Duration {
        Duration::from_millis(self.running_for_ms)
    }
}
