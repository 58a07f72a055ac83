//! Worker pool task implementation
//!
//! The pool owns the active-worker registry and the circuit breaker; both
//! are mutated only from this task's message-handling context, so no locks
//! are needed. The scheduler and lifecycle talk to it through [`PoolHandle`].

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::MatchId;
use crate::error::ErrorKind;
use crate::service::MatchService;
use crate::worker::spawn_match_worker;

use super::breaker::CircuitBreaker;
use super::config::PoolConfig;
use super::handle::PoolHandle;
use super::messages::{ActiveWorkerInfo, PoolRequest, PoolStatus, WorkerOutcome};

/// Registry entry for one live worker
struct ActiveWorker {
    /// Task handle, held only for forced termination
    handle: JoinHandle<()>,
    started_at: Instant,
    started_wall: DateTime<Utc>,
}

/// The WorkerPool admits match workers up to a concurrency ceiling,
/// de-duplicates by match id, and folds worker outcomes into the
/// circuit breaker.
pub struct WorkerPool {
    config: PoolConfig,
    service: Arc<dyn MatchService>,
    tx: mpsc::Sender<PoolRequest>,
    rx: mpsc::Receiver<PoolRequest>,
}

impl WorkerPool {
    /// Create a new pool with the given configuration and collaborator
    pub fn new(config: PoolConfig, service: Arc<dyn MatchService>) -> Self {
        debug!(?config, "WorkerPool::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer);
        Self {
            config,
            service,
            tx,
            rx,
        }
    }

    /// Create a handle for talking to this pool
    pub fn handle(&self) -> PoolHandle {
        PoolHandle::new(self.tx.clone())
    }

    /// Run the pool task
    ///
    /// Consumes the pool and runs until a Shutdown request arrives.
    pub async fn run(mut self) {
        let pool_tx = self.tx.clone();
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<WorkerOutcome>(self.config.channel_buffer);

        let mut registry: HashMap<MatchId, ActiveWorker> = HashMap::new();
        let mut breaker = CircuitBreaker::new(self.config.breaker_threshold);
        // Pause attribution stays split: the operator flag moves only on
        // SetPaused, the breaker flag only on trip/reset/success. Dispatch
        // is paused while either is set.
        let mut operator_paused = false;
        let mut breaker_paused = false;

        info!(max_workers = self.config.max_workers, "Worker pool started");

        loop {
            tokio::select! {
                req = self.rx.recv() => {
                    let Some(req) = req else { break };

                    match req {
                        PoolRequest::Spawn { match_id, reply_tx } => {
                            // Admission is the single concurrency invariant
                            // protecting the non-idempotent worker contract:
                            // one entry per match id, never above capacity.
                            let admitted = if registry.contains_key(&match_id) {
                                debug!(match_id, "Spawn rejected: match already has an active worker");
                                false
                            } else if registry.len() >= self.config.max_workers {
                                debug!(
                                    match_id,
                                    max_workers = self.config.max_workers,
                                    "Spawn rejected: pool at capacity"
                                );
                                false
                            } else {
                                let handle = spawn_match_worker(
                                    match_id,
                                    self.service.clone(),
                                    outcome_tx.clone(),
                                    self.config.grace_delay(),
                                );
                                registry.insert(
                                    match_id,
                                    ActiveWorker {
                                        handle,
                                        started_at: Instant::now(),
                                        started_wall: Utc::now(),
                                    },
                                );
                                info!(match_id, active = registry.len(), "Admitted match worker");
                                true
                            };

                            let _ = reply_tx.send(admitted);
                        }

                        PoolRequest::SetPaused { paused: p } => {
                            info!(paused = p, "Operator pause state set");
                            operator_paused = p;
                        }

                        PoolRequest::Cleanup { reply_tx } => {
                            let terminated = cleanup_workers(&mut registry);
                            let _ = reply_tx.send(terminated);
                        }

                        PoolRequest::Status { reply_tx } => {
                            let _ = reply_tx.send(PoolStatus {
                                active_workers: registry.len(),
                                max_workers: self.config.max_workers,
                                paused: operator_paused || breaker_paused,
                                breaker_tripped: breaker.is_tripped(),
                                consecutive_failures: breaker.consecutive_failures(),
                            });
                        }

                        PoolRequest::Details { reply_tx } => {
                            let mut details: Vec<_> = registry
                                .iter()
                                .map(|(match_id, worker)| ActiveWorkerInfo {
                                    match_id: *match_id,
                                    started_at: worker.started_wall,
                                    running_for_ms: worker.started_at.elapsed().as_millis() as u64,
                                })
                                .collect();
                            details.sort_by_key(|d| d.started_at);
                            let _ = reply_tx.send(details);
                        }

                        PoolRequest::ResetBreaker { generation } => {
                            if breaker.is_tripped() && generation == breaker.generation() {
                                info!("Circuit breaker reset, resuming normal operation");
                                breaker.reset();
                                breaker_paused = false;
                            } else {
                                debug!(generation, "ResetBreaker for a cleared or superseded trip, ignoring");
                            }
                        }

                        PoolRequest::Shutdown => {
                            info!("Worker pool shutting down");
                            cleanup_workers(&mut registry);
                            break;
                        }
                    }
                }

                Some(outcome) = outcome_rx.recv() => {
                    let match_id = outcome.match_id();

                    // The registry entry goes away unconditionally, whatever
                    // the outcome was.
                    if registry.remove(&match_id).is_none() {
                        debug!(match_id, "Outcome for a worker not in the registry");
                    }

                    match outcome {
                        WorkerOutcome::Success { .. } => {
                            info!(match_id, active = registry.len(), "Match worker completed");
                            breaker.record_success();
                            breaker_paused = false;
                        }

                        WorkerOutcome::Failed { kind: ErrorKind::TransientConnectivity, message, .. } => {
                            warn!(match_id, %message, "Connectivity failure from worker");
                            if breaker.record_failure() {
                                warn!(
                                    failures = breaker.consecutive_failures(),
                                    reset_ms = self.config.breaker_reset_ms,
                                    "Circuit breaker tripped, pausing dispatch"
                                );
                                breaker_paused = true;

                                // Arm the auto-reset, stamped with this
                                // trip's generation so a timer from an
                                // earlier trip cannot clear this one. If the
                                // pool is gone by then, the send fails
                                // harmlessly.
                                let reset_tx = pool_tx.clone();
                                let delay = self.config.breaker_reset();
                                let generation = breaker.generation();
                                tokio::spawn(async move {
                                    tokio::time::sleep(delay).await;
                                    let _ = reset_tx.send(PoolRequest::ResetBreaker { generation }).await;
                                });
                            }
                        }

                        WorkerOutcome::Failed { kind, message, .. } => {
                            // Business/unknown failures surface in the match
                            // record for later investigation; the breaker is
                            // about the database, not about match logic.
                            warn!(match_id, ?kind, %message, "Match worker failed");
                        }
                    }
                }
            }
        }

        info!("Worker pool stopped");
    }
}

/// Forcibly terminate every live worker and clear the registry
///
/// Resilient to individual terminations going wrong: each one is logged and
/// the sweep continues. Returns the number of workers that were still live.
fn cleanup_workers(registry: &mut HashMap<MatchId, ActiveWorker>) -> usize {
    let mut terminated = 0;
    for (match_id, worker) in registry.drain() {
        if worker.handle.is_finished() {
            debug!(match_id, "Worker already finished during cleanup");
            continue;
        }
        worker.handle.abort();
        terminated += 1;
        // An aborted worker abandons its match mid-execution; the match
        // stays eligible and is retried on next discovery.
        warn!(match_id, "Terminated active match worker");
    }
    info!(terminated, "Worker pool cleanup complete");
    terminated
}
