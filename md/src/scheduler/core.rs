//! Scheduler loop implementation
//!
//! A single long-lived task that wakes on an interval, asks the match
//! service for eligible matches, and dispatches one worker per match through
//! the pool up to available capacity. State machine:
//! Stopped -> Running -> (Paused <-> Running) -> Stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::pool::PoolHandle;
use crate::service::MatchService;

use super::config::SchedulerConfig;

/// Scheduler state readable from outside the loop task
///
/// Written by the loop and by pause/resume; read by status queries. Atomics
/// instead of a lock: every field is independently meaningful.
#[derive(Debug, Default)]
pub struct SchedulerShared {
    running: AtomicBool,
    paused: AtomicBool,
    current_poll_interval_ms: AtomicU64,
}

impl SchedulerShared {
    /// Create state for a stopped, unpaused scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the loop is live
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether dispatch is paused by the operator
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// The poll cadence currently in effect, in milliseconds
    pub fn current_poll_interval_ms(&self) -> u64 {
        self.current_poll_interval_ms.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    fn set_current_poll_interval(&self, interval: Duration) {
        self.current_poll_interval_ms
            .store(interval.as_millis() as u64, Ordering::SeqCst);
    }
}

/// The SchedulerLoop polls for eligible matches and dispatches workers
pub struct SchedulerLoop {
    config: SchedulerConfig,
    service: Arc<dyn MatchService>,
    pool: PoolHandle,
    shared: Arc<SchedulerShared>,
}

impl SchedulerLoop {
    /// Create a new loop; it does nothing until [`run`](Self::run)
    pub fn new(
        config: SchedulerConfig,
        service: Arc<dyn MatchService>,
        pool: PoolHandle,
        shared: Arc<SchedulerShared>,
    ) -> Self {
        debug!(?config, "SchedulerLoop::new: called");
        Self {
            config,
            service,
            pool,
            shared,
        }
    }

    /// Run the loop until a stop signal arrives
    ///
    /// Starts with a pool cleanup so no orphaned workers survive a restart,
    /// then ticks at the standard interval, degrading to the reduced one
    /// while the breaker is tripped or the pool is saturated.
    pub async fn run(self, mut stop_rx: mpsc::Receiver<()>) -> Result<()> {
        info!("Scheduler loop starting");

        let cleaned = self.pool.cleanup().await?;
        if cleaned > 0 {
            warn!(cleaned, "Cleaned up orphaned workers from a previous run");
        }

        self.shared.set_running(true);
        let mut current = self.config.standard_poll_interval();
        self.shared.set_current_poll_interval(current);
        let mut ticker = tokio::time::interval(current);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.shared.is_paused() {
                        // Keep ticking while paused so resume is observed
                        // promptly, just don't dispatch.
                        debug!("Scheduler paused, skipping dispatch");
                    } else {
                        self.poll_and_dispatch().await;
                    }

                    match self.desired_interval().await {
                        Some(desired) if desired != current => {
                            info!(
                                from_ms = current.as_millis() as u64,
                                to_ms = desired.as_millis() as u64,
                                "Adjusting poll interval"
                            );
                            current = desired;
                            self.shared.set_current_poll_interval(current);
                            ticker = tokio::time::interval(current);
                            // Consume the immediate first tick of the new
                            // interval; the current tick already ran.
                            ticker.tick().await;
                        }
                        Some(_) => {}
                        None => {
                            warn!("Worker pool unavailable, stopping scheduler loop");
                            break;
                        }
                    }
                }
                _ = stop_rx.recv() => {
                    info!("Scheduler loop stop requested");
                    break;
                }
            }
        }

        self.shared.set_running(false);
        info!("Scheduler loop stopped");
        Ok(())
    }

    /// One poll tick: fetch eligible matches and dispatch in discovery order
    async fn poll_and_dispatch(&self) {
        debug!("SchedulerLoop::poll_and_dispatch: called");

        let status = match self.pool.status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Could not read pool status, skipping tick");
                return;
            }
        };

        // The pool's pause flag covers both the breaker trip and the
        // operator override; either way no new dispatch this tick.
        if status.paused {
            debug!("Dispatch paused by worker pool, skipping tick");
            return;
        }

        let matches = match self.service.fetch_eligible_matches().await {
            Ok(matches) => matches,
            Err(err) => {
                warn!(error = %err, "Failed to fetch eligible matches");
                return;
            }
        };

        if matches.is_empty() {
            debug!("No matches ready to play");
            return;
        }

        info!(count = matches.len(), "Found matches ready to play");

        for m in matches.into_iter().take(self.config.max_concurrent_matches) {
            match self.pool.spawn_worker(m.id).await {
                Ok(true) => {
                    debug!(match_id = m.id, scheduled_at = %m.scheduled_at, "Dispatched match");
                }
                Ok(false) => {
                    // Distinguish backpressure from de-duplication: capacity
                    // ends the tick (the rest retry next poll), a duplicate
                    // is just skipped.
                    let saturated = self
                        .pool
                        .status()
                        .await
                        .map(|s| s.saturated())
                        .unwrap_or(true);
                    if saturated {
                        debug!(match_id = m.id, "Pool at capacity, deferring remaining matches");
                        break;
                    }
                    debug!(match_id = m.id, "Match already has an active worker, skipping");
                }
                Err(e) => {
                    warn!(error = %e, "Worker pool unavailable, abandoning tick");
                    return;
                }
            }
        }
    }

    /// The cadence the loop should tick at, given pool health
    ///
    /// None means the pool is gone and the loop should stop.
    async fn desired_interval(&self) -> Option<Duration> {
        let status = self.pool.status().await.ok()?;
        if status.breaker_tripped || status.saturated() {
            Some(self.config.reduced_poll_interval())
        } else {
            Some(self.config.standard_poll_interval())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EligibleMatch, MatchId};
    use crate::error::MatchError;
    use crate::pool::{PoolConfig, WorkerPool};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Mock service with a scripted eligible list and slow executions
    struct MockService {
        eligible: Mutex<Vec<MatchId>>,
        fetch_calls: AtomicUsize,
        execute_delay: Duration,
        executed: Mutex<Vec<MatchId>>,
    }

    impl MockService {
        fn new(eligible: Vec<MatchId>, execute_delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                eligible: Mutex::new(eligible),
                fetch_calls: AtomicUsize::new(0),
                execute_delay,
                executed: Mutex::new(Vec::new()),
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }

        fn executed(&self) -> Vec<MatchId> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MatchService for MockService {
        async fn fetch_eligible_matches(&self) -> Result<Vec<EligibleMatch>, MatchError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let ids = self.eligible.lock().unwrap().clone();
            Ok(ids
                .into_iter()
                .map(|id| EligibleMatch {
                    id,
                    scheduled_at: Utc::now(),
                })
                .collect())
        }

        async fn execute_match(&self, match_id: MatchId) -> Result<(), MatchError> {
            self.executed.lock().unwrap().push(match_id);
            // Completed matches drop out of the eligible set
            self.eligible.lock().unwrap().retain(|id| *id != match_id);
            tokio::time::sleep(self.execute_delay).await;
            Ok(())
        }
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            max_concurrent_matches: 10,
            standard_poll_interval_ms: 50,
            reduced_poll_interval_ms: 100,
            restart_delay_ms: 50,
        }
    }

    struct Harness {
        pool: PoolHandle,
        shared: Arc<SchedulerShared>,
        stop_tx: mpsc::Sender<()>,
        loop_task: tokio::task::JoinHandle<Result<()>>,
        pool_task: tokio::task::JoinHandle<()>,
    }

    impl Harness {
        fn start(max_workers: usize, service: Arc<MockService>) -> Self {
            let pool_config = PoolConfig {
                max_workers,
                grace_delay_ms: 1,
                ..Default::default()
            };
            let pool = WorkerPool::new(pool_config, service.clone());
            let pool_handle = pool.handle();
            let pool_task = tokio::spawn(pool.run());

            let shared = Arc::new(SchedulerShared::new());
            let (stop_tx, stop_rx) = mpsc::channel(1);
            let scheduler = SchedulerLoop::new(fast_config(), service.clone(), pool_handle.clone(), shared.clone());
            let loop_task = tokio::spawn(scheduler.run(stop_rx));

            Self {
                pool: pool_handle,
                shared,
                stop_tx,
                loop_task,
                pool_task,
            }
        }

        async fn stop(self) {
            let _ = self.stop_tx.send(()).await;
            self.loop_task.await.unwrap().unwrap();
            self.pool.shutdown().await.unwrap();
            self.pool_task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_dispatches_eligible_matches() {
        let service = MockService::new(vec![1, 2], Duration::from_millis(1));
        let harness = Harness::start(4, service.clone());

        tokio::time::sleep(Duration::from_millis(120)).await;

        let executed = service.executed();
        assert!(executed.contains(&1));
        assert!(executed.contains(&2));

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_capacity_defers_overflow_to_next_tick() {
        // 3 eligible, capacity 2: exactly 2 admitted on the first tick, the
        // third follows once a slot opens on a later tick
        let service = MockService::new(vec![1, 2, 3], Duration::from_millis(80));
        let harness = Harness::start(2, service.clone());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(service.executed().len(), 2);
        assert_eq!(harness.pool.status().await.unwrap().active_workers, 2);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let executed = service.executed();
        assert_eq!(executed.len(), 3);
        assert!(executed.contains(&3));

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_paused_tick_makes_no_admission_attempts() {
        let service = MockService::new(vec![], Duration::from_millis(1));
        let harness = Harness::start(2, service.clone());

        // Let the loop settle, then pause and seed new work
        tokio::time::sleep(Duration::from_millis(30)).await;
        harness.shared.set_paused(true);
        service.eligible.lock().unwrap().extend([7, 8]);
        let fetches_at_pause = service.fetch_count();

        tokio::time::sleep(Duration::from_millis(200)).await;
        // Paused ticks never even fetch, let alone dispatch
        assert_eq!(service.fetch_count(), fetches_at_pause);
        assert!(service.executed().is_empty());

        harness.shared.set_paused(false);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(service.executed().len(), 2);

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_interval_degrades_when_saturated_and_recovers() {
        // Two long-running matches saturate the 2-slot pool
        let service = MockService::new(vec![1, 2], Duration::from_millis(250));
        let harness = Harness::start(2, service.clone());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(harness.shared.current_poll_interval_ms(), 100);

        // After the matches finish the standard cadence returns
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(harness.shared.current_poll_interval_ms(), 50);

        harness.stop().await;
    }

    #[tokio::test]
    async fn test_run_cleans_up_orphans_before_polling() {
        let service = MockService::new(vec![], Duration::from_millis(500));
        let pool_config = PoolConfig {
            max_workers: 4,
            grace_delay_ms: 1,
            ..Default::default()
        };
        let pool = WorkerPool::new(pool_config, service.clone());
        let pool_handle = pool.handle();
        let pool_task = tokio::spawn(pool.run());

        // Orphan from a "previous run"
        pool_handle.spawn_worker(99).await.unwrap();
        assert_eq!(pool_handle.status().await.unwrap().active_workers, 1);

        let shared = Arc::new(SchedulerShared::new());
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let scheduler = SchedulerLoop::new(fast_config(), service.clone(), pool_handle.clone(), shared.clone());
        let loop_task = tokio::spawn(scheduler.run(stop_rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(pool_handle.status().await.unwrap().active_workers, 0);
        assert!(shared.is_running());

        let _ = stop_tx.send(()).await;
        loop_task.await.unwrap().unwrap();
        assert!(!shared.is_running());
        pool_handle.shutdown().await.unwrap();
        pool_task.await.unwrap();
    }
}
