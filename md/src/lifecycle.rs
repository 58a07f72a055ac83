//! Lifecycle control for the scheduling subsystem
//!
//! Thin façade the hosting process uses to start, pause, resume, inspect
//! and shut down the scheduler loop and worker pool. Holds no scheduling
//! state of its own; it wires the pieces together and supervises the loop,
//! restarting it after an abnormal exit (crash-only recovery with a
//! cooldown) unless it was explicitly paused.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::Result;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::domain::WorkerStatus;
use crate::pool::{ActiveWorkerInfo, PoolHandle, WorkerPool};
use crate::scheduler::{SchedulerConfig, SchedulerLoop, SchedulerShared};
use crate::service::MatchService;

/// Handle to the running scheduling subsystem
pub struct Lifecycle {
    scheduler_config: SchedulerConfig,
    service: Arc<dyn MatchService>,
    pool: PoolHandle,
    pool_task: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<SchedulerShared>,
    /// Stop sender for the currently-live loop, refreshed on every respawn
    stop_slot: Arc<Mutex<Option<mpsc::Sender<()>>>>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    shutting_down: Arc<AtomicBool>,
}

impl Lifecycle {
    /// Build the subsystem: spawns the worker pool task immediately, but the
    /// scheduler loop stays stopped until [`start`](Self::start)
    pub fn new(config: &Config, service: Arc<dyn MatchService>) -> Self {
        debug!("Lifecycle::new: called");
        let pool = WorkerPool::new(config.pool.clone(), service.clone());
        let pool_handle = pool.handle();
        let pool_task = tokio::spawn(pool.run());

        Self {
            scheduler_config: config.scheduler.clone(),
            service,
            pool: pool_handle,
            pool_task: Mutex::new(Some(pool_task)),
            shared: Arc::new(SchedulerShared::new()),
            stop_slot: Arc::new(Mutex::new(None)),
            supervisor: Mutex::new(None),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the scheduler loop
    ///
    /// Idempotent: a second start while the supervisor is live is a no-op,
    /// so there are never two loops or duplicate timers. The loop itself
    /// cleans up orphaned workers before its first poll.
    pub async fn start(&self) -> Result<()> {
        debug!("Lifecycle::start: called");
        let mut supervisor = self.supervisor.lock().await;

        if let Some(handle) = supervisor.as_ref()
            && !handle.is_finished()
        {
            debug!("Lifecycle::start: scheduler already running");
            return Ok(());
        }

        *supervisor = Some(tokio::spawn(supervise(
            self.scheduler_config.clone(),
            self.service.clone(),
            self.pool.clone(),
            self.shared.clone(),
            self.stop_slot.clone(),
            self.shutting_down.clone(),
        )));

        info!("Scheduler started");
        Ok(())
    }

    /// Pause dispatch without stopping the loop
    pub async fn pause(&self) -> Result<()> {
        debug!("Lifecycle::pause: called");
        self.shared.set_paused(true);
        self.pool.set_paused(true).await?;
        info!("Scheduler paused");
        Ok(())
    }

    /// Resume dispatch; restarts the loop if it had fully stopped
    pub async fn resume(&self) -> Result<()> {
        debug!("Lifecycle::resume: called");
        self.shared.set_paused(false);
        self.pool.set_paused(false).await?;

        if !self.shared.is_running() {
            debug!("Lifecycle::resume: loop stopped, restarting");
            self.start().await?;
        }

        info!("Scheduler resumed");
        Ok(())
    }

    /// Status surface for health/monitoring consumers
    pub async fn status(&self) -> Result<WorkerStatus> {
        debug!("Lifecycle::status: called");
        let pool = self.pool.status().await?;
        Ok(WorkerStatus {
            active_workers: pool.active_workers,
            max_workers: pool.max_workers,
            scheduler_active: self.shared.is_running(),
            paused: pool.paused || self.shared.is_paused(),
        })
    }

    /// Detailed listing of active workers
    pub async fn active_workers(&self) -> Result<Vec<ActiveWorkerInfo>> {
        self.pool.details().await
    }

    /// Graceful shutdown: stop the loop, terminate workers, stop the pool
    ///
    /// Never fails: close problems are logged and the sweep continues, so
    /// process exit is not held hostage by a stuck component.
    pub async fn shutdown(&self) {
        info!("Lifecycle::shutdown: shutting down scheduling subsystem");
        self.shutting_down.store(true, Ordering::SeqCst);

        if let Some(stop_tx) = self.stop_slot.lock().await.take() {
            let _ = stop_tx.send(()).await;
        }

        if let Some(handle) = self.supervisor.lock().await.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Scheduler supervisor ended abnormally during shutdown");
        }

        if let Err(e) = self.pool.shutdown().await {
            warn!(error = %e, "Worker pool already stopped during shutdown");
        }

        if let Some(handle) = self.pool_task.lock().await.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Worker pool task ended abnormally during shutdown");
        }

        info!("Scheduling subsystem shutdown complete");
    }
}

/// Supervise the scheduler loop, restarting it after abnormal exits
///
/// A clean stop ends supervision; a failure or panic schedules a respawn
/// after the configured cooldown, unless the scheduler was explicitly
/// paused or the subsystem is shutting down.
async fn supervise(
    config: SchedulerConfig,
    service: Arc<dyn MatchService>,
    pool: PoolHandle,
    shared: Arc<SchedulerShared>,
    stop_slot: Arc<Mutex<Option<mpsc::Sender<()>>>>,
    shutting_down: Arc<AtomicBool>,
) {
    loop {
        if shutting_down.load(Ordering::SeqCst) {
            break;
        }

        let (stop_tx, stop_rx) = mpsc::channel(1);
        *stop_slot.lock().await = Some(stop_tx);

        // A shutdown that ran before the sender was published found the slot
        // empty and is now blocked on this task; it must not be missed.
        if shutting_down.load(Ordering::SeqCst) {
            stop_slot.lock().await.take();
            break;
        }

        let scheduler = SchedulerLoop::new(config.clone(), service.clone(), pool.clone(), shared.clone());
        let result = tokio::spawn(scheduler.run(stop_rx)).await;

        // The loop sets this on a clean exit; a panic never gets there
        shared.set_running(false);
        stop_slot.lock().await.take();

        if shutting_down.load(Ordering::SeqCst) {
            break;
        }

        match result {
            Ok(Ok(())) => {
                info!("Scheduler loop exited cleanly");
                break;
            }
            Ok(Err(e)) => error!(error = %e, "Scheduler loop failed"),
            Err(e) => error!(error = %e, "Scheduler loop panicked"),
        }

        if shared.is_paused() {
            info!("Scheduler explicitly paused, not restarting");
            break;
        }

        warn!(delay_ms = config.restart_delay_ms, "Restarting scheduler loop after abnormal exit");
        tokio::time::sleep(config.restart_delay()).await;

        if shutting_down.load(Ordering::SeqCst) {
            break;
        }
    }
}
