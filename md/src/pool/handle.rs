//! PoolHandle - client interface to the worker pool task

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::domain::MatchId;

use super::messages::{ActiveWorkerInfo, PoolRequest, PoolStatus};

/// Handle for talking to the worker pool
///
/// Cloneable; all operations are async sends to the pool task, with oneshot
/// replies where an answer is expected.
#[derive(Clone)]
pub struct PoolHandle {
    tx: mpsc::Sender<PoolRequest>,
}

impl PoolHandle {
    pub(crate) fn new(tx: mpsc::Sender<PoolRequest>) -> Self {
        Self { tx }
    }

    /// Admit a match and spawn its worker
    ///
    /// Returns false (no side effect) on duplicate match id or when the pool
    /// is at capacity. Admission is atomic with respect to the registry: two
    /// concurrent calls for the same id cannot both return true.
    pub async fn spawn_worker(&self, match_id: MatchId) -> Result<bool> {
        debug!(match_id, "PoolHandle::spawn_worker: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(PoolRequest::Spawn { match_id, reply_tx })
            .await
            .map_err(|_| eyre!("Worker pool channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("Worker pool dropped spawn reply"))
    }

    /// Operator pause override, independent of the circuit breaker
    pub async fn set_paused(&self, paused: bool) -> Result<()> {
        debug!(paused, "PoolHandle::set_paused: called");
        self.tx
            .send(PoolRequest::SetPaused { paused })
            .await
            .map_err(|_| eyre!("Worker pool channel closed"))
    }

    /// Forcibly terminate all workers; returns how many were terminated
    pub async fn cleanup(&self) -> Result<usize> {
        debug!("PoolHandle::cleanup: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(PoolRequest::Cleanup { reply_tx })
            .await
            .map_err(|_| eyre!("Worker pool channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("Worker pool dropped cleanup reply"))
    }

    /// Point-in-time pool status; pure read, no side effects
    pub async fn status(&self) -> Result<PoolStatus> {
        debug!("PoolHandle::status: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(PoolRequest::Status { reply_tx })
            .await
            .map_err(|_| eyre!("Worker pool channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("Worker pool dropped status reply"))
    }

    /// Detailed listing of active workers, oldest first
    pub async fn details(&self) -> Result<Vec<ActiveWorkerInfo>> {
        debug!("PoolHandle::details: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(PoolRequest::Details { reply_tx })
            .await
            .map_err(|_| eyre!("Worker pool channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("Worker pool dropped details reply"))
    }

    /// Cleanup and stop the pool task
    pub async fn shutdown(&self) -> Result<()> {
        debug!("PoolHandle::shutdown: called");
        self.tx
            .send(PoolRequest::Shutdown)
            .await
            .map_err(|_| eyre!("Worker pool channel closed"))
    }
}
