//! Match execution worker
//!
//! One isolated, independently-failing task per match. A worker receives
//! only the match id, runs the match through the service collaborator,
//! reports exactly one terminal outcome to the pool, then self-terminates
//! after a short grace delay so the outcome message flushes.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::MatchId;
use crate::error::ErrorKind;
use crate::pool::WorkerOutcome;
use crate::service::MatchService;

/// Spawn a worker task for one match
///
/// The returned handle is held by the pool solely for forced termination
/// during cleanup; results travel back over `outcome_tx`.
pub(crate) fn spawn_match_worker(
    match_id: MatchId,
    service: Arc<dyn MatchService>,
    outcome_tx: mpsc::Sender<WorkerOutcome>,
    grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(match_id, "Match worker started");

        // Panics inside the collaborator must surface as a failure outcome,
        // never as a silent lost worker.
        let result = std::panic::AssertUnwindSafe(service.execute_match(match_id))
            .catch_unwind()
            .await;

        let outcome = match result {
            Ok(Ok(())) => {
                debug!(match_id, "Match worker finished");
                WorkerOutcome::Success { match_id }
            }
            Ok(Err(err)) => {
                warn!(match_id, error = %err, kind = ?err.kind(), "Match execution failed");
                WorkerOutcome::Failed {
                    match_id,
                    kind: err.kind(),
                    message: err.to_string(),
                }
            }
            Err(panic) => {
                // Deref through the box so the downcast sees the payload,
                // not the box itself
                let message = panic_message(&*panic);
                error!(match_id, %message, "Match worker panicked");
                WorkerOutcome::Failed {
                    match_id,
                    kind: ErrorKind::Unknown,
                    message,
                }
            }
        };

        if outcome_tx.send(outcome).await.is_err() {
            warn!(match_id, "Pool gone before outcome could be delivered");
        }

        // Let the outcome flush before the task ends
        tokio::time::sleep(grace).await;
    })
}

/// Extract a printable message from a panic payload
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EligibleMatch;
    use crate::error::MatchError;
    use async_trait::async_trait;

    /// Service stub whose execute behavior is driven by the match id
    struct ScriptedService;

    #[async_trait]
    impl MatchService for ScriptedService {
        async fn fetch_eligible_matches(&self) -> Result<Vec<EligibleMatch>, MatchError> {
            Ok(vec![])
        }

        async fn execute_match(&self, match_id: MatchId) -> Result<(), MatchError> {
            match match_id {
                1 => Ok(()),
                2 => Err(MatchError::Transient("connection refused".to_string())),
                3 => panic!("simulation blew up"),
                _ => Err(MatchError::Execution {
                    status: 422,
                    message: "invalid match state".to_string(),
                }),
            }
        }
    }

    async fn run_worker(match_id: MatchId) -> WorkerOutcome {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = spawn_match_worker(match_id, Arc::new(ScriptedService), tx, Duration::from_millis(1));
        let outcome = rx.recv().await.expect("worker must report an outcome");
        handle.await.unwrap();
        outcome
    }

    #[tokio::test]
    async fn test_success_outcome() {
        match run_worker(1).await {
            WorkerOutcome::Success { match_id } => assert_eq!(match_id, 1),
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_outcome() {
        match run_worker(2).await {
            WorkerOutcome::Failed { match_id, kind, .. } => {
                assert_eq!(match_id, 2);
                assert_eq!(kind, ErrorKind::TransientConnectivity);
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_unknown_failure() {
        match run_worker(3).await {
            WorkerOutcome::Failed { kind, message, .. } => {
                assert_eq!(kind, ErrorKind::Unknown);
                assert!(message.contains("simulation blew up"));
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_business_failure_outcome() {
        match run_worker(4).await {
            WorkerOutcome::Failed { kind, .. } => assert_eq!(kind, ErrorKind::BusinessLogic),
            other => panic!("Expected failure, got {:?}", other),
        }
    }
}
