//! MatchDaemon - background match scheduler
//!
//! MatchDaemon discovers matches that are ready to play and executes each
//! one on an isolated worker task, protecting the shared database behind a
//! circuit breaker. The hosting application owns persistence, simulation
//! math and the HTTP surface; this crate only schedules.
//!
//! # Core Concepts
//!
//! - **One worker per match**: admission de-duplicates by match id, so the
//!   non-idempotent match execution never runs twice concurrently
//! - **Bounded concurrency**: the pool never exceeds its worker ceiling;
//!   overflow matches simply wait for the next poll tick
//! - **Self-protecting**: repeated database-class failures trip a circuit
//!   breaker that pauses dispatch and auto-resets after a cooldown
//! - **Crash-only recovery**: an abnormally-ended scheduler loop restarts
//!   after a fixed delay, unless it was explicitly paused
//!
//! # Modules
//!
//! - [`lifecycle`] - start/pause/resume/status/shutdown façade
//! - [`scheduler`] - the polling loop that discovers and dispatches matches
//! - [`pool`] - worker pool, admission control and circuit breaker
//! - [`service`] - collaborator trait and HTTP implementation
//! - [`config`] - configuration types and loading

pub mod cli;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod pool;
pub mod scheduler;
pub mod service;

mod worker;

// Re-export commonly used types
pub use config::{Config, ServiceConfig};
pub use domain::{EligibleMatch, MatchId, WorkerStatus};
pub use error::{ErrorKind, MatchError};
pub use lifecycle::Lifecycle;
pub use pool::{ActiveWorkerInfo, CircuitBreaker, PoolConfig, PoolHandle, PoolStatus, WorkerOutcome, WorkerPool};
pub use scheduler::{SchedulerConfig, SchedulerLoop, SchedulerShared};
pub use service::{HttpMatchService, MatchService};
