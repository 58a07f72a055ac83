//! Worker pool for match execution
//!
//! Owns the set of live match workers, enforces the concurrency ceiling,
//! de-duplicates dispatch by match id, and folds worker health signals into
//! a circuit-breaker decision.

mod breaker;
mod config;
mod core;
mod handle;
mod messages;

pub use breaker::CircuitBreaker;
pub use config::PoolConfig;
pub use self::core::WorkerPool;
pub use handle::PoolHandle;
pub use messages::{ActiveWorkerInfo, PoolRequest, PoolStatus, WorkerOutcome};
