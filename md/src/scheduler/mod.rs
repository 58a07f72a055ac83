//! Scheduler loop for match discovery and dispatch
//!
//! Polls the match service on an interval and pushes eligible matches into
//! the worker pool, degrading its cadence when the pool is stressed.

mod config;
mod core;

pub use config::SchedulerConfig;
pub use self::core::{SchedulerLoop, SchedulerShared};
