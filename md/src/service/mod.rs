//! Match service collaborator boundary
//!
//! The daemon never touches persistence or simulation math directly; it
//! discovers and executes matches through this trait.

mod http;

pub use http::HttpMatchService;

use async_trait::async_trait;

use crate::domain::{EligibleMatch, MatchId};
use crate::error::MatchError;

/// Interface to the hosting application's match operations
#[async_trait]
pub trait MatchService: Send + Sync {
    /// Fetch matches whose scheduled time has arrived
    ///
    /// Side-effect-free with respect to scheduling state; may return empty.
    async fn fetch_eligible_matches(&self) -> Result<Vec<EligibleMatch>, MatchError>;

    /// Run one match to completion and persist its result
    ///
    /// Not idempotent. The worker pool guarantees at most one concurrent
    /// invocation per match id.
    async fn execute_match(&self, match_id: MatchId) -> Result<(), MatchError>;
}
