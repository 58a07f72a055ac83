//! HTTP implementation of the match service
//!
//! Talks to the hosting application's REST API, which owns the database,
//! the simulation math and the match lifecycle endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::domain::{EligibleMatch, MatchId};
use crate::error::MatchError;

use super::MatchService;

/// Match service backed by the hosting application's HTTP API
pub struct HttpMatchService {
    http: Client,
    base_url: String,
}

impl HttpMatchService {
    /// Create a new client from configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, MatchError> {
        debug!(base_url = %config.base_url, "HttpMatchService::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(MatchError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MatchService for HttpMatchService {
    async fn fetch_eligible_matches(&self) -> Result<Vec<EligibleMatch>, MatchError> {
        let url = self.endpoint("/api/matches/to-play");
        debug!(%url, "HttpMatchService::fetch_eligible_matches: called");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MatchError::Execution {
                status: status.as_u16(),
                message,
            });
        }

        let matches: Vec<EligibleMatch> = response
            .json()
            .await
            .map_err(|e| MatchError::InvalidResponse(e.to_string()))?;

        debug!(count = matches.len(), "HttpMatchService::fetch_eligible_matches: returning");
        Ok(matches)
    }

    async fn execute_match(&self, match_id: MatchId) -> Result<(), MatchError> {
        let url = self.endpoint(&format!("/api/matches/{}/play", match_id));
        debug!(match_id, %url, "HttpMatchService::execute_match: called");

        let response = self.http.post(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MatchError::Execution {
                status: status.as_u16(),
                message,
            });
        }

        debug!(match_id, "HttpMatchService::execute_match: match played");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn service(base_url: &str) -> HttpMatchService {
        HttpMatchService::from_config(&ServiceConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: 1000,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let svc = service("http://localhost:3000/");
        assert_eq!(
            svc.endpoint("/api/matches/to-play"),
            "http://localhost:3000/api/matches/to-play"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_classifies_as_transient() {
        // Port 9 (discard) is not listening; the connect error must map to
        // the connectivity kind that drives the circuit breaker.
        let svc = service("http://127.0.0.1:9");
        let err = svc.execute_match(1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientConnectivity);
    }
}
