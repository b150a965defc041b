//! HTTP GraphQL client for the content backend.
//!
//! One POST per request with a `{"query", "variables"}` body. The connection
//! pool inside `reqwest::Client` is shared across all requests.

use std::time::Duration;

use async_trait::async_trait;
use postpath_core::{GraphQlRequest, QueryClient, QueryError};
use serde::Deserialize;
use url::Url;

/// A GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// `reqwest`-backed [`QueryClient`].
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl GraphQlClient {
    /// Create a client for `endpoint` whose requests give up after `timeout`.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("postpath-preview/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, endpoint })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryClient for GraphQlClient {
    async fn execute(&self, request: &GraphQlRequest) -> Result<serde_json::Value, QueryError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), endpoint = %self.endpoint, "backend error status");
            return Err(QueryError::Status {
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))?;

        if !body.errors.is_empty() {
            return Err(QueryError::GraphQl(
                body.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        body.data
            .ok_or_else(|| QueryError::Decode("response has no data".to_string()))
    }
}
