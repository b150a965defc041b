//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;
use postpath_core::{Classifier, Engine, QueryClient, Resolver};

use crate::config::Config;
use crate::graphql::GraphQlClient;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Classifier and resolver. Immutable once built.
    pub engine: Arc<Engine>,

    /// Backend client, absent when no GraphQL endpoint is configured.
    pub client: Option<Arc<dyn QueryClient>>,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = match &config.graphql_endpoint {
            Some(endpoint) => {
                let client = GraphQlClient::new(endpoint.clone(), config.backend_timeout)
                    .context("failed to build GraphQL client")?;
                Some(Arc::new(client) as Arc<dyn QueryClient>)
            }
            None => None,
        };

        tracing::info!(
            backend = client.is_some(),
            backend_timeout_secs = config.backend_timeout.as_secs(),
            "application state initialized"
        );

        Ok(Self::with_client(config, client))
    }

    /// Create state around an existing backend client.
    pub fn with_client(config: Config, client: Option<Arc<dyn QueryClient>>) -> Self {
        let engine = Engine::new(
            Classifier::new(config.classifier_config()),
            Resolver::new(config.query_form),
        );

        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            client,
        }
    }
}
