//! Shared HTTP session for all catalog requests
//!
//! A [`Session`] bundles the connection-pooled `reqwest::Client`, the service
//! root URL and the optional bearer token. Cloning a session is cheap; clones
//! share the same connection pool, so the pool is the only transport state the
//! download workers share.

use once_cell::sync::Lazy;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{FetcherError, FetcherResult};
use crate::config::ClientConfig;

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds) - overall time for one distribution
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default HTTP client used when no explicit configuration is given
static GLOBAL_HTTP_CLIENT: Lazy<Arc<Client>> = Lazy::new(|| {
    let client = build_client(
        Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS),
        Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
        None,
    )
    .unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default HTTP client");
        Client::new()
    });
    Arc::new(client)
});

/// Get the process-wide default HTTP client
pub fn global_http_client() -> Arc<Client> {
    GLOBAL_HTTP_CLIENT.clone()
}

/// Build an HTTP client with explicit timeouts
///
/// `max_idle_per_host` caps pooled connections; pass the worker count so the
/// pool never has to hold more connections than there are workers.
pub fn build_client(
    connect_timeout: Duration,
    request_timeout: Duration,
    max_idle_per_host: Option<usize>,
) -> FetcherResult<Client> {
    let mut builder = Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout);
    if let Some(max_idle) = max_idle_per_host {
        builder = builder.pool_max_idle_per_host(max_idle);
    }
    builder
        .build()
        .map_err(|e| FetcherError::ClientBuild(e.to_string()))
}

/// Authenticated session against one catalog service
#[derive(Debug, Clone)]
pub struct Session {
    client: Arc<Client>,
    root_url: String,
    bearer_token: Option<String>,
}

impl Session {
    /// Create a session over an existing client
    pub fn new(client: Arc<Client>, root_url: impl Into<String>) -> Self {
        Self {
            client,
            root_url: root_url.into(),
            bearer_token: None,
        }
    }

    /// Create a session using the shared default client
    pub fn with_default_client(root_url: impl Into<String>) -> Self {
        Self::new(global_http_client(), root_url)
    }

    /// Build a session from client configuration
    pub fn from_config(config: &ClientConfig) -> FetcherResult<Self> {
        let client = build_client(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
            Some(config.concurrency.max(1)),
        )?;
        let session = Self::new(Arc::new(client), config.root_url.clone());
        Ok(match &config.bearer_token {
            Some(token) => session.with_bearer_token(token.clone()),
            None => session,
        })
    }

    /// Attach a bearer token to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Service root URL
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Start a GET request, signed when a token is configured
    pub fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}
