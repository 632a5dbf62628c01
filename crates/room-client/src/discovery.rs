//! Signaling server discovery.
//!
//! The dispatcher answers `GET /signaling` with `{"domain": "<host>"}`. The
//! resolved endpoint is cached for the lifetime of the resolver; failures are
//! not cached, so a later `connect()` tries again.

use crate::config::Config;
use crate::errors::DiscoveryError;
use crate::observability::metrics;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Connect timeout for the discovery request.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved signaling server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingEndpoint {
    domain: String,
}

impl SignalingEndpoint {
    /// Wrap a domain returned by discovery.
    ///
    /// The domain may carry a port (`host:port`).
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Base URL of the signaling server, `https://<domain>`.
    pub fn url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

#[derive(Debug, Deserialize)]
struct SignalingResponse {
    #[serde(default)]
    domain: Option<String>,
}

/// Resolves and caches the signaling endpoint.
pub struct EndpointResolver {
    http_client: reqwest::Client,
    discovery_url: String,
    endpoint: OnceCell<SignalingEndpoint>,
}

impl EndpointResolver {
    /// Build a resolver whose requests carry the configured `Origin` header.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::Client` if the origin is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, DiscoveryError> {
        let origin = HeaderValue::from_str(&config.origin)
            .map_err(|e| DiscoveryError::Client(format!("Invalid origin header: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, origin);

        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| DiscoveryError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            discovery_url: config.discovery_url.clone(),
            endpoint: OnceCell::new(),
        })
    }

    /// Resolve the signaling endpoint, issuing at most one successful request.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError` if the request fails, the status is not a
    /// success, or the body does not name a domain.
    pub async fn resolve(&self) -> Result<SignalingEndpoint, DiscoveryError> {
        self.endpoint
            .get_or_try_init(|| self.fetch())
            .await
            .cloned()
    }

    /// Endpoint resolved so far, if any.
    pub fn cached(&self) -> Option<&SignalingEndpoint> {
        self.endpoint.get()
    }

    #[instrument(skip_all, fields(url = %self.discovery_url))]
    async fn fetch(&self) -> Result<SignalingEndpoint, DiscoveryError> {
        let start = Instant::now();
        let result = self.request_endpoint().await;

        match &result {
            Ok(endpoint) => {
                metrics::record_discovery("success", None, start.elapsed());
                info!(
                    target: "rc.discovery",
                    domain = %endpoint.domain(),
                    "Signaling server resolved"
                );
            }
            Err(e) => {
                metrics::record_discovery("error", Some(discovery_error_type(e)), start.elapsed());
                warn!(target: "rc.discovery", error = %e, "Signaling discovery failed");
            }
        }

        result
    }

    async fn request_endpoint(&self) -> Result<SignalingEndpoint, DiscoveryError> {
        debug!(target: "rc.discovery", "Requesting signaling server");

        let response = self
            .http_client
            .get(&self.discovery_url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            debug!(target: "rc.discovery", error = %e, "Failed to read discovery body");
            DiscoveryError::EmptyBody
        })?;

        parse_endpoint(&body)
    }
}

/// Parse a dispatcher response body.
fn parse_endpoint(body: &str) -> Result<SignalingEndpoint, DiscoveryError> {
    if body.trim().is_empty() {
        return Err(DiscoveryError::EmptyBody);
    }

    let parsed: SignalingResponse =
        serde_json::from_str(body).map_err(|e| DiscoveryError::InvalidBody(e.to_string()))?;

    match parsed.domain {
        Some(domain) if !domain.trim().is_empty() => Ok(SignalingEndpoint::new(domain.trim())),
        _ => Err(DiscoveryError::MissingDomain),
    }
}

fn discovery_error_type(error: &DiscoveryError) -> &'static str {
    match error {
        DiscoveryError::Request(_) => "request",
        DiscoveryError::Status(_) => "status",
        DiscoveryError::EmptyBody => "empty_body",
        DiscoveryError::InvalidBody(_) => "invalid_body",
        DiscoveryError::MissingDomain => "missing_domain",
        DiscoveryError::Client(_) => "client",
    }
}
