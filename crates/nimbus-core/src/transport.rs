//! HTTP transport seam.
//!
//! The dispatcher talks to the network only through [`Transport`], which makes
//! one round trip per call and never retries on its own. [`ReqwestTransport`]
//! is the production implementation.

use crate::config::ClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Default connect timeout for new connections.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// A fully built outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including query string
    pub url: Url,
    /// Headers to send
    pub headers: HeaderMap,
    /// Serialized body
    pub body: Option<Vec<u8>>,
}

/// A received response with its body fully read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Round-trip failures reported by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport's own timeout elapsed
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Could not establish a connection
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other I/O or protocol failure
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Executes a single HTTP round trip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the whole response body.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response could be obtained.
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;

    /// The configured per-request timeout.
    fn timeout(&self) -> Duration;
}

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate cannot be loaded or the
    /// underlying HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig, user_agent: &str) -> Result<Self> {
        Self::with_timeout(config, config.timeout(), user_agent)
    }

    /// Build a transport whose request timeout overrides the configured one.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate cannot be loaded or the
    /// underlying HTTP client cannot be built.
    pub fn with_timeout(
        config: &ClientConfig,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .pool_idle_timeout(config.pool_idle_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT))
            .gzip(true);

        if !config.tls_verify {
            warn!("TLS verification disabled for {}", config.base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &config.tls_ca_cert {
            debug!("loading CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::Config(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::Config(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { http, timeout })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(http: Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
