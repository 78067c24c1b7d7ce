//! Upstream fetch pipeline.
//!
//! ### Uniform outcome
//! - Every fetch yields a [`FetchOutcome`]; transport errors, timeouts,
//!   oversized bodies and non-success statuses become `Failure` values
//!   instead of errors, so callers branch on one signal.
//!
//! ### Rate limiting
//! - [`RateLimitedFetcher`] memoizes the outcome per URL for a window.
//!
//! ### Transport
//! - [`Transport`] is the seam between the limiter and the network;
//!   [`HttpTransport`] implements it with reqwest.

pub mod limiter;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use std::time::{Duration, Instant};
use url::Url;

pub use limiter::RateLimitedFetcher;

use nrfeed_core::Error;

/// Longest body excerpt kept on a failure outcome.
const EXCERPT_CHARS: usize = 200;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "nrfeed/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 5s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "nrfeed/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(5000),
            max_redirects: 5,
        }
    }
}

/// Successful upstream response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body
    pub body: Bytes,
    /// When the response was received
    pub fetched_at: DateTime<Utc>,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Why a fetch did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// HTTP status, when the origin answered
    pub status: Option<u16>,
    /// Short description of the failure
    pub reason: String,
    /// Start of the response body, when there was one
    pub body_excerpt: Option<String>,
}

impl FetchFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { status: None, reason: reason.into(), body_excerpt: None }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{status}] {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

/// Result of one upstream request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(FetchResponse),
    Failure(FetchFailure),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn response(&self) -> Option<&FetchResponse> {
        match self {
            FetchOutcome::Success(response) => Some(response),
            FetchOutcome::Failure(_) => None,
        }
    }
}

/// Performs one GET against the origin.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> FetchOutcome;
}

/// reqwest-backed transport with a bounded wait.
pub struct HttpTransport {
    http: Client,
    config: FetchConfig,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::UpstreamFetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn try_get(&self, url: &Url) -> Result<FetchResponse, FetchFailure> {
        let start = Instant::now();

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchFailure::new(format!("timed out after {}ms", self.config.timeout.as_millis()))
                } else {
                    FetchFailure::new(format!("network error: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let limit = (EXCERPT_CHARS * 4).min(self.config.max_bytes);
            let head = read_head(response, limit).await;
            return Err(FetchFailure {
                status: Some(status.as_u16()),
                reason: format!("status {}", status.as_u16()),
                body_excerpt: excerpt(&String::from_utf8_lossy(&head)),
            });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(FetchFailure {
                status: Some(status.as_u16()),
                reason: format!("{} bytes exceeds {}", len, self.config.max_bytes),
                body_excerpt: None,
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::new(format!("timed out reading body after {}ms", self.config.timeout.as_millis()))
            } else {
                FetchFailure::new(format!("failed to read response: {}", e))
            }
        })?;

        if body.len() > self.config.max_bytes {
            return Err(FetchFailure {
                status: Some(status.as_u16()),
                reason: format!("{} bytes exceeds {}", body.len(), self.config.max_bytes),
                body_excerpt: None,
            });
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(%url, %final_url, fetch_ms, bytes = body.len(), "fetched upstream page");

        Ok(FetchResponse {
            url: url.clone(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
            fetched_at: Utc::now(),
            fetch_ms,
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> FetchOutcome {
        match self.try_get(url).await {
            Ok(response) => FetchOutcome::Success(response),
            Err(failure) => FetchOutcome::Failure(failure),
        }
    }
}

/// First `limit` bytes of the body; read errors end the read early.
async fn read_head(mut response: reqwest::Response, limit: usize) -> Vec<u8> {
    let mut head = Vec::with_capacity(limit);
    while head.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => head.extend_from_slice(&chunk[..chunk.len().min(limit - head.len())]),
            Ok(None) | Err(_) => break,
        }
    }
    head
}

fn excerpt(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(EXCERPT_CHARS).collect())
}
