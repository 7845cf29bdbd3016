//! HTTP client with retry logic.

use bytes::Bytes;
use mirrorpull_types::Page;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::BackoffPolicy;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Idle connections kept per host. Match the job concurrency limit.
    pub concurrency: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(60),
            backoff: BackoffPolicy::default(),
            user_agent: format!("mirrorpull/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Why a single attempt failed.
#[derive(Error, Debug)]
pub enum AttemptError {
    /// Connection, timeout or other transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The body is not valid JSON.
    #[error("malformed body: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AttemptError {
    /// Returns true if another attempt may succeed.
    ///
    /// Only request-builder errors (an unusable URL) are permanent.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_builder(),
            Self::Status(_) | Self::Parse(_) => true,
        }
    }
}

/// Terminal failure of a request.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Every attempt failed.
    #[error("gave up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        /// The request URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The failure of the final attempt.
        last_error: AttemptError,
    },

    /// The request can never succeed (e.g. the URL is invalid).
    #[error("request to {url} cannot be sent: {source}")]
    Fatal {
        /// The request URL.
        url: String,
        /// The underlying failure.
        source: AttemptError,
    },
}

/// HTTP client with connection pooling and retry logic.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    config: ClientConfig,
}

impl FetchClient {
    /// Creates a new fetch client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches one page, retrying transient failures.
    ///
    /// Makes up to `max_retries` attempts (at least one), sleeping
    /// `backoff.delay(attempt)` between them. Non-success statuses,
    /// transport errors and malformed bodies are all retried.
    ///
    /// Returns `Ok(None)` when the response parses but carries no data under
    /// `data_key`: there is nothing at this position.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] once every attempt has failed and
    /// [`FetchError::Fatal`] if the request cannot be built at all.
    pub async fn fetch(
        &self,
        url: &str,
        data_key: &str,
        max_retries: u32,
    ) -> Result<Option<Page>, FetchError> {
        let max_attempts = max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(url, attempt, max_attempts, "fetching");

            let failure = match self.attempt(url).await {
                Ok(payload) => {
                    let page = Page::from_payload(payload, data_key);
                    match &page {
                        Some(page) => debug!(
                            url,
                            attempt,
                            records = page.record_count(),
                            last = page.is_last(),
                            "fetched page"
                        ),
                        None => info!(url, attempt, "empty response, nothing at this position"),
                    }
                    return Ok(page);
                }
                Err(e) if !e.is_retryable() => {
                    error!(url, error = %e, "request cannot be sent");
                    return Err(FetchError::Fatal {
                        url: url.to_string(),
                        source: e,
                    });
                }
                Err(e) => e,
            };

            if attempt >= max_attempts {
                error!(url, attempts = attempt, error = %failure, "max retries reached, giving up");
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error: failure,
                });
            }

            let delay = self.config.backoff.delay(attempt);
            warn!(
                url,
                attempt,
                max_attempts,
                error = %failure,
                delay_ms = delay.as_millis() as u64,
                "request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Performs a single GET and parses the body.
    async fn attempt(&self, url: &str) -> Result<Value, AttemptError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        parse_body(&body)
    }
}

fn parse_body(body: &Bytes) -> Result<Value, AttemptError> {
    Ok(serde_json::from_slice(body)?)
}
