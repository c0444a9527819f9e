//! Shared HTTP fetch layer.
//!
//! Every outbound request in the workspace goes through [`Fetcher`], which
//! enforces three policies:
//! - a global ceiling on in-flight requests (semaphore)
//! - per-host minimum spacing ([`HostRateLimiter`])
//! - bounded retry with exponential backoff for connection/timeout faults
//!
//! Non-2xx responses are returned to the caller as-is; they are never
//! retried and never turned into errors.

pub mod limiter;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

use trainingcatalog_shared::{Result, Settings, TrainingCatalogError};

pub use limiter::HostRateLimiter;

/// User-Agent string for all outbound requests.
pub const USER_AGENT: &str = concat!(
    "AITrainingCatalog/",
    env!("CARGO_PKG_VERSION"),
    " (+educational resource discovery)"
);

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Exponential backoff schedule for transient faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff after the given failed attempt (1-based): doubles each time,
    /// capped at `max_backoff`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

// ---------------------------------------------------------------------------
// FetchResponse
// ---------------------------------------------------------------------------

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// Response headers, names lowercased.
    pub headers: BTreeMap<String, String>,
    /// URL after redirects.
    pub final_url: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            TrainingCatalogError::parse(format!("{}: invalid JSON body: {e}", self.final_url))
        })
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Concurrency-bounded, rate-limited, retrying HTTP client.
///
/// Cheap to clone; clones share the semaphore and the per-host limiter.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    semaphore: Arc<Semaphore>,
    limiter: HostRateLimiter,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Build a fetcher from runtime settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| {
                TrainingCatalogError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(settings.max_concurrent_requests.max(1))),
            limiter: HostRateLimiter::new(
                settings.rate_limit_per_second,
                settings.host_rate_limits.clone(),
            ),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry schedule.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// GET `url` with no extra headers.
    pub async fn get(&self, url: &str) -> Result<FetchResponse> {
        self.fetch(url, &[]).await
    }

    /// GET `url` with extra request headers.
    ///
    /// Fails only on an unparseable URL or once the retry budget is spent on
    /// transient faults.
    pub async fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> Result<FetchResponse> {
        let parsed = Url::parse(url)
            .map_err(|e| TrainingCatalogError::validation(format!("invalid URL '{url}': {e}")))?;
        let host = parsed.host_str().unwrap_or_default().to_string();

        let mut attempt = 1;
        loop {
            self.limiter.acquire(&host).await;

            let outcome = {
                let _permit = self.semaphore.acquire().await.map_err(|e| {
                    TrainingCatalogError::Network(format!("fetch semaphore closed: {e}"))
                })?;
                debug!(url, attempt, "fetching");
                self.send_once(&parsed, headers).await
            };

            match outcome {
                Ok(response) => return Ok(response),
                Err(e) if is_transient(&e) && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(TrainingCatalogError::Network(format!(
                        "{url}: {e} (after {attempt} attempt(s))"
                    )));
                }
            }
        }
    }

    async fn send_once(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> std::result::Result<FetchResponse, reqwest::Error> {
        let mut request = self.client.get(url.as_str());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(FetchResponse {
            status,
            body,
            headers,
            final_url,
        })
    }
}

/// Connection, timeout and body-transfer faults are worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
}
