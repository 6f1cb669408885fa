// src/services/fetcher.rs

//! Bounded-retry JSON fetcher.
//!
//! Every attempt ends in one of: transport failure, 403, other non-2xx,
//! body read failure, decode failure, or success. Failed attempts other
//! than the last sleep for a backoff that grows with the attempt number
//! and is longer after a 403. Once the budget is spent the caller gets
//! [`AppError::RetriesExhausted`], never an empty value.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, FetchError, Result};

/// Status and fully-read body of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One GET round trip.
///
/// Implementations must read the body to completion before returning so
/// the underlying connection is released on every path.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> std::result::Result<RawResponse, FetchError>;
}

/// [`Transport`] backed by a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Override the client timeout for requests sent through this transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> std::result::Result<RawResponse, FetchError> {
        let mut request = self.client.get(url.clone());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();

        // gzip bodies are inflated here by reqwest; plain bodies pass through.
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Linear backoff: `base + step * attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub step: Duration,
}

impl Backoff {
    /// No waiting at all.
    pub const NONE: Self = Self::linear(Duration::ZERO, Duration::ZERO);

    pub const fn linear(base: Duration, step: Duration) -> Self {
        Self { base, step }
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base + self.step * attempt
    }
}

/// Attempt budget plus the two backoff curves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Used after a 403
    pub blocked_backoff: Backoff,
}

impl RetryPolicy {
    /// `/api/data`: 3 attempts, 3s/4s, or 7s/9s when blocked.
    pub fn data_endpoint() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::linear(Duration::from_secs(2), Duration::from_secs(1)),
            blocked_backoff: Backoff::linear(Duration::from_secs(5), Duration::from_secs(2)),
        }
    }

    /// `/api/price/<token>`: 2 attempts, 3s, or 4s when blocked.
    pub fn price_endpoint() -> Self {
        Self {
            max_attempts: 2,
            backoff: Backoff::linear(Duration::from_secs(2), Duration::from_secs(1)),
            blocked_backoff: Backoff::linear(Duration::from_secs(3), Duration::from_secs(1)),
        }
    }

    /// Retry without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::NONE,
            blocked_backoff: Backoff::NONE,
        }
    }

    /// Sleep before the attempt following failed attempt `attempt`.
    pub fn delay_for(&self, attempt: u32, failure: &FetchError) -> Duration {
        if failure.is_blocked() {
            self.blocked_backoff.delay(attempt)
        } else {
            self.backoff.delay(attempt)
        }
    }
}

/// Map a fully-read response onto success or a failure class.
pub fn classify<T: DeserializeOwned>(response: &RawResponse) -> std::result::Result<T, FetchError> {
    match response.status {
        403 => Err(FetchError::Blocked),
        status if !(200..300).contains(&status) => Err(FetchError::Status(status)),
        _ => serde_json::from_slice(&response.body).map_err(|e| FetchError::Decode(e.to_string())),
    }
}

/// Retrying JSON fetcher over a [`Transport`].
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    label: &'static str,
}

impl ResilientFetcher {
    /// `label` only prefixes log lines.
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, label: &'static str) -> Self {
        Self {
            transport,
            policy,
            label,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` and decode the body as `T`, retrying per the policy.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last = None;

        for attempt in 1..=max_attempts {
            log::debug!(
                "[{}] attempt {}/{}: GET {}",
                self.label,
                attempt,
                max_attempts,
                url
            );

            let outcome = match self.transport.get(url).await {
                Ok(response) => classify::<T>(&response),
                Err(failure) => Err(failure),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("[{}] succeeded on attempt {}", self.label, attempt);
                    }
                    return Ok(value);
                }
                Err(failure) => {
                    log::warn!(
                        "[{}] attempt {}/{} failed: {}",
                        self.label,
                        attempt,
                        max_attempts,
                        failure
                    );
                    if attempt < max_attempts {
                        let delay = self.policy.delay_for(attempt, &failure);
                        if !delay.is_zero() {
                            log::info!("[{}] retrying in {:?}", self.label, delay);
                            tokio::time::sleep(delay).await;
                        }
                    }
                    last = Some(failure);
                }
            }
        }

        Err(AppError::RetriesExhausted {
            url: url.to_string(),
            attempts: max_attempts,
            last: last.unwrap_or_else(|| FetchError::Transport("no attempt made".into())),
        })
    }
}
