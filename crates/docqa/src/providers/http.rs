//! Shared HTTP plumbing for provider clients

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Build a client with an explicit request timeout
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))
}

/// Bounded exponential backoff for transient provider failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first (0 = no retry)
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Backoff before retry number `attempt + 1`; saturates instead of overflowing
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Retry a request with exponential backoff; only transient errors are retried
    pub async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < self.max_retries && e.is_transient() => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Object { message: String },
    Text(String),
}

/// Map a failed send into a provider error, keeping timeouts and refused connections retryable
pub fn send_error(provider: &str, what: &str, err: reqwest::Error) -> Error {
    tracing::error!(provider, error = %err, "{} request failed", what);
    let message = format!("{} request failed: {}", what, err);
    if err.is_timeout() || err.is_connect() {
        Error::provider_transient(provider, message)
    } else {
        Error::provider(provider, message)
    }
}

/// Pass successful responses through; turn error statuses into provider errors
pub async fn check_status(provider: &str, what: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| match e.error {
            ErrorDetail::Object { message } => message,
            ErrorDetail::Text(message) => message,
        })
        .unwrap_or(body);

    tracing::error!(provider, %status, "{} failed", what);
    let message = format!("{} failed: HTTP {} - {}", what, status, detail);

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(Error::provider_transient(provider, message))
    } else {
        Err(Error::provider(provider, message))
    }
}

/// Decode a JSON body, reporting failures against the provider
pub async fn parse_json<T: serde::de::DeserializeOwned>(
    provider: &str,
    what: &str,
    response: Response,
) -> Result<T> {
    response.json().await.map_err(|e| {
        Error::provider(provider, format!("Failed to parse {} response: {}", what, e))
    })
}
