use crate::errors::AppError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const BASE_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Delay before retry number `attempt + 1`, doubling from 100 ms up to 5 s.
fn backoff_for(attempt: u32) -> Duration {
    let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor)).min(MAX_BACKOFF)
}

/// HTTP client with a bounded per-request timeout and optional retries
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    timeout: Duration,
}

impl HttpClient {
    /// The timeout covers the whole exchange, connect through body.
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            max_retries,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch JSON from URL, retrying with exponential backoff when configured
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T>(&self, url: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.fetch_once(url).await {
                Ok(response) => {
                    debug!(url = %url, attempt = attempt + 1, "Request successful");
                    return Ok(response);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let backoff = backoff_for(attempt);
                        warn!(
                            url = %url,
                            attempt = attempt + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying with exponential backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        error!(
            url = %url,
            attempts = self.max_retries + 1,
            "All attempts exhausted"
        );
        Err(last_error.unwrap_or_else(|| AppError::internal("Unknown error after retries")))
    }

    async fn fetch_once<T>(&self, url: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(
                status.as_u16(),
                format!("Upstream answered {}", status),
            ));
        }

        let body = response.bytes().await.map_err(|e| transport_error(url, e))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::timeout(format!("Request to {} timed out", url))
    } else {
        AppError::NetworkError(e)
    }
}
