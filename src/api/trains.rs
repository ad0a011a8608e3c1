use std::time::Duration;

use crate::config::{AppConfig, RetryPolicy};
use crate::models::TrainRecord;

/// Failure to obtain the train manifest from the backend
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("unexpected HTTP status: {0}")]
    Status(u16),

    #[error("failed to decode train list: {0}")]
    Decode(String),
}

/// Anything that can produce the current list of trains
#[allow(async_fn_in_trait)]
pub trait TrainSource {
    /// Fetch the full, ordered train list
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on network failure, non-success status or
    /// malformed JSON.
    async fn fetch_trains(&self) -> Result<Vec<TrainRecord>, FetchError>;
}

/// Train source backed by the HTTP manifest endpoint
#[derive(Debug, Clone)]
pub struct HttpTrainSource {
    url: String,
    client: reqwest::Client,
}

impl HttpTrainSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(resolve_against_origin(config.trains_url()))
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TrainSource for HttpTrainSource {
    async fn fetch_trains(&self) -> Result<Vec<TrainRecord>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        decode_trains(&body)
    }
}

/// Parse a manifest body into train records, preserving server order
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the body is not a JSON array of train records.
pub fn decode_trains(body: &str) -> Result<Vec<TrainRecord>, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Fetch with retries and exponential backoff as described by `policy`
///
/// # Errors
///
/// Returns the error of the last attempt once all retries are exhausted.
pub async fn fetch_with_retry<S: TrainSource>(
    source: &S,
    policy: RetryPolicy,
) -> Result<Vec<TrainRecord>, FetchError> {
    let mut retry = 0;
    loop {
        match source.fetch_trains().await {
            Ok(trains) => return Ok(trains),
            Err(e) if retry < policy.max_retries => {
                let delay = policy.backoff_for(retry);
                leptos::logging::warn!(
                    "Train fetch failed ({e}), retrying in {}ms",
                    delay.as_millis()
                );
                sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn sleep(delay: Duration) {
    gloo_timers::future::sleep(delay).await;
}

/// Non-wasm targets (tests, etc.) retry immediately
#[cfg(not(target_arch = "wasm32"))]
#[allow(clippy::unused_async)]
async fn sleep(_delay: Duration) {}

/// Root-relative URLs are resolved against the page origin so the client
/// always requests an absolute URL
fn resolve_against_origin(url: String) -> String {
    #[cfg(target_arch = "wasm32")]
    {
        if url.starts_with('/') {
            if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
                return format!("{origin}{url}");
            }
        }
    }
    url
}
