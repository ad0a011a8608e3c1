use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_MAX_RETRIES, DEFAULT_PRESENTATION_SCALE, INITIAL_RETRY_BACKOFF,
    POLL_INTERVAL, REVEAL_STEP, TICK_INTERVAL, TRAINS_PATH,
};

/// How failed fetches are retried before the error is reported
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one; zero disables retrying
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Backoff to wait before retry number `retry` (0-based), doubling each time
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(1_u32 << retry.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: INITIAL_RETRY_BACKOFF,
        }
    }
}

/// Deployment configuration of the visualization
///
/// Deployments differ only in the API base and the presentation scale, both of
/// which can be baked in at build time through `TRAIN_API_BASE` and
/// `TRAIN_PRESENTATION_SCALE`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub trains_path: String,
    pub presentation_scale: f64,
    pub tick_interval: Duration,
    pub step: f64,
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    /// Re-fetch the manifest whenever a train is selected
    pub refresh_on_select: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            trains_path: TRAINS_PATH.to_string(),
            presentation_scale: DEFAULT_PRESENTATION_SCALE,
            tick_interval: TICK_INTERVAL,
            step: REVEAL_STEP,
            poll_interval: POLL_INTERVAL,
            retry: RetryPolicy::default(),
            refresh_on_select: true,
        }
    }
}

impl AppConfig {
    /// Build the configuration from values baked in at compile time
    #[must_use]
    pub fn from_build_env() -> Self {
        Self::from_values(
            option_env!("TRAIN_API_BASE"),
            option_env!("TRAIN_PRESENTATION_SCALE"),
        )
    }

    /// Apply optional overrides on top of the defaults; unusable values are ignored
    #[must_use]
    pub fn from_values(api_base: Option<&str>, presentation_scale: Option<&str>) -> Self {
        let mut config = Self::default();

        if let Some(base) = api_base.map(str::trim).filter(|b| !b.is_empty()) {
            config.api_base = base.to_string();
        }

        if let Some(scale) = presentation_scale.and_then(parse_scale) {
            config.presentation_scale = scale;
        }

        config
    }

    /// Full URL of the train manifest endpoint
    #[must_use]
    pub fn trains_url(&self) -> String {
        join_url(&self.api_base, &self.trains_path)
    }

    /// Full URL of a plot image referenced by a train record
    #[must_use]
    pub fn image_url(&self, path: &str) -> String {
        join_url(&self.api_base, path)
    }
}

fn parse_scale(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|scale| scale.is_finite() && *scale > 0.0)
}

/// Join a base and a relative path with exactly one `/` between them
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
