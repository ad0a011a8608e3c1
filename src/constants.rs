use std::time::Duration;

/// Relative path of the train manifest endpoint, joined onto the API base
pub const TRAINS_PATH: &str = "api/trains/";

/// API base used when no deployment base is compiled in (same origin as the page)
pub const DEFAULT_API_BASE: &str = "/";

/// Fraction of a train's `animation_start` used as the reveal start value
pub const DEFAULT_PRESENTATION_SCALE: f64 = 0.93;

/// Interval between two reveal animation ticks
pub const TICK_INTERVAL: Duration = Duration::from_millis(18);

/// Absolute amount of `hidden_percent` removed on each tick
pub const REVEAL_STEP: f64 = 0.05;

/// How often the train manifest is re-fetched
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Delay before the first retry of a failed fetch; doubled on each further retry
pub const INITIAL_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Extra fetch attempts after the first failure
pub const DEFAULT_MAX_RETRIES: u32 = 1;
