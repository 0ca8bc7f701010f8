//! Client configuration.

use std::env;
use std::time::Duration;

use crate::error::{BookingError, Result};

/// How long a saved booking draft stays valid.
pub const DEFAULT_DRAFT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default timeout applied to every backend request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of guest tickets and guest food orders kept on the device.
pub const DEFAULT_GUEST_HISTORY_LIMIT: usize = 50;

/// Configuration shared by the gateway, the session, and the booking orchestrator.
///
/// The only required field is `base_url`; all others have sensible defaults.
///
/// # Example
///
/// ```
/// use cinema_booking_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://cinema.example.com/api")
///     .with_request_timeout(Duration::from_secs(5))
///     .with_guest_history_limit(20);
/// assert_eq!(config.draft_ttl, Duration::from_secs(1800));
/// assert_eq!(config.guest_history_limit, 20);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend REST API, without a trailing slash.
    pub base_url: String,
    /// Age after which a saved draft is treated as absent.
    ///
    /// Defaults to **30 minutes**.
    pub draft_ttl: Duration,
    /// Timeout for each backend request.
    ///
    /// Defaults to **15 seconds**.
    pub request_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Maximum number of guest tickets (and, separately, guest food orders)
    /// kept on the device. The oldest records are evicted first.
    ///
    /// Defaults to **50**. Values below 1 are clamped to 1.
    pub guest_history_limit: usize,
}

impl ClientConfig {
    /// Create a new configuration for the given backend URL with default values.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            draft_ttl: DEFAULT_DRAFT_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: format!("cinema-booking-client/{}", env!("CARGO_PKG_VERSION")),
            guest_history_limit: DEFAULT_GUEST_HISTORY_LIMIT,
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// | Variable                       | Field             |
    /// |--------------------------------|-------------------|
    /// | `CINEMA_API_URL` (required)    | `base_url`        |
    /// | `CINEMA_DRAFT_TTL_SECS`        | `draft_ttl`       |
    /// | `CINEMA_REQUEST_TIMEOUT_SECS`  | `request_timeout` |
    /// | `CINEMA_GUEST_HISTORY_LIMIT`   | `guest_history_limit` |
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Config`] if `CINEMA_API_URL` is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("CINEMA_API_URL")
            .map_err(|_| BookingError::Config("CINEMA_API_URL must be set".into()))?;
        let mut config = Self::new(base_url);

        if let Some(secs) = parse_env::<u64>("CINEMA_DRAFT_TTL_SECS")? {
            config = config.with_draft_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_env::<u64>("CINEMA_REQUEST_TIMEOUT_SECS")? {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(limit) = parse_env::<usize>("CINEMA_GUEST_HISTORY_LIMIT")? {
            config = config.with_guest_history_limit(limit);
        }
        Ok(config)
    }

    /// Set the draft time-to-live.
    #[must_use]
    pub fn with_draft_ttl(mut self, ttl: Duration) -> Self {
        self.draft_ttl = ttl;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set how many guest records are kept. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_guest_history_limit(mut self, limit: usize) -> Self {
        self.guest_history_limit = limit.max(1);
        self
    }

    /// The draft TTL as a `chrono` duration, saturating on overflow.
    pub(crate) fn draft_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.draft_ttl).unwrap_or(chrono::Duration::MAX)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| BookingError::Config(format!("{name} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
