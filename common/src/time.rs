//! Time utilities and constants for SimpleCurrency.

use chrono::{DateTime, Duration, Utc};

/// Rate refresh timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched rate table stays valid (12 hours).
    pub fn rate_cache_ttl() -> Duration {
        Duration::hours(12)
    }

    /// Upper bound for a single rate feed request (5 seconds).
    pub fn rate_fetch_timeout() -> Duration {
        Duration::seconds(5)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Check if a timestamp has expired (is in the past).
pub fn is_expired(expiry: Timestamp) -> bool {
    now() >= expiry
}

/// Calculate expiry time from now.
pub fn expires_in(duration: Duration) -> Timestamp {
    now() + duration
}

/// Conversion from chrono durations to `std::time::Duration`.
///
/// Negative durations clamp to zero.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
