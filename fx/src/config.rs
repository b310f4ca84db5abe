//! FX configuration.

use chrono::Duration;
use simplecurrency_common::{constants, CurrencyCode, DurationExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::cache::RateCacheConfig;
use crate::feed::{OpenErApiFeed, RateFeed, StaticRateFeed, DEFAULT_FEED_URL};
use crate::provider::{RateProvider, RateProviderConfig};
use crate::rates::{fallback_currencies, FALLBACK_BASE};

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Base currency cannot be empty")]
    EmptyBaseCurrency,

    #[error("Base currency {0} has no fallback rate")]
    UnknownBaseCurrency(CurrencyCode),

    #[error("Feed URL cannot be empty")]
    EmptyFeedUrl,

    #[error("{0} must be greater than zero")]
    NonPositiveDuration(&'static str),
}

/// Main FX configuration.
#[derive(Debug, Clone)]
pub struct FxConfig {
    /// Currency all rates are quoted against.
    pub base_currency: CurrencyCode,
    /// Latest-rates endpoint; the base code is appended as a path segment.
    pub feed_url: String,
    /// How long a rate table is cached.
    pub cache_ttl: Duration,
    /// Timeout for a single feed request.
    pub fetch_timeout: Duration,
    /// Query the live feed; when false only fallback rates are used.
    pub live_feed: bool,
    /// Log level.
    pub log_level: String,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            base_currency: CurrencyCode::new(FALLBACK_BASE),
            feed_url: DEFAULT_FEED_URL.to_string(),
            cache_ttl: constants::rate_cache_ttl(),
            fetch_timeout: constants::rate_fetch_timeout(),
            live_feed: true,
            log_level: "info".to_string(),
        }
    }
}

impl FxConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base) = lookup("SIMPLECURRENCY_BASE_CURRENCY") {
            config.base_currency = CurrencyCode::new(base);
        }

        if let Some(url) = lookup("SIMPLECURRENCY_FEED_URL") {
            config.feed_url = url;
        }

        let ttl_secs: Option<u32> = parse_var(&lookup, "SIMPLECURRENCY_CACHE_TTL_SECS");
        if let Some(secs) = ttl_secs {
            config.cache_ttl = Duration::seconds(secs.into());
        }

        let timeout_ms: Option<u32> = parse_var(&lookup, "SIMPLECURRENCY_FETCH_TIMEOUT_MS");
        if let Some(millis) = timeout_ms {
            config.fetch_timeout = Duration::milliseconds(millis.into());
        }

        if let Some(live) = parse_var(&lookup, "SIMPLECURRENCY_LIVE_FEED") {
            config.live_feed = live;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_currency.code().is_empty() {
            return Err(ConfigError::EmptyBaseCurrency);
        }

        if !fallback_currencies().any(|code| code == self.base_currency) {
            return Err(ConfigError::UnknownBaseCurrency(self.base_currency.clone()));
        }

        if self.live_feed && self.feed_url.trim().is_empty() {
            return Err(ConfigError::EmptyFeedUrl);
        }

        if self.cache_ttl <= Duration::zero() {
            return Err(ConfigError::NonPositiveDuration("Cache TTL"));
        }

        if self.fetch_timeout <= Duration::zero() {
            return Err(ConfigError::NonPositiveDuration("Fetch timeout"));
        }

        Ok(())
    }

    /// Provider settings derived from this configuration.
    pub fn provider_config(&self) -> RateProviderConfig {
        RateProviderConfig {
            base_currency: self.base_currency.clone(),
            fetch_timeout: self.fetch_timeout.as_std(),
            cache: RateCacheConfig {
                ttl: self.cache_ttl,
            },
        }
    }

    /// The feed selected by this configuration.
    pub fn feed(&self) -> Arc<dyn RateFeed> {
        if self.live_feed {
            Arc::new(OpenErApiFeed::new(
                self.feed_url.clone(),
                self.fetch_timeout.as_std(),
            ))
        } else {
            Arc::new(StaticRateFeed)
        }
    }

    /// Build a provider from this configuration.
    pub fn build_provider(&self) -> RateProvider {
        RateProvider::new(self.feed(), self.provider_config())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}
