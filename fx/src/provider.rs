//! Cached rate provider with fallback rates.

use simplecurrency_common::{constants, CurrencyCode, DurationExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, RateCache, RateCacheConfig};
use crate::error::RateFetchError;
use crate::feed::RateFeed;
use crate::rates::RateTable;

/// Configuration for the rate provider.
#[derive(Debug, Clone)]
pub struct RateProviderConfig {
    /// Currency all rates are relative to.
    pub base_currency: CurrencyCode,
    /// Hard bound on a single feed call.
    pub fetch_timeout: Duration,
    /// Cache configuration.
    pub cache: RateCacheConfig,
}

impl Default for RateProviderConfig {
    fn default() -> Self {
        Self {
            base_currency: CurrencyCode::eur(),
            fetch_timeout: constants::rate_fetch_timeout().as_std(),
            cache: RateCacheConfig::default(),
        }
    }
}

/// Supplies the current [`RateTable`].
///
/// On a cache miss the static fallback table is overlaid with whatever the
/// feed returns and the result is cached for the full TTL. A failed fetch
/// is cached too, so a feed outage costs one request per TTL window rather
/// than one per caller. Refreshes are single-flight: concurrent callers that
/// miss the cache wait for the one in-progress refresh.
pub struct RateProvider {
    feed: Arc<dyn RateFeed>,
    cache: RateCache,
    refresh: Mutex<()>,
    config: RateProviderConfig,
}

impl RateProvider {
    /// Create a new provider on top of the given feed.
    pub fn new(feed: Arc<dyn RateFeed>, config: RateProviderConfig) -> Self {
        Self {
            feed,
            cache: RateCache::with_config(config.cache.clone()),
            refresh: Mutex::new(()),
            config,
        }
    }

    /// Get the current rate table. Never fails.
    #[instrument(skip(self), fields(base = %self.config.base_currency))]
    pub async fn get_rates(&self) -> Arc<RateTable> {
        if let Some(table) = self.cache.get() {
            return table;
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(table) = self.cache.get() {
            debug!("Using rates refreshed by concurrent caller");
            return table;
        }

        let table = Arc::new(self.build_table().await);
        self.cache.insert(table.clone());

        info!(
            source = %table.source(),
            currencies = table.len(),
            "Rate table refreshed"
        );

        table
    }

    /// Expire the cached table so the next call refreshes.
    pub fn invalidate(&self) {
        self.cache.clear();
        info!(base = %self.config.base_currency, "Rate cache invalidated");
    }

    /// The cached table, if any, without triggering a refresh.
    pub fn cached(&self) -> Option<Arc<RateTable>> {
        self.cache.peek()
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.config.base_currency
    }

    /// Get provider statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn build_table(&self) -> RateTable {
        let base = &self.config.base_currency;
        let mut table = RateTable::fallback(base);

        match self.fetch(base).await {
            Ok(live) => {
                let returned = live.len();
                let applied = table.overlay(live);
                debug!(
                    feed = self.feed.name(),
                    returned,
                    applied,
                    "Applied live rates"
                );
            }
            Err(e) => {
                warn!(
                    feed = self.feed.name(),
                    error = %e,
                    "Rate refresh failed, using fallback rates"
                );
            }
        }

        table
    }

    async fn fetch(
        &self,
        base: &CurrencyCode,
    ) -> Result<HashMap<CurrencyCode, f64>, RateFetchError> {
        tokio::time::timeout(self.config.fetch_timeout, self.feed.fetch_latest(base))
            .await
            .map_err(|_| RateFetchError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MockRateFeed;
    use crate::rates::{fallback_currencies, RateSource};
    use chrono::Duration as ChronoDuration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn setup_provider(feed: Arc<MockRateFeed>, ttl: ChronoDuration) -> RateProvider {
        let config = RateProviderConfig {
            fetch_timeout: Duration::from_millis(200),
            cache: RateCacheConfig { ttl },
            ..Default::default()
        };
        RateProvider::new(feed, config)
    }

    #[tokio::test]
    async fn test_live_rates_overlay_fallback() {
        let feed = Arc::new(MockRateFeed::succeeding(&[("USD", 1.1), ("BGN", 1.95583)]));
        let provider = setup_provider(feed.clone(), ChronoDuration::hours(12));

        let rates = provider.get_rates().await;

        assert_eq!(rates.source(), RateSource::Live);
        assert_eq!(rates.get("USD"), Some(dec!(1.1)));
        assert_eq!(rates.get("BGN"), Some(dec!(1.95583)));
        assert_eq!(rates.get("GBP"), Some(dec!(0.85)));
        assert_eq!(rates.get("EUR"), Some(Decimal::ONE));
    }

    #[tokio::test]
    async fn test_cache_hit_within_ttl() {
        let feed = Arc::new(MockRateFeed::succeeding(&[("USD", 1.1)]));
        let provider = setup_provider(feed.clone(), ChronoDuration::hours(12));

        let first = provider.get_rates().await;
        let second = provider.get_rates().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_uses_fallback_and_is_cached() {
        let feed = Arc::new(MockRateFeed::failing(RateFetchError::Status(503)));
        let provider = setup_provider(feed.clone(), ChronoDuration::hours(12));

        let rates = provider.get_rates().await;

        assert_eq!(rates.source(), RateSource::Fallback);
        assert!(fallback_currencies().all(|c| rates.contains(c.code())));
        assert_eq!(rates.get("EUR"), Some(Decimal::ONE));

        // Fallback table is served for the full TTL without retrying
        let again = provider.get_rates().await;
        assert!(Arc::ptr_eq(&rates, &again));
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_after_ttl_expiry() {
        let feed = Arc::new(MockRateFeed::succeeding(&[("USD", 1.1)]));
        let provider = setup_provider(feed.clone(), ChronoDuration::milliseconds(50));

        let first = provider.get_rates().await;
        assert_eq!(first.get("USD"), Some(dec!(1.1)));

        feed.set_error(RateFetchError::Network("connection refused".to_string()));
        tokio::time::sleep(Duration::from_millis(60)).await;

        let second = provider.get_rates().await;

        assert_eq!(feed.calls(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.source(), RateSource::Fallback);
        assert_eq!(second.get("USD"), Some(dec!(1.08)));
        assert!(fallback_currencies().all(|c| second.contains(c.code())));
    }

    #[tokio::test]
    async fn test_slow_feed_times_out_to_fallback() {
        let feed = Arc::new(
            MockRateFeed::succeeding(&[("USD", 1.1)]).with_delay(Duration::from_secs(5)),
        );
        let provider = setup_provider(feed.clone(), ChronoDuration::hours(12));

        let rates = provider.get_rates().await;

        assert_eq!(rates.source(), RateSource::Fallback);
        assert_eq!(rates.get("USD"), Some(dec!(1.08)));
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let feed = Arc::new(
            MockRateFeed::succeeding(&[("USD", 1.1)]).with_delay(Duration::from_millis(50)),
        );
        let provider = Arc::new(setup_provider(feed.clone(), ChronoDuration::hours(12)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.get_rates().await })
            })
            .collect();

        let mut tables = Vec::new();
        for handle in handles {
            tables.push(handle.await.unwrap());
        }

        assert_eq!(feed.calls(), 1);
        assert!(tables.iter().all(|t| Arc::ptr_eq(t, &tables[0])));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let feed = Arc::new(MockRateFeed::succeeding(&[("USD", 1.1)]));
        let provider = setup_provider(feed.clone(), ChronoDuration::hours(12));

        provider.get_rates().await;
        assert!(provider.cached().is_some());

        provider.invalidate();
        assert!(provider.cached().is_none());

        feed.set_rates(&[("USD", 1.2)]);
        let rates = provider.get_rates().await;

        assert_eq!(feed.calls(), 2);
        assert_eq!(rates.get("USD"), Some(dec!(1.2)));
    }
}
