//! Rate table caching with TTL support.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use simplecurrency_common::{constants, expires_in, is_expired};
use std::sync::Arc;
use tracing::debug;

use crate::rates::RateTable;

/// Cached table entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<RateTable>,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(table: Arc<RateTable>, ttl: Duration) -> Self {
        Self {
            table,
            cached_at: Utc::now(),
            expires_at: expires_in(ttl),
        }
    }

    fn is_valid(&self) -> bool {
        !is_expired(self.expires_at)
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a stored table is served before a refresh is needed.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::rate_cache_ttl(),
        }
    }
}

/// Thread-safe single-slot cache holding the current rate table.
///
/// The slot is replaced wholesale on insert, so readers see either the old
/// or the new table and never a mix.
pub struct RateCache {
    slot: RwLock<Option<CacheEntry>>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            slot: RwLock::new(None),
            config,
        }
    }

    /// Get the table if it has not expired.
    pub fn get(&self) -> Option<Arc<RateTable>> {
        match self.slot.read().as_ref() {
            Some(entry) if entry.is_valid() => {
                debug!(source = %entry.table.source(), "Cache hit");
                Some(entry.table.clone())
            }
            Some(entry) => {
                debug!(expired_at = %entry.expires_at, "Cache entry expired");
                None
            }
            None => {
                debug!("Cache miss");
                None
            }
        }
    }

    /// Get the stored table regardless of expiry.
    pub fn peek(&self) -> Option<Arc<RateTable>> {
        self.slot.read().as_ref().map(|entry| entry.table.clone())
    }

    /// Store a table with the configured TTL.
    pub fn insert(&self, table: Arc<RateTable>) {
        self.insert_with_ttl(table, self.config.ttl);
    }

    /// Store a table with a custom TTL.
    pub fn insert_with_ttl(&self, table: Arc<RateTable>, ttl: Duration) {
        *self.slot.write() = Some(CacheEntry::new(table, ttl));
    }

    /// Drop the stored table.
    pub fn clear(&self) {
        self.slot.write().take();
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        match self.slot.read().as_ref() {
            Some(entry) => CacheStats {
                populated: true,
                valid: entry.is_valid(),
                cached_at: Some(entry.cached_at),
                expires_at: Some(entry.expires_at),
            },
            None => CacheStats::default(),
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub populated: bool,
    pub valid: bool,
    pub cached_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}
