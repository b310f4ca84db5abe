//! SimpleCurrency FX Engine
//!
//! Exchange rates relative to a base currency, pivot conversion between any
//! two known currencies, and symbol-aware price formatting.
//!
//! # Features
//!
//! - Rate table cached with a TTL, refreshed single-flight from a live feed
//! - Static fallback rates when the feed is down
//! - Base-currency pivot conversion on `Decimal` amounts
//! - Symbol/position formatting with a code-as-symbol fallback
//!
//! # Example
//!
//! ```rust,ignore
//! use simplecurrency_fx::{convert, format_price, CurrencyFormatRegistry, FxConfig};
//! use simplecurrency_common::CurrencyCode;
//!
//! let provider = FxConfig::from_env().build_provider();
//! let rates = provider.get_rates().await;
//!
//! let usd = convert(dec!(100), &CurrencyCode::eur(), &CurrencyCode::usd(), &rates)?;
//! let label = format_price(usd, &CurrencyCode::usd(), &CurrencyFormatRegistry::builtin());
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod error;
pub mod feed;
pub mod format;
pub mod provider;
pub mod rates;

pub use cache::RateCache;
pub use config::{ConfigError, FxConfig};
pub use conversion::{convert, convert_money, CurrencyConverter};
pub use error::{FxError, FxResult, RateFetchError};
pub use feed::{OpenErApiFeed, RateFeed, StaticRateFeed};
pub use format::{
    format_number, format_plain, format_price, from_minor_units, to_minor_units, CurrencyFormat,
    CurrencyFormatRegistry, SymbolPosition,
};
pub use provider::{RateProvider, RateProviderConfig};
pub use rates::{RateSource, RateTable};

#[cfg(any(test, feature = "test-utils"))]
pub use feed::MockRateFeed;
