//! FX error types.

use simplecurrency_common::CurrencyCode;
use thiserror::Error;

/// Errors surfaced to callers of the conversion API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    /// The rate table has no entry for this currency.
    #[error("No exchange rate available for {0}")]
    MissingRate(CurrencyCode),

    /// The converted amount does not fit in a decimal.
    #[error("Conversion from {from} to {to} overflowed")]
    ConversionOverflow { from: CurrencyCode, to: CurrencyCode },

    /// A currency switch was requested for a currency the store cannot price in.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(CurrencyCode),
}

impl FxError {
    /// Get error code for logs and API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::MissingRate(_) => "MISSING_RATE",
            FxError::ConversionOverflow { .. } => "CONVERSION_OVERFLOW",
            FxError::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

/// Failures while refreshing rates from a feed.
///
/// These never leave [`crate::RateProvider`]; they are logged and the
/// fallback table is used instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateFetchError {
    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("Rate feed request failed: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("Rate feed request timed out")]
    Timeout,

    /// The feed answered with a non-200 status.
    #[error("Rate feed returned HTTP {0}")]
    Status(u16),

    /// The body was not a `{ "rates": { ... } }` document.
    #[error("Malformed rate feed response: {0}")]
    Malformed(String),

    /// The live feed is switched off.
    #[error("Live rate feed is disabled")]
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FxError::MissingRate(CurrencyCode::new("ZZZ"));
        assert_eq!(err.to_string(), "No exchange rate available for ZZZ");
        assert_eq!(err.error_code(), "MISSING_RATE");

        assert_eq!(
            RateFetchError::Status(503).to_string(),
            "Rate feed returned HTTP 503"
        );
    }
}
