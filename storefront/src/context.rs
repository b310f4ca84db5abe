//! Per-request currency selection.

use serde::{Deserialize, Serialize};
use simplecurrency_common::CurrencyCode;
use simplecurrency_fx::{FxError, FxResult, RateTable};
use tracing::{debug, info};

/// The currency a single request is priced in.
///
/// Built once per request from whatever the host knows about the visitor
/// and passed explicitly to every pricing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    currency: CurrencyCode,
}

impl RequestContext {
    pub fn new(currency: CurrencyCode) -> Self {
        Self { currency }
    }

    /// Pick the request currency: the visitor's explicit choice, then the
    /// currency detected for them, then the shop's base currency.
    pub fn resolve(
        chosen: Option<CurrencyCode>,
        detected: Option<CurrencyCode>,
        base: CurrencyCode,
    ) -> Self {
        let currency = chosen.or(detected).unwrap_or(base);
        debug!(currency = %currency, "Resolved request currency");
        Self { currency }
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    /// Switch to `currency` if the rate table can price in it.
    pub fn switch_currency(&mut self, currency: CurrencyCode, rates: &RateTable) -> FxResult<()> {
        if !rates.contains(currency.code()) {
            return Err(FxError::UnsupportedCurrency(currency));
        }

        info!(from = %self.currency, to = %currency, "Currency switched");
        self.currency = currency;
        Ok(())
    }
}
