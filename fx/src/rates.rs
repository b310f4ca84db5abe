//! Rate tables relative to a base currency.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use simplecurrency_common::CurrencyCode;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::error::{FxError, FxResult};

/// Currency the fallback rates are quoted against.
pub const FALLBACK_BASE: &str = "EUR";

/// Static rates used when the live feed is unavailable (1 EUR = rate units).
const FALLBACK_RATES: &[(&str, Decimal)] = &[
    ("EUR", dec!(1.0)),
    ("USD", dec!(1.08)),
    ("GBP", dec!(0.85)),
    ("JPY", dec!(160.0)),
    ("CAD", dec!(1.47)),
    ("AUD", dec!(1.63)),
    ("CHF", dec!(0.98)),
    ("CNY", dec!(7.82)),
    ("SEK", dec!(11.27)),
    ("NZD", dec!(1.77)),
    ("MXN", dec!(20.14)),
    ("SGD", dec!(1.45)),
    ("HKD", dec!(8.44)),
    ("NOK", dec!(11.65)),
    ("KRW", dec!(1470.0)),
    ("TRY", dec!(34.85)),
    ("RUB", dec!(98.0)),
    ("INR", dec!(90.0)),
    ("BRL", dec!(5.45)),
    ("ZAR", dec!(20.0)),
    ("DKK", dec!(7.46)),
    ("PLN", dec!(4.32)),
    ("THB", dec!(39.0)),
    ("IDR", dec!(17000.0)),
    ("HUF", dec!(390.0)),
    ("CZK", dec!(25.0)),
    ("ILS", dec!(4.0)),
    ("CLP", dec!(1000.0)),
    ("PHP", dec!(61.0)),
    ("AED", dec!(3.97)),
    ("COP", dec!(4300.0)),
    ("SAR", dec!(4.05)),
    ("MYR", dec!(5.0)),
    ("RON", dec!(4.97)),
    ("IRR", dec!(45000.0)),
];

/// Codes covered by the static fallback table.
pub fn fallback_currencies() -> impl Iterator<Item = CurrencyCode> {
    FALLBACK_RATES.iter().map(|(code, _)| CurrencyCode::new(*code))
}

/// Where the values in a [`RateTable`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Static fallback table only.
    Fallback,
    /// Fallback table overlaid with live feed data.
    Live,
    /// Supplied directly by the caller.
    Manual,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Fallback => f.write_str("fallback"),
            RateSource::Live => f.write_str("live"),
            RateSource::Manual => f.write_str("manual"),
        }
    }
}

/// Value of one unit of the base currency in each known currency.
///
/// Always contains the base currency at exactly `1`, and only positive rates.
/// Tables are built once and then shared read-only behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, Decimal>,
    source: RateSource,
    fetched_at: DateTime<Utc>,
}

impl RateTable {
    /// Build a table from caller-supplied rates.
    ///
    /// Non-positive rates are dropped and the base is pinned to `1`.
    pub fn new(
        base: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
    ) -> Self {
        let mut table = Self::base_only(base, RateSource::Manual);
        for (code, rate) in rates {
            table.insert(code, rate);
        }
        table.pin_base();
        table
    }

    /// The static fallback table, rebased onto `base` when it is not EUR.
    pub fn fallback(base: &CurrencyCode) -> Self {
        let mut table = Self::base_only(base.clone(), RateSource::Fallback);

        let divisor = if base.code() == FALLBACK_BASE {
            Decimal::ONE
        } else {
            match FALLBACK_RATES.iter().find(|(code, _)| *code == base.code()) {
                Some((_, rate)) => *rate,
                None => {
                    warn!(base = %base, "Base currency has no fallback rate");
                    return table;
                }
            }
        };

        for (code, rate) in FALLBACK_RATES {
            table
                .rates
                .insert(CurrencyCode::new(*code), *rate / divisor);
        }
        table.pin_base();
        table
    }

    /// Overlay feed rates onto this table, overwriting collisions.
    ///
    /// Returns the number of rates applied. Entries that are not positive
    /// finite numbers are skipped.
    pub(crate) fn overlay(&mut self, live: HashMap<CurrencyCode, f64>) -> usize {
        let mut applied = 0;
        for (code, value) in live {
            match Decimal::from_f64(value) {
                Some(rate) if rate > Decimal::ZERO => {
                    self.rates.insert(code, rate);
                    applied += 1;
                }
                _ => warn!(currency = %code, value, "Skipping unusable feed rate"),
            }
        }

        if applied > 0 {
            self.source = RateSource::Live;
            self.fetched_at = Utc::now();
        }
        self.pin_base();
        applied
    }

    /// Base currency all rates are relative to.
    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn source(&self) -> RateSource {
        self.source
    }

    /// When the table was assembled.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Look up a rate.
    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    /// Look up a rate, failing with [`FxError::MissingRate`].
    pub fn rate(&self, currency: &CurrencyCode) -> FxResult<Decimal> {
        self.get(currency.code())
            .ok_or_else(|| FxError::MissingRate(currency.clone()))
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.rates.contains_key(currency)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Known currencies in code order.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Rates in code order.
    pub fn sorted_rates(&self) -> Vec<(CurrencyCode, Decimal)> {
        let mut rates: Vec<(CurrencyCode, Decimal)> =
            self.rates.iter().map(|(c, r)| (c.clone(), *r)).collect();
        rates.sort_by(|a, b| a.0.cmp(&b.0));
        rates
    }

    fn base_only(base: CurrencyCode, source: RateSource) -> Self {
        let mut rates = HashMap::new();
        rates.insert(base.clone(), Decimal::ONE);
        Self {
            base,
            rates,
            source,
            fetched_at: Utc::now(),
        }
    }

    fn insert(&mut self, code: CurrencyCode, rate: Decimal) {
        if rate <= Decimal::ZERO {
            warn!(currency = %code, rate = %rate, "Dropping non-positive rate");
            return;
        }
        self.rates.insert(code, rate);
    }

    fn pin_base(&mut self) {
        self.rates.insert(self.base.clone(), Decimal::ONE);
    }
}
