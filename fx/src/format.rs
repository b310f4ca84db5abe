//! Price formatting by currency symbol and position.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use simplecurrency_common::CurrencyCode;
use std::collections::HashMap;
use tracing::debug;

/// Number of decimals every price is rendered with.
pub const PRICE_DECIMALS: u32 = 2;

/// Where the symbol goes relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPosition {
    /// `$10.00`
    Left,
    /// `10.00$`
    Right,
    /// `$ 10.00`
    LeftSpace,
    /// `10.00 $`
    RightSpace,
}

impl SymbolPosition {
    /// Join a symbol and an already formatted number.
    pub fn apply(&self, symbol: &str, number: &str) -> String {
        match self {
            SymbolPosition::Left => format!("{symbol}{number}"),
            SymbolPosition::Right => format!("{number}{symbol}"),
            SymbolPosition::LeftSpace => format!("{symbol} {number}"),
            SymbolPosition::RightSpace => format!("{number} {symbol}"),
        }
    }
}

/// Display rule for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub position: SymbolPosition,
}

impl CurrencyFormat {
    pub fn new(symbol: impl Into<String>, position: SymbolPosition) -> Self {
        Self {
            symbol: symbol.into(),
            position,
        }
    }

    /// Rule used for currencies with no registered format: `10.00 XYZ`.
    pub fn fallback(currency: &CurrencyCode) -> Self {
        Self::new(currency.code(), SymbolPosition::RightSpace)
    }
}

const BUILTIN_FORMATS: &[(&str, &str, SymbolPosition)] = &[
    // European currencies
    ("EUR", "€", SymbolPosition::RightSpace),
    ("GBP", "£", SymbolPosition::Left),
    ("CHF", "CHF", SymbolPosition::RightSpace),
    ("SEK", "kr", SymbolPosition::RightSpace),
    ("NOK", "kr", SymbolPosition::RightSpace),
    ("DKK", "kr", SymbolPosition::RightSpace),
    ("PLN", "zł", SymbolPosition::RightSpace),
    ("CZK", "Kč", SymbolPosition::RightSpace),
    ("HUF", "Ft", SymbolPosition::RightSpace),
    ("RON", "lei", SymbolPosition::RightSpace),
    ("BGN", "лв", SymbolPosition::RightSpace),
    ("HRK", "kn", SymbolPosition::RightSpace),
    ("ISK", "kr", SymbolPosition::RightSpace),
    // American currencies
    ("USD", "$", SymbolPosition::Left),
    ("CAD", "C$", SymbolPosition::Left),
    ("MXN", "MX$", SymbolPosition::Left),
    ("BRL", "R$", SymbolPosition::Left),
    ("ARS", "AR$", SymbolPosition::Left),
    ("CLP", "CLP$", SymbolPosition::Left),
    ("COP", "COL$", SymbolPosition::Left),
    ("PEN", "S/.", SymbolPosition::Left),
    ("UYU", "$U", SymbolPosition::Left),
];

/// Symbol and position rules keyed by currency.
#[derive(Debug, Clone)]
pub struct CurrencyFormatRegistry {
    formats: HashMap<CurrencyCode, CurrencyFormat>,
}

impl CurrencyFormatRegistry {
    /// The compiled-in registry.
    pub fn builtin() -> Self {
        let formats = BUILTIN_FORMATS
            .iter()
            .map(|(code, symbol, position)| {
                (CurrencyCode::new(*code), CurrencyFormat::new(*symbol, *position))
            })
            .collect();
        Self { formats }
    }

    /// A registry with no formats; every currency uses the fallback rule.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// Add or replace a format.
    pub fn with_format(mut self, currency: CurrencyCode, format: CurrencyFormat) -> Self {
        self.formats.insert(currency, format);
        self
    }

    /// Registered format, if any.
    pub fn get(&self, currency: &str) -> Option<&CurrencyFormat> {
        self.formats.get(currency)
    }

    /// Registered format, or the code-as-symbol fallback.
    pub fn resolve(&self, currency: &CurrencyCode) -> CurrencyFormat {
        match self.get(currency.code()) {
            Some(format) => format.clone(),
            None => {
                debug!(currency = %currency, "No registered format, using code as symbol");
                CurrencyFormat::fallback(currency)
            }
        }
    }

    /// Display symbol for a currency.
    pub fn symbol(&self, currency: &CurrencyCode) -> String {
        self.resolve(currency).symbol
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl Default for CurrencyFormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Format a price for display: `1234.5` in USD becomes `$1,234.50`.
///
/// Always two decimals, `,` between thousands and `.` before the decimals.
/// Never fails; unknown currencies render as `10.00 XYZ`.
pub fn format_price(amount: Decimal, currency: &CurrencyCode, formats: &CurrencyFormatRegistry) -> String {
    let format = formats.resolve(currency);
    format.position.apply(&format.symbol, &format_number(amount))
}

/// Two decimals with thousands separators, no symbol: `-1,234.50`.
pub fn format_number(amount: Decimal) -> String {
    let parts = DecimalParts::new(amount);
    format!(
        "{}{}.{:02}",
        parts.sign(),
        group_thousands(&parts.integer),
        parts.cents
    )
}

/// Two decimals, no grouping: `1234.50`. Suited to payment payloads.
pub fn format_plain(amount: Decimal) -> String {
    let parts = DecimalParts::new(amount);
    format!("{}{}.{:02}", parts.sign(), parts.integer, parts.cents)
}

/// Integer minor units (cents) for card gateways: `12.345` becomes `1235`.
///
/// `None` when the rounded amount does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()
}

/// Amount from integer minor units: `1235` becomes `12.35`.
pub fn from_minor_units(units: i64) -> Decimal {
    Decimal::new(units, PRICE_DECIMALS)
}

/// An amount rounded to cents and split for rendering.
struct DecimalParts {
    negative: bool,
    integer: String,
    cents: u32,
}

impl DecimalParts {
    fn new(amount: Decimal) -> Self {
        let rounded =
            amount.round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
        let abs = rounded.abs();

        let integer = abs.trunc().to_string();
        let integer = integer.split('.').next().unwrap_or("0").to_string();
        let cents = (abs.fract() * Decimal::ONE_HUNDRED).to_u32().unwrap_or(0);

        Self {
            // -0.001 rounds to zero and must not render as -0.00
            negative: rounded.is_sign_negative() && !rounded.is_zero(),
            integer,
            cents,
        }
    }

    fn sign(&self) -> &'static str {
        if self.negative {
            "-"
        } else {
            ""
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
