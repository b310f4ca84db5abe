//! Product prices stored in their own currency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use simplecurrency_common::{CurrencyCode, Money};
use simplecurrency_fx::{
    convert_money, format_price, CurrencyFormatRegistry, FxError, FxResult, RateTable,
};
use std::fmt;

/// Pricing metadata the host store keeps per product.
///
/// Both fields are optional because products created before the currency
/// override was enabled carry neither; such products keep the host's price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPricing {
    /// Currency the product is priced in.
    pub native_currency: Option<CurrencyCode>,
    /// Price in `native_currency`.
    pub base_price: Option<Decimal>,
}

impl ProductPricing {
    pub fn new(native_currency: CurrencyCode, base_price: Decimal) -> Self {
        Self {
            native_currency: Some(native_currency),
            base_price: Some(base_price),
        }
    }

    /// The native price, when both attributes are set and the price is non-zero.
    pub fn native_price(&self) -> Option<Money> {
        match (&self.native_currency, self.base_price) {
            (Some(currency), Some(price)) if !price.is_zero() => {
                Some(Money::new(price, currency.clone()))
            }
            _ => None,
        }
    }

    /// The product price in `target`.
    ///
    /// `Ok(None)` means the product has no native price and the caller should
    /// keep its own.
    pub fn price_in(&self, target: &CurrencyCode, rates: &RateTable) -> FxResult<Option<Money>> {
        let Some(native) = self.native_price() else {
            return Ok(None);
        };

        if &native.currency == target {
            return Ok(Some(native));
        }

        convert_money(&native, target, rates).map(Some)
    }

    /// Converted unit price times `quantity`, in `target`.
    ///
    /// `Ok(None)` under the same conditions as [`Self::price_in`].
    pub fn line_total(
        &self,
        quantity: u32,
        target: &CurrencyCode,
        rates: &RateTable,
    ) -> FxResult<Option<Money>> {
        let Some(unit) = self.price_in(target, rates)? else {
            return Ok(None);
        };

        let value = unit
            .value
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| FxError::ConversionOverflow {
                from: self.native_currency.clone().unwrap_or_else(|| target.clone()),
                to: target.clone(),
            })?;

        Ok(Some(Money::new(value, unit.currency)))
    }
}

/// A native price, plus the visitor's currency when it differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDisplay {
    pub native: String,
    pub converted: Option<String>,
}

impl fmt::Display for PriceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.converted {
            Some(converted) => write!(f, "{} ({})", self.native, converted),
            None => f.write_str(&self.native),
        }
    }
}

/// Render a product price for a visitor browsing in `visitor_currency`.
///
/// Renders `"10.00 €"` when currencies match and `"10.00 € ($10.80)"`
/// otherwise. `Ok(None)` when the product has no native price.
pub fn display_price(
    product: &ProductPricing,
    visitor_currency: &CurrencyCode,
    rates: &RateTable,
    formats: &CurrencyFormatRegistry,
) -> FxResult<Option<PriceDisplay>> {
    let Some(native) = product.native_price() else {
        return Ok(None);
    };

    let native_label = format_price(native.value, &native.currency, formats);

    let converted = if &native.currency == visitor_currency {
        None
    } else {
        let converted = convert_money(&native, visitor_currency, rates)?;
        Some(format_price(converted.value, &converted.currency, formats))
    };

    Ok(Some(PriceDisplay {
        native: native_label,
        converted,
    }))
}
