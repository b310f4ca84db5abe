//! Cart line and order totals in the request currency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use simplecurrency_common::{CurrencyCode, Money};
use simplecurrency_fx::{FxError, FxResult, RateTable};
use tracing::debug;

use crate::product::ProductPricing;

/// One cart line as the host store sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductPricing,
    pub quantity: u32,
    /// Line total the host computed, used as-is for products without a
    /// native price.
    pub host_line_total: Decimal,
}

impl CartLine {
    pub fn new(product: ProductPricing, quantity: u32, host_line_total: Decimal) -> Self {
        Self {
            product,
            quantity,
            host_line_total,
        }
    }

    /// Line total in `target`, falling back to the host's figure.
    pub fn total_in(&self, target: &CurrencyCode, rates: &RateTable) -> FxResult<Decimal> {
        match self.product.line_total(self.quantity, target, rates)? {
            Some(total) => Ok(total.value),
            None => Ok(self.host_line_total),
        }
    }
}

/// Sum of all cart lines in `target`.
///
/// An empty cart totals zero.
pub fn cart_total(lines: &[CartLine], target: &CurrencyCode, rates: &RateTable) -> FxResult<Money> {
    let mut total = Decimal::ZERO;
    for line in lines {
        let line_total = line.total_in(target, rates)?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| FxError::ConversionOverflow {
                from: line
                    .product
                    .native_currency
                    .clone()
                    .unwrap_or_else(|| target.clone()),
                to: target.clone(),
            })?;
    }

    debug!(currency = %target, lines = lines.len(), total = %total, "Cart total computed");
    Ok(Money::new(total, target.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rates() -> RateTable {
        RateTable::new(
            CurrencyCode::eur(),
            vec![
                (CurrencyCode::usd(), dec!(1.08)),
                (CurrencyCode::gbp(), dec!(0.85)),
            ],
        )
    }

    #[test]
    fn test_cart_total_mixes_converted_and_host_lines() {
        let lines = vec![
            CartLine::new(ProductPricing::new(CurrencyCode::eur(), dec!(10)), 2, dec!(999)),
            CartLine::new(ProductPricing::new(CurrencyCode::usd(), dec!(5)), 1, dec!(999)),
            CartLine::new(ProductPricing::default(), 4, dec!(12.50)),
        ];

        let total = cart_total(&lines, &CurrencyCode::usd(), &rates()).unwrap();

        // 2 x 10.80 + 5.00 + host 12.50
        assert_eq!(total, Money::new(dec!(39.10), CurrencyCode::usd()));
    }

    #[test]
    fn test_cart_total_empty() {
        let total = cart_total(&[], &CurrencyCode::gbp(), &rates()).unwrap();
        assert!(total.is_zero());
        assert_eq!(total.currency, CurrencyCode::gbp());
    }

    #[test]
    fn test_cart_total_missing_rate() {
        let lines = vec![CartLine::new(
            ProductPricing::new(CurrencyCode::new("ZZZ"), dec!(1)),
            1,
            dec!(1),
        )];

        let result = cart_total(&lines, &CurrencyCode::usd(), &rates());

        assert_eq!(result, Err(FxError::MissingRate(CurrencyCode::new("ZZZ"))));
    }

    #[test]
    fn test_cart_total_overflow() {
        let lines = vec![
            CartLine::new(ProductPricing::default(), 1, Decimal::MAX),
            CartLine::new(ProductPricing::default(), 1, Decimal::MAX),
        ];

        let result = cart_total(&lines, &CurrencyCode::usd(), &rates());

        assert!(matches!(result, Err(FxError::ConversionOverflow { .. })));
    }
}
