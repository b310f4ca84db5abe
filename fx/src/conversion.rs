//! Pivot conversion between currencies.

use rust_decimal::Decimal;
use simplecurrency_common::{CurrencyCode, Money};

use crate::error::{FxError, FxResult};
use crate::format::{format_price, CurrencyFormatRegistry};
use crate::rates::RateTable;

/// Convert `amount` from one currency to another through the table's base.
///
/// Same-currency conversions return `amount` untouched, even for codes the
/// table does not know. Otherwise both codes must be in `rates`.
pub fn convert(
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &RateTable,
) -> FxResult<Decimal> {
    if from == to {
        return Ok(amount);
    }

    let from_rate = rates.rate(from)?;
    let to_rate = rates.rate(to)?;

    amount
        .checked_div(from_rate)
        .and_then(|base_amount| base_amount.checked_mul(to_rate))
        .ok_or_else(|| FxError::ConversionOverflow {
            from: from.clone(),
            to: to.clone(),
        })
}

/// Convert a [`Money`] value into `to`.
pub fn convert_money(amount: &Money, to: &CurrencyCode, rates: &RateTable) -> FxResult<Money> {
    let value = convert(amount.value, &amount.currency, to, rates)?;
    Ok(Money::new(value, to.clone()))
}

/// Conversion and formatting against one rate table and format registry.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyConverter<'a> {
    rates: &'a RateTable,
    formats: &'a CurrencyFormatRegistry,
}

impl<'a> CurrencyConverter<'a> {
    pub fn new(rates: &'a RateTable, formats: &'a CurrencyFormatRegistry) -> Self {
        Self { rates, formats }
    }

    pub fn rates(&self) -> &'a RateTable {
        self.rates
    }

    /// See [`convert`].
    pub fn convert(&self, amount: Decimal, from: &CurrencyCode, to: &CurrencyCode) -> FxResult<Decimal> {
        convert(amount, from, to, self.rates)
    }

    /// See [`convert_money`].
    pub fn convert_money(&self, amount: &Money, to: &CurrencyCode) -> FxResult<Money> {
        convert_money(amount, to, self.rates)
    }

    /// Format an amount for display in `currency`.
    pub fn format(&self, amount: Decimal, currency: &CurrencyCode) -> String {
        format_price(amount, currency, self.formats)
    }

    /// Format a [`Money`] value for display.
    pub fn format_money(&self, money: &Money) -> String {
        self.format(money.value, &money.currency)
    }

    /// Convert, then format in the target currency.
    pub fn convert_and_format(
        &self,
        amount: &Money,
        to: &CurrencyCode,
    ) -> FxResult<String> {
        let converted = self.convert_money(amount, to)?;
        Ok(self.format_money(&converted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_rates() -> RateTable {
        RateTable::new(
            CurrencyCode::eur(),
            vec![
                (CurrencyCode::usd(), dec!(1.08)),
                (CurrencyCode::gbp(), dec!(0.85)),
            ],
        )
    }

    #[test]
    fn test_convert_from_base() {
        let rates = test_rates();
        let result = convert(dec!(100), &CurrencyCode::eur(), &CurrencyCode::usd(), &rates).unwrap();

        assert_eq!(result, dec!(108));
    }

    #[test]
    fn test_convert_cross_pivot() {
        let rates = test_rates();
        let result = convert(dec!(100), &CurrencyCode::usd(), &CurrencyCode::gbp(), &rates).unwrap();

        // 100 / 1.08 * 0.85
        assert_eq!(result.round_dp(4), dec!(78.7037));
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let rates = test_rates();
        let amount = dec!(19.99);

        let result = convert(amount, &CurrencyCode::usd(), &CurrencyCode::usd(), &rates).unwrap();
        assert_eq!(result, amount);
        assert_eq!(result.scale(), amount.scale());

        // Holds even for currencies without a rate
        let unknown = CurrencyCode::new("ZZZ");
        assert_eq!(convert(amount, &unknown, &unknown, &rates).unwrap(), amount);
    }

    #[test]
    fn test_convert_negative_and_zero() {
        let rates = test_rates();

        let refund = convert(dec!(-50), &CurrencyCode::eur(), &CurrencyCode::usd(), &rates).unwrap();
        assert_eq!(refund, dec!(-54));

        let zero = convert(Decimal::ZERO, &CurrencyCode::gbp(), &CurrencyCode::usd(), &rates).unwrap();
        assert!(zero.is_zero());
    }

    #[test]
    fn test_convert_missing_target_rate() {
        let rates = test_rates();
        let result = convert(dec!(10), &CurrencyCode::usd(), &CurrencyCode::new("ZZZ"), &rates);

        assert_eq!(result, Err(FxError::MissingRate(CurrencyCode::new("ZZZ"))));
    }

    #[test]
    fn test_convert_missing_source_rate() {
        let rates = test_rates();
        let result = convert(dec!(10), &CurrencyCode::new("ZZZ"), &CurrencyCode::usd(), &rates);

        assert_eq!(result, Err(FxError::MissingRate(CurrencyCode::new("ZZZ"))));
    }

    #[test]
    fn test_convert_overflow() {
        let rates = RateTable::new(
            CurrencyCode::eur(),
            vec![
                (CurrencyCode::new("TINY"), dec!(0.0000001)),
                (CurrencyCode::new("HUGE"), dec!(1000000000)),
            ],
        );

        let result = convert(
            Decimal::MAX,
            &CurrencyCode::new("TINY"),
            &CurrencyCode::new("HUGE"),
            &rates,
        );

        assert!(matches!(result, Err(FxError::ConversionOverflow { .. })));
    }

    #[test]
    fn test_converter_convert_and_format() {
        let rates = test_rates();
        let formats = CurrencyFormatRegistry::builtin();
        let converter = CurrencyConverter::new(&rates, &formats);

        let price = Money::new(dec!(1000), CurrencyCode::eur());
        let formatted = converter
            .convert_and_format(&price, &CurrencyCode::usd())
            .unwrap();

        assert_eq!(formatted, "$1,080.00");
        assert_eq!(converter.format_money(&price), "1,000.00 €");
    }

    fn arb_currency() -> impl Strategy<Value = CurrencyCode> {
        prop::sample::select(crate::rates::fallback_currencies().collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn prop_identity(
            cents in -1_000_000_000_000_000i64..1_000_000_000_000_000i64,
            currency in arb_currency(),
        ) {
            let rates = RateTable::fallback(&CurrencyCode::eur());
            let amount = Decimal::new(cents, 2);

            prop_assert_eq!(convert(amount, &currency, &currency, &rates).unwrap(), amount);
        }

        #[test]
        fn prop_round_trip(
            cents in -100_000_000_000i64..100_000_000_000i64,
            from in arb_currency(),
            to in arb_currency(),
        ) {
            let rates = RateTable::fallback(&CurrencyCode::eur());
            let amount = Decimal::new(cents, 2);

            let there = convert(amount, &from, &to, &rates).unwrap();
            let back = convert(there, &to, &from, &rates).unwrap();

            let tolerance = (amount.abs() * dec!(0.000000001)).max(dec!(0.000000001));
            prop_assert!((back - amount).abs() <= tolerance);
        }
    }
}
