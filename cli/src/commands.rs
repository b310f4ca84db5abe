//! Output rendering for CLI commands.

use rust_decimal::Decimal;
use simplecurrency_common::{CurrencyCode, Money};
use simplecurrency_fx::{format_price, CurrencyConverter, CurrencyFormatRegistry, FxResult, RateTable};
use simplecurrency_storefront::{display_price, ProductPricing};
use std::fmt::Write;

/// One line per currency, header first.
pub fn render_rates(rates: &RateTable) -> String {
    let mut out = format!(
        "base={} source={} fetched_at={}\n",
        rates.base(),
        rates.source(),
        rates.fetched_at().to_rfc3339()
    );
    for (code, rate) in rates.sorted_rates() {
        let _ = writeln!(out, "{code:<6}{rate}");
    }
    out.trim_end().to_string()
}

pub fn render_conversion(
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &RateTable,
    formats: &CurrencyFormatRegistry,
) -> FxResult<String> {
    let converter = CurrencyConverter::new(rates, formats);
    let source = Money::new(amount, from.clone());
    let converted = converter.convert_money(&source, to)?;

    Ok(format!(
        "{} = {} ({})",
        converter.format_money(&source),
        converter.format_money(&converted),
        converted.value
    ))
}

pub fn render_format(amount: Decimal, currency: &CurrencyCode, formats: &CurrencyFormatRegistry) -> String {
    format_price(amount, currency, formats)
}

pub fn render_price(
    currency: &CurrencyCode,
    base_price: Decimal,
    to: &CurrencyCode,
    rates: &RateTable,
    formats: &CurrencyFormatRegistry,
) -> FxResult<String> {
    let product = ProductPricing::new(currency.clone(), base_price);
    let display = display_price(&product, to, rates, formats)?;

    Ok(display
        .map(|d| d.to_string())
        .unwrap_or_else(|| "no native price".to_string()))
}
