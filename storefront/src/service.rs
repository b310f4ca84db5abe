//! Pricing service combining the rate provider and format registry.

use simplecurrency_common::{CurrencyCode, Money};
use simplecurrency_fx::{
    convert_money, format_plain, format_price, to_minor_units, CurrencyFormatRegistry, FxError,
    FxResult, RateProvider,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::cart::{cart_total, CartLine};
use crate::context::RequestContext;
use crate::product::{display_price, PriceDisplay, ProductPricing};

/// Entry point for host integrations pricing products per request.
pub struct PricingService {
    provider: Arc<RateProvider>,
    formats: CurrencyFormatRegistry,
}

impl PricingService {
    pub fn new(provider: Arc<RateProvider>, formats: CurrencyFormatRegistry) -> Self {
        Self { provider, formats }
    }

    /// Context for a new request, defaulting to the provider's base currency.
    pub fn context_for(
        &self,
        chosen: Option<CurrencyCode>,
        detected: Option<CurrencyCode>,
    ) -> RequestContext {
        RequestContext::resolve(chosen, detected, self.provider.base_currency().clone())
    }

    /// Product price in the request currency.
    #[instrument(skip(self, product), fields(currency = %ctx.currency()))]
    pub async fn price_for(
        &self,
        ctx: &RequestContext,
        product: &ProductPricing,
    ) -> FxResult<Option<Money>> {
        let rates = self.provider.get_rates().await;
        product.price_in(ctx.currency(), &rates)
    }

    /// Native price plus the request currency rendering.
    #[instrument(skip(self, product), fields(currency = %ctx.currency()))]
    pub async fn display_for(
        &self,
        ctx: &RequestContext,
        product: &ProductPricing,
    ) -> FxResult<Option<PriceDisplay>> {
        let rates = self.provider.get_rates().await;
        display_price(product, ctx.currency(), &rates, &self.formats)
    }

    /// Switch the request currency, rejecting currencies without a rate.
    pub async fn switch_currency(
        &self,
        ctx: &mut RequestContext,
        currency: CurrencyCode,
    ) -> FxResult<()> {
        let rates = self.provider.get_rates().await;
        ctx.switch_currency(currency, &rates)
    }

    /// Currencies a visitor can switch to.
    pub async fn supported_currencies(&self) -> Vec<CurrencyCode> {
        self.provider.get_rates().await.currencies()
    }

    /// Display rendering of an amount.
    pub fn format(&self, money: &Money) -> String {
        format_price(money.value, &money.currency, &self.formats)
    }

    /// Cart line total in the request currency.
    #[instrument(skip(self, product), fields(currency = %ctx.currency()))]
    pub async fn line_total_for(
        &self,
        ctx: &RequestContext,
        product: &ProductPricing,
        quantity: u32,
    ) -> FxResult<Option<Money>> {
        let rates = self.provider.get_rates().await;
        product.line_total(quantity, ctx.currency(), &rates)
    }

    /// Cart total in the request currency.
    #[instrument(skip(self, lines), fields(currency = %ctx.currency(), lines = lines.len()))]
    pub async fn cart_total_for(&self, ctx: &RequestContext, lines: &[CartLine]) -> FxResult<Money> {
        let rates = self.provider.get_rates().await;
        cart_total(lines, ctx.currency(), &rates)
    }

    /// Order amount converted to the request currency for decimal gateways
    /// (`1234.50`).
    pub async fn payment_amount(&self, ctx: &RequestContext, order: &Money) -> FxResult<String> {
        let amount = self.order_amount_in(ctx, order).await?;
        Ok(format_plain(amount.value))
    }

    /// Order amount converted to the request currency in integer minor units
    /// for card gateways (`123450`).
    pub async fn payment_minor_units(&self, ctx: &RequestContext, order: &Money) -> FxResult<i64> {
        let amount = self.order_amount_in(ctx, order).await?;
        to_minor_units(amount.value).ok_or_else(|| FxError::ConversionOverflow {
            from: order.currency.clone(),
            to: ctx.currency().clone(),
        })
    }

    async fn order_amount_in(&self, ctx: &RequestContext, order: &Money) -> FxResult<Money> {
        if &order.currency == ctx.currency() {
            return Ok(order.clone());
        }

        let rates = self.provider.get_rates().await;
        let converted = convert_money(order, ctx.currency(), &rates)?;
        debug!(
            from = %order.currency,
            to = %converted.currency,
            amount = %converted.value,
            "Payment amount converted"
        );
        Ok(converted)
    }

    /// Currency symbol for the request currency.
    pub fn symbol(&self, ctx: &RequestContext) -> String {
        self.formats.symbol(ctx.currency())
    }
}
