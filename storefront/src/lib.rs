//! SimpleCurrency Storefront
//!
//! Prices products in the visitor's currency. Each request carries an
//! explicit [`RequestContext`]; products carry their own native currency
//! and price, which are converted on demand through the FX engine.

pub mod cart;
pub mod context;
pub mod product;
pub mod service;

pub use cart::{cart_total, CartLine};
pub use context::RequestContext;
pub use product::{display_price, PriceDisplay, ProductPricing};
pub use service::PricingService;
