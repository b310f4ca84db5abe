//! SimpleCurrency Common Types
//!
//! Shared types used across the SimpleCurrency crates: currency codes,
//! monetary amounts and time helpers for cache expiry.

pub mod monetary;
pub mod time;

pub use monetary::*;
pub use time::*;
