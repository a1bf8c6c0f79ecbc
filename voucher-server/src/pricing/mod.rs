//! Pricing Engine
//!
//! Pure, deterministic price computation. No store access, no side
//! effects; safe to call concurrently and repeatedly for live quoting.

mod engine;

pub use engine::{NoPromos, PriceError, PricingConfig, PricingEngine, PromoResolver, Quote};
