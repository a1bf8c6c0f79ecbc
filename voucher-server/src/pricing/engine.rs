//! Price computation
//!
//! Uses rust_decimal for precise calculations, stores as f64.
//!
//! Discount policy: the quantity-tier discount and the partner-level role
//! discount are percentages of the base amount and are summed, never
//! compounded, so every line of the breakdown can be re-derived from the
//! base amount by hand. The gateway surcharge applies to the
//! post-discount amount.

use rust_decimal::prelude::*;
use shared::models::{PaymentMethod, PriceBreakdown, Product};
use std::sync::Arc;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a Decimal to 2 decimal places, half away from zero
#[inline]
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Pricing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("invalid quantity {quantity} (allowed 1..={cap})")]
    InvalidQuantity { quantity: u32, cap: u32 },
}

/// Promo code resolution, an external collaborator
///
/// Implementations must be deterministic for the engine's
/// identical-inputs-identical-output guarantee to hold. Returns the
/// discount percentage of the base amount, or `None` when the code is
/// unknown or expired.
pub trait PromoResolver: Send + Sync {
    fn resolve(&self, code: &str) -> Option<f64>;
}

/// Resolver that knows no codes; every promo yields a warning
#[derive(Debug, Default)]
pub struct NoPromos;

impl PromoResolver for NoPromos {
    fn resolve(&self, _code: &str) -> Option<f64> {
        None
    }
}

/// Pricing knobs, loaded from `Config` at startup
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Gateway surcharge, percent of the post-discount amount
    pub gateway_surcharge_percent: f64,
    /// Role discount percent per partner tier level
    pub role_discount_percent: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            gateway_surcharge_percent: 4.5,
            role_discount_percent: 2.0,
        }
    }
}

/// A computed quote
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub breakdown: PriceBreakdown,
    /// Set when a non-empty promo code could not be resolved
    pub promo_warning: Option<String>,
}

/// The pricing engine
#[derive(Clone)]
pub struct PricingEngine {
    config: PricingConfig,
    promos: Arc<dyn PromoResolver>,
}

impl PricingEngine {
    pub fn new(config: PricingConfig, promos: Arc<dyn PromoResolver>) -> Self {
        Self { config, promos }
    }

    /// Compute an itemized price breakdown
    ///
    /// `cap` is the caller-role's per-order quantity cap from the risk
    /// policy. An unresolvable promo code never fails the computation:
    /// the discount is zero and the quote carries a warning.
    pub fn price(
        &self,
        product: &Product,
        quantity: u32,
        partner_level: u8,
        method: PaymentMethod,
        promo_code: Option<&str>,
        cap: u32,
    ) -> Result<Quote, PriceError> {
        if quantity == 0 || quantity > cap {
            return Err(PriceError::InvalidQuantity { quantity, cap });
        }

        let base = round2(to_decimal(product.base_price) * Decimal::from(quantity));

        // Tier-table lookup: largest min_quantity threshold <= quantity
        let tier_percent = product
            .tier_discounts
            .iter()
            .filter(|t| t.min_quantity <= quantity)
            .max_by_key(|t| t.min_quantity)
            .map(|t| to_decimal(t.percent))
            .unwrap_or(Decimal::ZERO);

        // Role discount: percent per partner level, summed with the tier
        // percent against the base amount
        let role_percent =
            to_decimal(self.config.role_discount_percent) * Decimal::from(partner_level);

        let mut tier_discount =
            round2(base * (tier_percent + role_percent) / Decimal::ONE_HUNDRED);
        // Discounts can never exceed the base amount
        if tier_discount > base {
            tier_discount = base;
        }

        let (mut promo_discount, promo_warning) = match promo_code.map(str::trim) {
            None | Some("") => (Decimal::ZERO, None),
            Some(code) => match self.promos.resolve(code) {
                Some(percent) => (
                    round2(base * to_decimal(percent) / Decimal::ONE_HUNDRED),
                    None,
                ),
                None => (
                    Decimal::ZERO,
                    Some(format!("promo code '{code}' not recognized, no discount applied")),
                ),
            },
        };
        if promo_discount > base - tier_discount {
            promo_discount = base - tier_discount;
        }

        let post_discount = base - tier_discount - promo_discount;

        let bank_charges = match method {
            PaymentMethod::BankTransfer => Decimal::ZERO,
            PaymentMethod::Gateway => round2(
                post_discount * to_decimal(self.config.gateway_surcharge_percent)
                    / Decimal::ONE_HUNDRED,
            ),
        };

        let total = post_discount + bank_charges;

        Ok(Quote {
            breakdown: PriceBreakdown {
                base_amount: to_f64(base),
                tier_discount: to_f64(tier_discount),
                promo_discount: to_f64(promo_discount),
                bank_charges: to_f64(bank_charges),
                total_amount: to_f64(total),
            },
            promo_warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{TierDiscount, UnitType};

    struct FixedPromo(f64);

    impl PromoResolver for FixedPromo {
        fn resolve(&self, code: &str) -> Option<f64> {
            (code == "WELCOME5").then_some(self.0)
        }
    }

    fn pte_product(base_price: f64) -> Product {
        Product {
            id: "product-pte".to_string(),
            name: "PTE Academic".to_string(),
            category: "PTE".to_string(),
            unit_type: UnitType::Voucher,
            base_price,
            currency: "PKR".to_string(),
            tier_discounts: vec![
                TierDiscount {
                    min_quantity: 2,
                    percent: 5.0,
                },
                TierDiscount {
                    min_quantity: 3,
                    percent: 10.0,
                },
            ],
            is_active: true,
            version: 1,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn engine() -> PricingEngine {
        PricingEngine::new(PricingConfig::default(), Arc::new(NoPromos))
    }

    #[test]
    fn test_tier_lookup_three_units() {
        // basePrice 100, qty 3, tier table 10% at qty>=3, bank transfer:
        // 300 / 30 / 0 / 0 / 270
        let quote = engine()
            .price(&pte_product(100.0), 3, 0, PaymentMethod::BankTransfer, None, 3)
            .unwrap();
        let b = &quote.breakdown;
        assert_eq!(b.base_amount, 300.0);
        assert_eq!(b.tier_discount, 30.0);
        assert_eq!(b.promo_discount, 0.0);
        assert_eq!(b.bank_charges, 0.0);
        assert_eq!(b.total_amount, 270.0);
        assert!(b.is_consistent());
    }

    #[test]
    fn test_role_discount_sums_with_tier() {
        // Partner level 2 adds 2% x 2 = 4% on top of the 10% tier discount,
        // both against the base: 300 - 42 = 258
        let quote = engine()
            .price(&pte_product(100.0), 3, 2, PaymentMethod::BankTransfer, None, 3)
            .unwrap();
        let b = &quote.breakdown;
        assert_eq!(b.base_amount, 300.0);
        assert_eq!(b.tier_discount, 42.0);
        assert_eq!(b.total_amount, 258.0);
        assert!(b.is_consistent());
    }

    #[test]
    fn test_largest_threshold_wins() {
        // qty 2 hits the 5% tier, not the 10% one
        let quote = engine()
            .price(&pte_product(100.0), 2, 0, PaymentMethod::BankTransfer, None, 3)
            .unwrap();
        assert_eq!(quote.breakdown.tier_discount, 10.0);
        assert_eq!(quote.breakdown.total_amount, 190.0);
    }

    #[test]
    fn test_no_tier_below_threshold() {
        let quote = engine()
            .price(&pte_product(100.0), 1, 0, PaymentMethod::BankTransfer, None, 3)
            .unwrap();
        assert_eq!(quote.breakdown.tier_discount, 0.0);
        assert_eq!(quote.breakdown.total_amount, 100.0);
    }

    #[test]
    fn test_quantity_bounds() {
        let e = engine();
        let p = pte_product(100.0);
        assert_eq!(
            e.price(&p, 0, 0, PaymentMethod::BankTransfer, None, 3),
            Err(PriceError::InvalidQuantity { quantity: 0, cap: 3 })
        );
        assert_eq!(
            e.price(&p, 4, 0, PaymentMethod::BankTransfer, None, 3),
            Err(PriceError::InvalidQuantity { quantity: 4, cap: 3 })
        );
    }

    #[test]
    fn test_gateway_surcharge_rounds_half_up() {
        // 33.33 post-discount, 4.5% = 1.49985 -> 1.50
        let quote = engine()
            .price(&pte_product(33.33), 1, 0, PaymentMethod::Gateway, None, 3)
            .unwrap();
        let b = &quote.breakdown;
        assert_eq!(b.bank_charges, 1.50);
        assert_eq!(b.total_amount, 34.83);
        assert!(b.is_consistent());
    }

    #[test]
    fn test_surcharge_applies_after_discounts() {
        // base 300, 10% tier -> 270, 4.5% of 270 = 12.15
        let quote = engine()
            .price(&pte_product(100.0), 3, 0, PaymentMethod::Gateway, None, 3)
            .unwrap();
        let b = &quote.breakdown;
        assert_eq!(b.bank_charges, 12.15);
        assert_eq!(b.total_amount, 282.15);
    }

    #[test]
    fn test_promo_applies() {
        let e = PricingEngine::new(PricingConfig::default(), Arc::new(FixedPromo(5.0)));
        let quote = e
            .price(
                &pte_product(100.0),
                1,
                0,
                PaymentMethod::BankTransfer,
                Some("WELCOME5"),
                3,
            )
            .unwrap();
        assert_eq!(quote.breakdown.promo_discount, 5.0);
        assert_eq!(quote.breakdown.total_amount, 95.0);
        assert!(quote.promo_warning.is_none());
    }

    #[test]
    fn test_unresolvable_promo_warns_but_prices() {
        let quote = engine()
            .price(
                &pte_product(100.0),
                1,
                0,
                PaymentMethod::BankTransfer,
                Some("EXPIRED2019"),
                3,
            )
            .unwrap();
        assert_eq!(quote.breakdown.promo_discount, 0.0);
        assert_eq!(quote.breakdown.total_amount, 100.0);
        assert!(quote.promo_warning.is_some());
    }

    #[test]
    fn test_blank_promo_is_not_a_warning() {
        let quote = engine()
            .price(
                &pte_product(100.0),
                1,
                0,
                PaymentMethod::BankTransfer,
                Some("   "),
                3,
            )
            .unwrap();
        assert!(quote.promo_warning.is_none());
    }

    #[test]
    fn test_determinism() {
        let e = PricingEngine::new(PricingConfig::default(), Arc::new(FixedPromo(5.0)));
        let p = pte_product(149.99);
        let a = e
            .price(&p, 3, 2, PaymentMethod::Gateway, Some("WELCOME5"), 3)
            .unwrap();
        let b = e
            .price(&p, 3, 2, PaymentMethod::Gateway, Some("WELCOME5"), 3)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invariant_holds_across_inputs() {
        let e = PricingEngine::new(PricingConfig::default(), Arc::new(FixedPromo(7.5)));
        for price in [0.01, 9.99, 100.0, 1234.56] {
            let p = pte_product(price);
            for qty in 1..=3u32 {
                for level in [0u8, 1, 3] {
                    for method in [PaymentMethod::BankTransfer, PaymentMethod::Gateway] {
                        for promo in [None, Some("WELCOME5"), Some("BOGUS")] {
                            let q = e.price(&p, qty, level, method, promo, 3).unwrap();
                            assert!(
                                q.breakdown.is_consistent(),
                                "inconsistent breakdown: {:?}",
                                q.breakdown
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_discounts_never_exceed_base() {
        // 100% promo on top of tier discount must clamp, not go negative
        let e = PricingEngine::new(PricingConfig::default(), Arc::new(FixedPromo(100.0)));
        let quote = e
            .price(
                &pte_product(100.0),
                3,
                0,
                PaymentMethod::Gateway,
                Some("WELCOME5"),
                3,
            )
            .unwrap();
        let b = &quote.breakdown;
        assert_eq!(b.total_amount, 0.0);
        assert!(b.is_consistent());
    }
}
