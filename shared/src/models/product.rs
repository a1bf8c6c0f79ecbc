//! Product Model

use serde::{Deserialize, Serialize};

/// What a single unit of the product is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
    /// Exam voucher code, fulfilled from the inventory vault
    #[default]
    Voucher,
    /// Course seat, no code inventory behind it
    Course,
}

/// Quantity-tier discount entry
///
/// The pricing engine picks the entry with the largest `min_quantity`
/// that is still `<=` the ordered quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierDiscount {
    pub min_quantity: u32,
    /// Discount percentage of the base amount (e.g. 10.0 for 10%)
    pub percent: f64,
}

/// Product entity (voucher SKU or course SKU)
///
/// Immutable from the buyer's point of view: admin updates bump `version`
/// and only affect orders priced afterwards. Orders snapshot the name and
/// the computed price at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Exam board, e.g. "PTE", "IELTS", "TOEFL"
    pub category: String,
    pub unit_type: UnitType,
    /// Unit price in currency units
    pub base_price: f64,
    /// Currency tag, passed through unconverted (e.g. "PKR", "USD")
    pub currency: String,
    /// Sorted ascending by `min_quantity` on write
    #[serde(default)]
    pub tier_discounts: Vec<TierDiscount>,
    pub is_active: bool,
    /// Bumped on every admin update
    pub version: u32,
    /// Epoch millis
    pub created_at: i64,
    pub updated_at: i64,
}
