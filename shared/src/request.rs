//! Request DTOs

use crate::models::{PaymentMethod, TierDiscount, UnitType};
use serde::{Deserialize, Serialize};

/// Buyer checkout submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub product_id: String,
    pub quantity: u32,
    pub buyer_email: String,
    pub payment_method: PaymentMethod,
    /// Mandatory for bank transfer, together with `proof_attached`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    #[serde(default)]
    pub proof_attached: bool,
    /// Explicit non-refundable-terms attestation; checkout fails without it
    #[serde(default)]
    pub accept_non_refundable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

/// Quote request (safe unauthenticated, no side effects)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub product_id: String,
    pub quantity: u32,
    /// Partner tier level; 0 means no role discount
    #[serde(default)]
    pub tier: u8,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

/// Settlement action body (the outcome is in the URL path)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Admin bulk code import: newline-delimited raw code list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    pub codes: String,
}

/// Admin product creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub unit_type: UnitType,
    pub base_price: f64,
    pub currency: String,
    #[serde(default)]
    pub tier_discounts: Vec<TierDiscount>,
}

/// Admin product update payload (partial)
///
/// Price changes take effect only for orders priced afterwards; in-flight
/// orders keep their frozen breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_discounts: Option<Vec<TierDiscount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
