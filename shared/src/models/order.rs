//! Order Model

use serde::{Deserialize, Serialize};

/// How the buyer pays
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Manual bank settlement: buyer supplies a bank reference and a
    /// proof-of-transfer attachment, a settlement role verifies later
    #[default]
    BankTransfer,
    /// External payment gateway, confirmed via callback
    Gateway,
}

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Hold,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Whether the state machine permits this edge
    ///
    /// `Pending → {Completed, Hold, Rejected, Cancelled}`,
    /// `Hold → {Completed, Rejected}`, terminal states are closed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            Pending => matches!(next, Completed | Hold | Rejected | Cancelled),
            Hold => matches!(next, Completed | Rejected),
            Completed | Rejected | Cancelled => false,
        }
    }
}

/// Itemized price snapshot, frozen onto the order at creation
///
/// Invariant: `total_amount == base_amount - tier_discount - promo_discount
/// + bank_charges`, every component `>= 0`. All values in currency units,
/// rounded to 2 decimal places.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceBreakdown {
    pub base_amount: f64,
    pub tier_discount: f64,
    pub promo_discount: f64,
    /// Gateway surcharge; always 0 for bank transfer
    pub bank_charges: f64,
    pub total_amount: f64,
}

impl PriceBreakdown {
    /// Check the arithmetic invariant (to half a cent, to absorb f64 noise)
    pub fn is_consistent(&self) -> bool {
        let computed =
            self.base_amount - self.tier_discount - self.promo_discount + self.bank_charges;
        let non_negative = self.base_amount >= 0.0
            && self.tier_discount >= 0.0
            && self.promo_discount >= 0.0
            && self.bank_charges >= 0.0
            && self.total_amount >= 0.0;
        non_negative && (computed - self.total_amount).abs() < 0.005
    }
}

/// One entry of the order's append-only audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    /// Actor identity: user id, or "gateway" for payment callbacks
    pub actor: String,
    /// Epoch millis
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Order aggregate
///
/// Invariant: `voucher_codes.len() == quantity as usize` if and only if
/// `status == Completed`; otherwise `voucher_codes` is empty. Once
/// Completed, quantity and price are frozen; only audit notes may still
/// be appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Human-legible unique id, e.g. `EDU2026082910001`
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    /// Name snapshot, decoupled from later catalog edits
    pub product_name: String,
    pub quantity: u32,
    pub price: PriceBreakdown,
    pub currency: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// Settlement identifier; required for bank transfer orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,
    #[serde(default)]
    pub proof_attached: bool,
    /// Empty until fulfillment attaches exactly `quantity` codes
    #[serde(default)]
    pub voucher_codes: Vec<String>,
    /// Epoch millis
    pub created_at: i64,
    /// Ordered status history, first entry is the Pending creation
    pub history: Vec<StatusChange>,
}

impl Order {
    /// The Completed ⟺ codes-attached invariant
    pub fn codes_invariant_holds(&self) -> bool {
        if self.status == OrderStatus::Completed {
            self.voucher_codes.len() == self.quantity as usize
        } else {
            self.voucher_codes.is_empty()
        }
    }
}
