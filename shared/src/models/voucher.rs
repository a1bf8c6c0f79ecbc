//! Voucher Code Model

use serde::{Deserialize, Serialize};

/// Voucher code status
///
/// Transitions are monotonic: `Available → Reserved → Used`, with
/// `Expired` reachable from `Available` or `Reserved`. Codes are never
/// deleted, only status-flipped, so the vault stays auditable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherStatus {
    #[default]
    Available,
    Reserved,
    Used,
    Expired,
}

impl VoucherStatus {
    /// Whether the monotonic status graph permits this edge
    pub fn can_become(&self, next: VoucherStatus) -> bool {
        use VoucherStatus::*;
        matches!(
            (self, next),
            (Available, Reserved) | (Reserved, Used) | (Available, Expired) | (Reserved, Expired)
        )
    }

    /// Used and Expired codes never move again
    pub fn is_final(&self) -> bool {
        matches!(self, VoucherStatus::Used | VoucherStatus::Expired)
    }
}

/// A single voucher code in the vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCode {
    pub id: String,
    pub product_id: String,
    /// Opaque write-once credential; exposed only once allocated to an order
    pub code: String,
    pub status: VoucherStatus,
    /// Import sequence number; reservation scans ascending by this,
    /// so allocation order is deterministic and reproducible
    pub sequence: u64,
    /// Epoch millis
    pub imported_at: i64,
    /// Set when the code reaches `Used`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}
