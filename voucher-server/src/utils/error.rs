//! Unified error handling
//!
//! Application-level error type with stable reason codes. Every failure a
//! caller can act on has its own code: the UI shows "restock needed" for
//! `E6001` and "retry after 24h" for `E2003`, never a generic failure.
//!
//! # Reason code ranges
//!
//! | Prefix | Category | Examples |
//! |--------|----------|----------|
//! | E0xxx  | General / validation | E0002 validation, E0003 not found |
//! | E2xxx  | Authorization | E2001 forbidden, E2002 system locked, E2003 quota |
//! | E3xxx  | Authentication | E3001 no session, E3004 unverified identity |
//! | E4xxx  | Orders | E4001 invalid quantity, E4002 illegal transition |
//! | E5xxx  | Payment | E5001 settlement proof, E5002 method restricted |
//! | E6xxx  | Inventory | E6001 insufficient stock |
//! | E9xxx  | System | E9001 internal, E9002 storage |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::ApiResponse;
use shared::models::OrderStatus;
use tracing::error;

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    // ========== Authorization (403 / 423 / 429) ==========
    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("System is locked for new orders")]
    SystemLocked,

    #[error("Identity verification required")]
    VerificationRequired,

    #[error("Daily order limit reached ({limit} per 24h)")]
    DailyQuotaReached { limit: u32 },

    // ========== Validation (400) ==========
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid quantity {quantity} (allowed 1..={cap})")]
    InvalidQuantity { quantity: u32, cap: u32 },

    #[error("Bank reference and proof of transfer are required")]
    IncompleteSettlementProof,

    #[error("Gateway payment is restricted to trusted buyers")]
    PaymentMethodRestricted,

    // ========== Business logic ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: usize,
    },

    #[error("Illegal order transition: {from:?} -> {to:?}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    // ========== System (5xx) ==========
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable reason code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "E3001",
            AppError::VerificationRequired => "E3004",
            AppError::Forbidden(_) => "E2001",
            AppError::SystemLocked => "E2002",
            AppError::DailyQuotaReached { .. } => "E2003",
            AppError::Validation(_) => "E0002",
            AppError::InvalidQuantity { .. } => "E4001",
            AppError::IncompleteSettlementProof => "E5001",
            AppError::PaymentMethodRestricted => "E5002",
            AppError::NotFound(_) => "E0003",
            AppError::Conflict(_) => "E0004",
            AppError::InsufficientStock { .. } => "E6001",
            AppError::IllegalTransition { .. } => "E4002",
            AppError::Storage(_) => "E9002",
            AppError::Internal(_) => "E9001",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_)
            | AppError::VerificationRequired
            | AppError::PaymentMethodRestricted => StatusCode::FORBIDDEN,
            AppError::SystemLocked => StatusCode::LOCKED,
            AppError::DailyQuotaReached { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Validation(_)
            | AppError::InvalidQuantity { .. }
            | AppError::IncompleteSettlementProof => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::InsufficientStock { .. }
            | AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // Storage/internal details go to the log, not the wire
        let message = match &self {
            AppError::Storage(msg) => {
                error!(target: "storage", error = %msg, "Storage error occurred");
                "Storage error".to_string()
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ApiResponse::<()>::error(code, message));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type AppResult<T> = Result<T, AppError>;

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok_with_message(data, message))
}

// ========== Component error conversions ==========

impl From<crate::storage::StorageError> for AppError {
    fn from(e: crate::storage::StorageError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<crate::catalog::CatalogError> for AppError {
    fn from(e: crate::catalog::CatalogError) -> Self {
        use crate::catalog::CatalogError;
        match e {
            CatalogError::Storage(err) => AppError::Storage(err.to_string()),
            CatalogError::NotFound(id) => AppError::NotFound(format!("product {id}")),
            CatalogError::Inactive(_) | CatalogError::Invalid(_) => {
                AppError::Validation(e.to_string())
            }
        }
    }
}

impl From<crate::inventory::VaultError> for AppError {
    fn from(e: crate::inventory::VaultError) -> Self {
        use crate::inventory::VaultError;
        match e {
            VaultError::Storage(err) => AppError::Storage(err.to_string()),
            VaultError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            VaultError::NotFound(id) => AppError::NotFound(format!("voucher code {id}")),
            VaultError::IllegalStatus { .. } => AppError::Conflict(e.to_string()),
            VaultError::CodeTooLong { .. } => AppError::Validation(e.to_string()),
        }
    }
}

impl From<crate::ledger::LedgerError> for AppError {
    fn from(e: crate::ledger::LedgerError) -> Self {
        use crate::ledger::LedgerError;
        match e {
            LedgerError::Storage(err) => AppError::Storage(err.to_string()),
            LedgerError::NotFound(id) => AppError::NotFound(format!("order {id}")),
            LedgerError::IllegalTransition { from, to, .. } => {
                AppError::IllegalTransition { from, to }
            }
            LedgerError::CodeCountMismatch { .. } => AppError::Internal(e.to_string()),
            LedgerError::Forbidden(msg) => AppError::Forbidden(msg),
        }
    }
}

impl From<crate::guard::GuardError> for AppError {
    fn from(e: crate::guard::GuardError) -> Self {
        use crate::guard::GuardError;
        match e {
            GuardError::SystemLocked => AppError::SystemLocked,
            GuardError::VerificationRequired => AppError::VerificationRequired,
            GuardError::DailyQuotaReached { limit } => AppError::DailyQuotaReached { limit },
            GuardError::Ledger(err) => err.into(),
        }
    }
}

impl From<crate::pricing::PriceError> for AppError {
    fn from(e: crate::pricing::PriceError) -> Self {
        match e {
            crate::pricing::PriceError::InvalidQuantity { quantity, cap } => {
                AppError::InvalidQuantity { quantity, cap }
            }
        }
    }
}

impl From<crate::fulfillment::FulfillmentError> for AppError {
    fn from(e: crate::fulfillment::FulfillmentError) -> Self {
        use crate::fulfillment::FulfillmentError;
        match e {
            FulfillmentError::Catalog(err) => err.into(),
            FulfillmentError::Vault(err) => err.into(),
            FulfillmentError::Ledger(err) => err.into(),
            FulfillmentError::Guard(err) => err.into(),
            FulfillmentError::Price(err) => err.into(),
            FulfillmentError::TermsNotAccepted => {
                AppError::Validation("non-refundable terms must be accepted".to_string())
            }
            FulfillmentError::IncompleteSettlementProof => AppError::IncompleteSettlementProof,
            FulfillmentError::PaymentMethodRestricted => AppError::PaymentMethodRestricted,
            FulfillmentError::Validation(msg) => AppError::Validation(msg),
            FulfillmentError::Forbidden(msg) => AppError::Forbidden(msg),
        }
    }
}
