//! Shared domain types for the voucher storefront engine
//!
//! Everything that crosses the wire lives here: domain models, request
//! DTOs and the unified API response envelope. The server crate owns all
//! behavior; this crate owns shape.

pub mod models;
pub mod request;
pub mod response;

pub use models::{
    Order, OrderStatus, PaymentMethod, PriceBreakdown, Product, Role, StatusChange, TierDiscount,
    UnitType, VoucherCode, VoucherStatus,
};
pub use request::{
    CheckoutRequest, ImportRequest, ProductCreate, ProductUpdate, QuoteRequest, VerifyRequest,
};
pub use response::{ApiResponse, ImportReport, InventorySummary, QuoteResponse};
