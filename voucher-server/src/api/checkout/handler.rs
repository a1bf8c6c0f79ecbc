//! Checkout API handler

use axum::{Json, extract::State};
use serde::Serialize;

use crate::auth::Actor;
use crate::core::ServerState;
use crate::utils::{AppResult, ok};
use shared::ApiResponse;
use shared::models::Order;
use shared::request::CheckoutRequest;

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    /// Set when the promo code could not be resolved; the order still
    /// carries a valid price with zero promo discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_warning: Option<String>,
}

/// POST /api/checkout - submit an order, lands in Pending
pub async fn submit(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let outcome = state.coordinator.checkout(&actor, payload)?;
    Ok(ok(CheckoutResponse {
        order: outcome.order,
        promo_warning: outcome.promo_warning,
    }))
}
