//! Order API handlers
//!
//! Reads are scoped: buyers see their own orders, settlement roles see
//! everything. Settlement actions (verify/hold/reject) go through the
//! coordinator, which enforces authority and the state machine.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::Actor;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok, ok_with_message};
use shared::ApiResponse;
use shared::models::Order;
use shared::request::VerifyRequest;

/// GET /api/orders - own orders; all orders for settlement roles
pub async fn list(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let orders = if actor.role.can_view_all_orders() {
        state.ledger.list_all(&actor)?
    } else {
        state.ledger.list_for_user(&actor.user_id)?
    };
    Ok(ok(orders))
}

/// GET /api/orders/{id} - owner or settlement roles
pub async fn get_by_id(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.ledger.get_scoped(&id, &actor)?;
    Ok(ok(order))
}

/// POST /api/orders/{id}/verify - settlement confirmed, fulfill
pub async fn verify(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.coordinator.verify(&actor, &id, payload.note).await?;
    Ok(ok_with_message(order, "Order fulfilled"))
}

/// POST /api/orders/{id}/hold
pub async fn hold(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.coordinator.hold(&actor, &id, payload.note).await?;
    Ok(ok(order))
}

/// POST /api/orders/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.coordinator.reject(&actor, &id, payload.note).await?;
    Ok(ok(order))
}

/// POST /api/orders/{id}/cancel - buyer-side, Pending only
pub async fn cancel(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.coordinator.cancel(&actor, &id).await?;
    Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

/// POST /api/orders/{id}/notes - settlement roles, any order state
pub async fn append_note(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<NoteRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    if !actor.role.can_settle() {
        return Err(AppError::Forbidden(format!(
            "{} lacks settlement authority",
            actor.user_id
        )));
    }
    crate::utils::validation::validate_required_text(&payload.note, "note", crate::utils::validation::MAX_NOTE_LEN)?;
    let order = state
        .ledger
        .append_note(&id, &actor.audit_label(), payload.note)?;
    Ok(ok(order))
}

/// POST /api/orders/{id}/payment-callback - called by the external
/// payment gateway; authenticity is the gateway's responsibility
pub async fn payment_callback(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.coordinator.payment_callback(&id).await?;
    Ok(ok_with_message(order, "Payment confirmed"))
}
