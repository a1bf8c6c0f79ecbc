//! Product API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::Actor;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};
use shared::ApiResponse;
use shared::models::Product;
use shared::request::{ProductCreate, ProductUpdate, QuoteRequest};
use shared::response::QuoteResponse;

/// GET /api/products - active and inactive products, public
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = state.catalog.list()?;
    Ok(ok(products))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = state.catalog.get(&id)?;
    Ok(ok(product))
}

/// POST /api/products - admin only
pub async fn create(
    State(state): State<ServerState>,
    actor: Actor,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_admin(&actor)?;
    let product = state.catalog.create(payload)?;
    tracing::info!(product_id = %product.id, actor = %actor.user_id, "Product created");
    Ok(ok(product))
}

/// PUT /api/products/{id} - admin only; in-flight orders keep their
/// already-computed price
pub async fn update(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<ApiResponse<Product>>> {
    require_admin(&actor)?;
    let product = state.catalog.update(&id, payload)?;
    tracing::info!(product_id = %product.id, version = product.version, actor = %actor.user_id, "Product updated");
    Ok(ok(product))
}

/// POST /api/products/quote - public live quoting, no store mutation
pub async fn quote(
    State(state): State<ServerState>,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<ApiResponse<QuoteResponse>>> {
    let product = state.catalog.get_active(&payload.product_id)?;

    // unauthenticated quoting uses the widest configured cap; checkout
    // re-prices with the caller's own role cap
    let cap = state
        .guard
        .snapshot()
        .policies
        .values()
        .map(|p| p.max_quantity_per_order)
        .max()
        .unwrap_or(1);

    let quote = state.pricing.price(
        &product,
        payload.quantity,
        payload.tier,
        payload.payment_method,
        payload.promo_code.as_deref(),
        cap,
    )?;

    Ok(ok(QuoteResponse {
        breakdown: quote.breakdown,
        currency: product.currency,
        promo_warning: quote.promo_warning,
    }))
}

fn require_admin(actor: &Actor) -> AppResult<()> {
    if !actor.role.can_administer() {
        return Err(AppError::Forbidden(format!(
            "{} lacks catalog administration rights",
            actor.user_id
        )));
    }
    Ok(())
}
