//! Inventory API handlers
//!
//! Administrative surface: bulk import, stock summary, single-code
//! lookup and manual expiry. Codes are never bulk-listed here; they
//! leave the vault only through fulfillment.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::Actor;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok, ok_with_message};
use shared::ApiResponse;
use shared::models::VoucherCode;
use shared::request::ImportRequest;
use shared::response::{ImportReport, InventorySummary};

/// POST /api/inventory/{product_id}/import - admin only
///
/// Newline-delimited raw codes; duplicates are counted, not rejected.
pub async fn import(
    State(state): State<ServerState>,
    actor: Actor,
    Path(product_id): Path<String>,
    Json(payload): Json<ImportRequest>,
) -> AppResult<Json<ApiResponse<ImportReport>>> {
    require_admin(&actor)?;
    // the product must exist, active or not
    state.catalog.get(&product_id)?;

    let report = state.vault.import(&product_id, &payload.codes)?;
    tracing::info!(
        product_id = %product_id,
        added = report.added_count,
        duplicates = report.duplicate_count,
        actor = %actor.user_id,
        "Voucher codes imported"
    );
    Ok(ok_with_message(
        report,
        "Import complete",
    ))
}

/// GET /api/inventory/{product_id}/summary - settlement roles
pub async fn summary(
    State(state): State<ServerState>,
    actor: Actor,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<InventorySummary>>> {
    require_settler(&actor)?;
    let summary = state.vault.summary(&product_id)?;
    Ok(ok(summary))
}

/// GET /api/inventory/codes/{code_id} - admin only
///
/// Single-code lookup for support investigations.
pub async fn get_code(
    State(state): State<ServerState>,
    actor: Actor,
    Path(code_id): Path<String>,
) -> AppResult<Json<ApiResponse<VoucherCode>>> {
    require_admin(&actor)?;
    let code = state.vault.get(&code_id)?;
    Ok(ok(code))
}

/// POST /api/inventory/codes/{code_id}/expire - admin only
pub async fn expire(
    State(state): State<ServerState>,
    actor: Actor,
    Path(code_id): Path<String>,
) -> AppResult<Json<ApiResponse<VoucherCode>>> {
    require_admin(&actor)?;
    let code = state.vault.expire(&code_id)?;
    tracing::info!(code_id = %code_id, actor = %actor.user_id, "Voucher code expired");
    Ok(ok(code))
}

fn require_admin(actor: &Actor) -> AppResult<()> {
    if !actor.role.can_administer() {
        return Err(AppError::Forbidden(format!(
            "{} lacks inventory administration rights",
            actor.user_id
        )));
    }
    Ok(())
}

fn require_settler(actor: &Actor) -> AppResult<()> {
    if !actor.role.can_settle() {
        return Err(AppError::Forbidden(format!(
            "{} lacks settlement authority",
            actor.user_id
        )));
    }
    Ok(())
}
