//! System administration handlers
//!
//! The kill switch and the per-role risk policy, admin only.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::Actor;
use crate::core::ServerState;
use crate::guard::{RiskPolicy, RolePolicy};
use crate::utils::{AppError, AppResult, ok, ok_with_message};
use shared::ApiResponse;
use shared::models::Role;

/// GET /api/system/policy
pub async fn get_policy(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<RiskPolicy>>> {
    require_admin(&actor)?;
    Ok(ok(state.guard.snapshot()))
}

/// PUT /api/system/policy/{role}
pub async fn update_role_policy(
    State(state): State<ServerState>,
    actor: Actor,
    Path(role): Path<String>,
    Json(payload): Json<RolePolicy>,
) -> AppResult<Json<ApiResponse<RiskPolicy>>> {
    require_admin(&actor)?;
    let role: Role = role
        .parse()
        .map_err(|e: shared::models::UnknownRole| AppError::Validation(e.to_string()))?;
    if payload.max_quantity_per_order == 0 {
        return Err(AppError::Validation(
            "max_quantity_per_order must be at least 1".to_string(),
        ));
    }
    state.guard.update_role_policy(role, payload);
    Ok(ok(state.guard.snapshot()))
}

/// POST /api/system/lock - refuse all new orders platform-wide
pub async fn lock(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<RiskPolicy>>> {
    require_admin(&actor)?;
    state.guard.set_locked(true);
    tracing::warn!(actor = %actor.user_id, "System locked");
    Ok(ok_with_message(state.guard.snapshot(), "System locked"))
}

/// POST /api/system/unlock
pub async fn unlock(
    State(state): State<ServerState>,
    actor: Actor,
) -> AppResult<Json<ApiResponse<RiskPolicy>>> {
    require_admin(&actor)?;
    state.guard.set_locked(false);
    tracing::warn!(actor = %actor.user_id, "System unlocked");
    Ok(ok_with_message(state.guard.snapshot(), "System unlocked"))
}

fn require_admin(actor: &Actor) -> AppResult<()> {
    if !actor.role.can_administer() {
        return Err(AppError::Forbidden(format!(
            "{} lacks system administration rights",
            actor.user_id
        )));
    }
    Ok(())
}
