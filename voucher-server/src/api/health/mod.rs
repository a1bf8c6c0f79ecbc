//! Health check route
//!
//! # Routes
//!
//! | Path | Method | Purpose | Auth |
//! |------|--------|---------|------|
//! | /health | GET | Liveness probe | none |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

/// Public route, no authentication
pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    /// Mirrors the risk-policy kill switch
    system_locked: bool,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        system_locked: state.guard.snapshot().system_locked,
    })
}
