//! System administration API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/system", system_routes())
}

fn system_routes() -> Router<ServerState> {
    Router::new()
        .route("/policy", get(handler::get_policy))
        .route("/policy/{role}", put(handler::update_role_policy))
        .route("/lock", post(handler::lock))
        .route("/unlock", post(handler::unlock))
}
