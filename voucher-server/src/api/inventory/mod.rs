//! Inventory API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", inventory_routes())
}

fn inventory_routes() -> Router<ServerState> {
    Router::new()
        .route("/{product_id}/import", post(handler::import))
        .route("/{product_id}/summary", get(handler::summary))
        .route("/codes/{code_id}", get(handler::get_code))
        .route("/codes/{code_id}/expire", post(handler::expire))
}
