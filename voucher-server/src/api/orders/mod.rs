//! Order API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/verify", post(handler::verify))
        .route("/{id}/hold", post(handler::hold))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/notes", post(handler::append_note))
        .route("/{id}/payment-callback", post(handler::payment_callback))
}
