//! Orders API module
//!
//! The `/api/orders` surface plus `/api/order-items` for item-level
//! status changes.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", order_routes())
        .nest("/api/order-items", item_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/counts", get(handler::counts))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", post(handler::update_status))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/payment-status", post(handler::update_payment_status))
        .route("/{id}/assign", post(handler::assign))
        .route("/{id}/estimated-ready", post(handler::set_estimated_ready))
        .route("/{id}/notes", post(handler::update_notes))
}

fn item_routes() -> Router<ServerState> {
    Router::new()
        .route("/status", post(handler::bulk_update_item_status))
        .route("/{id}/status", post(handler::update_item_status))
}
