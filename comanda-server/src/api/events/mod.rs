//! Events API module
//!
//! WebSocket subscriptions onto the change-event hub.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/events", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/subscribe", get(handler::subscribe))
}
