//! Member Administration Routes

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, put},
};

use crate::auth::{require_admin, require_leader_or_admin};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/members", routes())
}

fn routes() -> Router<ServerState> {
    // Leader-or-admin routes; handlers narrow leaders to their own sectors
    let leader_routes = Router::new()
        .route("/pending", get(handler::list_pending))
        .route("/{id}/summary", get(handler::summary))
        .route("/{id}", delete(handler::remove))
        .layer(middleware::from_fn(require_leader_or_admin));

    // Admin-only state machine transitions
    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/approve", put(handler::approve))
        .route("/{id}/reject", delete(handler::reject))
        .route("/{id}/promote", put(handler::promote))
        .route("/{id}/demote", put(handler::demote))
        .layer(middleware::from_fn(require_admin));

    leader_routes.merge(admin_routes)
}
