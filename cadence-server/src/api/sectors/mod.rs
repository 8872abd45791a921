//! Sector Routes

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{require_admin, require_leader_or_admin};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sectors", routes())
}

fn routes() -> Router<ServerState> {
    // Any authenticated member may join with an invite token
    let member_routes = Router::new().route("/join", post(handler::join));

    // Roster routes; handlers narrow leaders to sectors they lead
    let leader_routes = Router::new()
        .route("/{id}/members", get(handler::members))
        .route(
            "/{sector_id}/members/{member_id}",
            delete(handler::remove_member),
        )
        .layer(middleware::from_fn(require_leader_or_admin));

    let admin_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}/leader", put(handler::assign_leader))
        .layer(middleware::from_fn(require_admin));

    member_routes.merge(leader_routes).merge(admin_routes)
}
