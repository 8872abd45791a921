//! Activity Routes

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_leader_or_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/activities", routes())
}

fn routes() -> Router<ServerState> {
    let member_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/checkin", post(handler::checkin));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_leader_or_admin));

    member_routes.merge(manage_routes)
}
