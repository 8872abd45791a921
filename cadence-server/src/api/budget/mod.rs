//! Budget Routes

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::{require_admin, require_leader_or_admin};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/budget", routes())
}

fn routes() -> Router<ServerState> {
    // Distribution is leader-only; the handler narrows out admins
    let leader_routes = Router::new()
        .route("/distribute", post(handler::distribute))
        .layer(middleware::from_fn(require_leader_or_admin));

    let admin_routes = Router::new()
        .route("/add", post(handler::add))
        .layer(middleware::from_fn(require_admin));

    leader_routes.merge(admin_routes)
}
