//! Ranking Routes

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/ranking", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/global", get(handler::global))
        .route("/sector/{id}", get(handler::sector))
}
