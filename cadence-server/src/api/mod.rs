//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness and DB probe
//! - [`auth`] - registration, login, own profile
//! - [`members`] - membership administration
//! - [`sectors`] - sector management and rosters
//! - [`activities`] - attendance events and check-in
//! - [`codes`] - redeemable codes
//! - [`budget`] - leader budget top-up and distribution
//! - [`ranking`] - leaderboards
//!
//! Each module exposes `router()`; [`app_router`] merges them and
//! applies the auth middleware and HTTP layers.

pub mod auth;
pub mod health;

// Resource APIs
pub mod activities;
pub mod budget;
pub mod codes;
pub mod members;
pub mod ranking;
pub mod sectors;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// Build the full application router
///
/// `require_auth` is applied at router level; it skips the public
/// routes (register, login, health) internally.
pub fn app_router(state: ServerState) -> Router {
    Router::<ServerState>::new()
        .merge(auth::router())
        .merge(health::router())
        .merge(activities::router())
        .merge(budget::router())
        .merge(codes::router())
        .merge(members::router())
        .merge(ranking::router())
        .merge(sectors::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
