//! Shared types for the Cadence backend
//!
//! DTOs and row models used by the server and its API clients,
//! plus ID/token generation utilities.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
