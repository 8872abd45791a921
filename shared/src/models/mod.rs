//! Data models
//!
//! Shared between cadence-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps Unix millis.

pub mod activity;
pub mod code;
pub mod member;
pub mod ranking;
pub mod sector;

// Re-exports
pub use activity::*;
pub use code::*;
pub use member::*;
pub use ranking::*;
pub use sector::*;
