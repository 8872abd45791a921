//! Cadence Server - attendance & reward-points backend
//!
//! # Module structure
//!
//! ```text
//! cadence-server/src/
//! ├── core/          # Config, state, server
//! ├── auth/          # JWT auth, role guards, passwords
//! ├── api/           # HTTP routes and handlers
//! ├── points/        # Point aggregation and rankings
//! ├── db/            # SQLite pool and repositories
//! └── utils/         # Errors, logging, time, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod points;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Prepare the process environment: dotenv, work dir, logging.
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
    std::fs::create_dir_all(&work_dir)?;

    let log_dir = format!("{work_dir}/logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_json = std::env::var("LOG_JSON").ok().and_then(|v| v.parse().ok());
    let log_to_file = std::env::var("LOG_TO_FILE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    if log_to_file {
        init_logger_with_file(log_level.as_deref(), log_json, Some(&log_dir));
    } else {
        init_logger_with_file(log_level.as_deref(), log_json, None);
    }

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______          __
  / ____/___ _____/ /__  ____  ________
 / /   / __ `/ __  / _ \/ __ \/ ___/ _ \
/ /___/ /_/ / /_/ /  __/ / / / /__/  __/
\____/\__,_/\__,_/\___/_/ /_/\___/\___/
    "#
    );
}
