//! Database Module
//!
//! SQLite pool setup and embedded migrations. All ledger tables live
//! in one file-backed database under the work directory.

pub mod repository;

use crate::utils::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 5;
/// Wait out write contention instead of failing fast
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Database service — owns the SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open the database at `db_path`, apply pragmas and pending migrations
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(connect_options(db_path)?)
            .await
            .map_err(|e| AppError::database(format!("Cannot open database: {e}")))?;

        sqlx::query(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"))
            .execute(&pool)
            .await
            .map_err(|e| AppError::database(format!("busy_timeout pragma failed: {e}")))?;

        sqlx::migrate!("./migrations")
            .set_ignore_missing(true)
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Migration run failed: {e}")))?;

        tracing::info!(db_path, "SQLite pool ready (WAL), migrations applied");

        Ok(Self { pool })
    }
}

/// WAL so rankings can read while check-ins write; foreign keys on for
/// the roster and ledger references
fn connect_options(db_path: &str) -> Result<SqliteConnectOptions, AppError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
        .map_err(|e| AppError::database(format!("Bad database path: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .pragma("foreign_keys", "ON")
        .optimize_on_close(true, None);
    Ok(options)
}
