//! Ranking Handlers
//!
//! Month/year query params become a half-open window in the business
//! timezone; without params the leaderboard is all-time.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Datelike;

use crate::core::{Config, ServerState};
use crate::db::repository::sector as sector_repo;
use crate::points::{TimeWindow, ranking};
use crate::utils::time::{month_bounds_millis, year_bounds_millis};
use crate::utils::{AppError, AppResult};
use shared::models::RankingEntry;

#[derive(serde::Deserialize)]
pub struct RankingQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

fn window_from_query(config: &Config, query: &RankingQuery) -> AppResult<Option<TimeWindow>> {
    let tz = config.business_tz();
    let bounds = match (query.month, query.year) {
        (None, None) => return Ok(None),
        (Some(month), Some(year)) => month_bounds_millis(year, month, tz)?,
        (Some(month), None) => {
            // Month without year means the current year in business time
            let year = chrono::Utc::now().with_timezone(&tz).year();
            month_bounds_millis(year, month, tz)?
        }
        (None, Some(year)) => year_bounds_millis(year, tz)?,
    };
    Ok(Some(TimeWindow {
        start: bounds.0,
        end: bounds.1,
    }))
}

/// GET /api/ranking/global?month=&year= - organization leaderboard
pub async fn global(
    State(state): State<ServerState>,
    Query(query): Query<RankingQuery>,
) -> AppResult<Json<Vec<RankingEntry>>> {
    let window = window_from_query(&state.config, &query)?;
    let entries = ranking::rank_global(&state.pool, window).await?;
    Ok(Json(entries))
}

/// GET /api/ranking/sector/{id}?month=&year= - sector leaderboard
pub async fn sector(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<RankingQuery>,
) -> AppResult<Json<Vec<RankingEntry>>> {
    sector_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Sector {}", id)))?;

    let window = window_from_query(&state.config, &query)?;
    let entries = ranking::rank_sector(&state.pool, id, window).await?;
    Ok(Json(entries))
}
