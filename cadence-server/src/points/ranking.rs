//! Ranking Engine
//!
//! Computes totals one candidate at a time through the aggregator and
//! sorts in process. Ties break on ascending member id so repeated
//! calls over the same data always return the same order.

use super::{Scope, TimeWindow, aggregator};
use crate::db::repository::RepoResult;
use shared::models::RankingEntry;
use sqlx::SqlitePool;

/// Organization-wide leaderboard over active non-admin members
pub async fn rank_global(
    pool: &SqlitePool,
    window: Option<TimeWindow>,
) -> RepoResult<Vec<RankingEntry>> {
    let candidates = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, display_name FROM member WHERE status = 'ACTIVE' AND role != 'ADMIN' ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    rank(pool, candidates, Scope::Global, window).await
}

/// Leaderboard over one sector's active roster
pub async fn rank_sector(
    pool: &SqlitePool,
    sector_id: i64,
    window: Option<TimeWindow>,
) -> RepoResult<Vec<RankingEntry>> {
    let candidates = sqlx::query_as::<_, (i64, String)>(
        "SELECT m.id, m.display_name FROM member m JOIN sector_member sm ON sm.member_id = m.id WHERE sm.sector_id = ? AND m.status = 'ACTIVE' ORDER BY m.id",
    )
    .bind(sector_id)
    .fetch_all(pool)
    .await?;
    rank(pool, candidates, Scope::Sector(sector_id), window).await
}

async fn rank(
    pool: &SqlitePool,
    candidates: Vec<(i64, String)>,
    scope: Scope,
    window: Option<TimeWindow>,
) -> RepoResult<Vec<RankingEntry>> {
    let mut entries = Vec::with_capacity(candidates.len());
    for (member_id, display_name) in candidates {
        let total_points = aggregator::calculate_points(pool, member_id, scope, window).await?;
        entries.push(RankingEntry {
            member_id,
            display_name,
            total_points,
        });
    }
    entries.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(a.member_id.cmp(&b.member_id))
    });
    Ok(entries)
}
