//! Point Aggregator
//!
//! A member's total is the sum of three disjoint sub-totals: attended
//! activities, redeemed GENERAL codes, and redeemed UNIQUE codes
//! (transfers included). Each source carries its own scope columns, so
//! a global total and the per-sector totals are independent numbers,
//! not a partition of one another.
//!
//! Time filtering uses each source's natural timestamp: the activity's
//! scheduled date for attendance, the code's creation date for both
//! code kinds. Late redemptions therefore land in the code's creation
//! month, a documented approximation.

use super::{Scope, TimeWindow};
use crate::db::repository::RepoResult;
use shared::models::SectorPointsEntry;
use sqlx::SqlitePool;

const ATTENDANCE_SUM: &str = "SELECT COALESCE(SUM(a.points_value), 0) FROM attendance_record ar JOIN activity a ON ar.activity_id = a.id WHERE ar.member_id = ?";
const GENERAL_SUM: &str = "SELECT COALESCE(SUM(c.points_value), 0) FROM general_redemption gr JOIN redeem_code c ON gr.code_id = c.id WHERE gr.member_id = ?";
const UNIQUE_SUM: &str = "SELECT COALESCE(SUM(c.points_value), 0) FROM redeem_code c WHERE c.assigned_member_id = ? AND c.is_redeemed = 1";

/// Total points for a member within a scope and optional time window
pub async fn calculate_points(
    pool: &SqlitePool,
    member_id: i64,
    scope: Scope,
    window: Option<TimeWindow>,
) -> RepoResult<i64> {
    let attendance =
        subtotal(pool, ATTENDANCE_SUM, "a", "scheduled_at", member_id, scope, window).await?;
    let general = subtotal(pool, GENERAL_SUM, "c", "created_at", member_id, scope, window).await?;
    let unique = subtotal(pool, UNIQUE_SUM, "c", "created_at", member_id, scope, window).await?;
    Ok(attendance + general + unique)
}

/// All-time per-sector totals for every sector the member belongs to
pub async fn sector_breakdown(
    pool: &SqlitePool,
    member_id: i64,
) -> RepoResult<Vec<SectorPointsEntry>> {
    let sectors = sqlx::query_as::<_, (i64, String)>(
        "SELECT s.id, s.name FROM sector s JOIN sector_member sm ON sm.sector_id = s.id WHERE sm.member_id = ? ORDER BY s.name",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(sectors.len());
    for (sector_id, sector_name) in sectors {
        let points = calculate_points(pool, member_id, Scope::Sector(sector_id), None).await?;
        entries.push(SectorPointsEntry {
            sector_id,
            sector_name,
            points,
        });
    }
    Ok(entries)
}

async fn subtotal(
    pool: &SqlitePool,
    base: &str,
    alias: &str,
    time_column: &str,
    member_id: i64,
    scope: Scope,
    window: Option<TimeWindow>,
) -> RepoResult<i64> {
    let mut sql = String::from(base);
    match scope {
        Scope::Global => {
            sql.push_str(&format!(" AND {alias}.is_global = 1"));
        }
        Scope::Sector(_) => {
            sql.push_str(&format!(" AND {alias}.sector_id = ?"));
        }
    }
    if window.is_some() {
        sql.push_str(&format!(
            " AND {alias}.{time_column} >= ? AND {alias}.{time_column} < ?"
        ));
    }

    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(member_id);
    if let Scope::Sector(sector_id) = scope {
        query = query.bind(sector_id);
    }
    if let Some(window) = window {
        query = query.bind(window.start).bind(window.end);
    }

    Ok(query.fetch_one(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE sector (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                invite_token TEXT NOT NULL UNIQUE,
                leader_id INTEGER,
                created_at INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE sector_member (
                id INTEGER PRIMARY KEY,
                sector_id INTEGER NOT NULL,
                member_id INTEGER NOT NULL,
                joined_at INTEGER NOT NULL DEFAULT 0,
                UNIQUE(member_id, sector_id)
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE activity (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                modality TEXT NOT NULL,
                location TEXT,
                scheduled_at INTEGER NOT NULL,
                points_value INTEGER NOT NULL,
                sector_id INTEGER,
                is_global INTEGER NOT NULL DEFAULT 0,
                created_by INTEGER NOT NULL,
                created_at INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE attendance_record (
                id INTEGER PRIMARY KEY,
                member_id INTEGER NOT NULL,
                activity_id INTEGER NOT NULL,
                recorded_at INTEGER NOT NULL DEFAULT 0,
                UNIQUE(member_id, activity_id)
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE redeem_code (
                id INTEGER PRIMARY KEY,
                token TEXT NOT NULL UNIQUE,
                points_value INTEGER NOT NULL,
                kind TEXT NOT NULL,
                is_redeemed INTEGER NOT NULL DEFAULT 0,
                redeemed_at INTEGER,
                sector_id INTEGER,
                is_global INTEGER NOT NULL DEFAULT 0,
                assigned_member_id INTEGER,
                origin TEXT NOT NULL DEFAULT 'CODE',
                note TEXT,
                created_by INTEGER NOT NULL,
                created_at INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE general_redemption (
                id INTEGER PRIMARY KEY,
                member_id INTEGER NOT NULL,
                code_id INTEGER NOT NULL,
                redeemed_at INTEGER NOT NULL DEFAULT 0,
                UNIQUE(member_id, code_id)
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    async fn grant_attendance(
        pool: &SqlitePool,
        member_id: i64,
        activity_id: i64,
        points: i64,
        sector_id: Option<i64>,
        is_global: bool,
        scheduled_at: i64,
    ) {
        sqlx::query("INSERT INTO activity (id, title, modality, scheduled_at, points_value, sector_id, is_global, created_by) VALUES (?, 'A', 'REMOTE', ?, ?, ?, ?, 1)")
            .bind(activity_id)
            .bind(scheduled_at)
            .bind(points)
            .bind(sector_id)
            .bind(is_global)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO attendance_record (member_id, activity_id) VALUES (?, ?)")
            .bind(member_id)
            .bind(activity_id)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn grant_general(
        pool: &SqlitePool,
        member_id: i64,
        code_id: i64,
        points: i64,
        sector_id: Option<i64>,
        is_global: bool,
        created_at: i64,
    ) {
        sqlx::query("INSERT INTO redeem_code (id, token, points_value, kind, sector_id, is_global, created_by, created_at) VALUES (?, ?, ?, 'GENERAL', ?, ?, 1, ?)")
            .bind(code_id)
            .bind(format!("G{code_id}"))
            .bind(points)
            .bind(sector_id)
            .bind(is_global)
            .bind(created_at)
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO general_redemption (member_id, code_id) VALUES (?, ?)")
            .bind(member_id)
            .bind(code_id)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn grant_unique(
        pool: &SqlitePool,
        member_id: i64,
        code_id: i64,
        points: i64,
        sector_id: Option<i64>,
        is_global: bool,
        redeemed: bool,
        created_at: i64,
    ) {
        sqlx::query("INSERT INTO redeem_code (id, token, points_value, kind, is_redeemed, sector_id, is_global, assigned_member_id, created_by, created_at) VALUES (?, ?, ?, 'UNIQUE', ?, ?, ?, ?, 1, ?)")
            .bind(code_id)
            .bind(format!("U{code_id}"))
            .bind(points)
            .bind(redeemed)
            .bind(sector_id)
            .bind(is_global)
            .bind(member_id)
            .bind(created_at)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sums_three_sources() {
        let pool = test_pool().await;
        grant_attendance(&pool, 2, 100, 10, None, true, 1000).await;
        grant_general(&pool, 2, 200, 25, None, true, 1000).await;
        grant_unique(&pool, 2, 300, 40, None, true, true, 1000).await;
        // Unredeemed UNIQUE codes grant nothing
        grant_unique(&pool, 2, 301, 99, None, true, false, 1000).await;

        let total = calculate_points(&pool, 2, Scope::Global, None).await.unwrap();
        assert_eq!(total, 75);
    }

    #[tokio::test]
    async fn test_member_with_no_history_totals_zero() {
        let pool = test_pool().await;
        let total = calculate_points(&pool, 7, Scope::Global, None).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_global_and_sector_are_independent() {
        let pool = test_pool().await;
        // Sector-scoped attendance counts for the sector, not globally
        grant_attendance(&pool, 2, 100, 10, Some(10), false, 1000).await;
        // Global transfer counts globally, not for any sector
        grant_unique(&pool, 2, 300, 20, None, true, true, 1000).await;

        let global = calculate_points(&pool, 2, Scope::Global, None).await.unwrap();
        let sector = calculate_points(&pool, 2, Scope::Sector(10), None).await.unwrap();
        assert_eq!(global, 20);
        assert_eq!(sector, 10);
    }

    #[tokio::test]
    async fn test_other_sectors_do_not_leak() {
        let pool = test_pool().await;
        grant_attendance(&pool, 2, 100, 10, Some(10), false, 1000).await;
        grant_general(&pool, 2, 200, 25, Some(11), false, 1000).await;

        assert_eq!(
            calculate_points(&pool, 2, Scope::Sector(10), None).await.unwrap(),
            10
        );
        assert_eq!(
            calculate_points(&pool, 2, Scope::Sector(11), None).await.unwrap(),
            25
        );
    }

    #[tokio::test]
    async fn test_window_filters_each_source_by_its_own_timestamp() {
        let pool = test_pool().await;
        let window = TimeWindow { start: 1000, end: 2000 };

        grant_attendance(&pool, 2, 100, 10, None, true, 1500).await;
        grant_attendance(&pool, 2, 101, 10, None, true, 2000).await; // end is exclusive
        grant_general(&pool, 2, 200, 25, None, true, 1999).await;
        grant_general(&pool, 2, 201, 25, None, true, 999).await;
        grant_unique(&pool, 2, 300, 40, None, true, true, 1000).await; // start is inclusive
        grant_unique(&pool, 2, 301, 40, None, true, true, 2500).await;

        let total = calculate_points(&pool, 2, Scope::Global, Some(window)).await.unwrap();
        assert_eq!(total, 75);
    }

    #[tokio::test]
    async fn test_sector_breakdown_lists_each_membership() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO sector (id, name, invite_token) VALUES (10, 'Ops', 'T1'), (11, 'Art', 'T2')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sector_member (sector_id, member_id) VALUES (10, 2), (11, 2)")
            .execute(&pool)
            .await
            .unwrap();
        grant_attendance(&pool, 2, 100, 10, Some(10), false, 1000).await;

        let breakdown = sector_breakdown(&pool, 2).await.unwrap();
        assert_eq!(breakdown.len(), 2);
        // Ordered by sector name
        assert_eq!(breakdown[0].sector_name, "Art");
        assert_eq!(breakdown[0].points, 0);
        assert_eq!(breakdown[1].sector_name, "Ops");
        assert_eq!(breakdown[1].points, 10);
    }
}
