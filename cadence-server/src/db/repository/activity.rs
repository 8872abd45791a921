//! Activity Repository

use super::{RepoError, RepoResult, validate_points};
use shared::models::{Activity, ActivityCreate, ActivityModality, AttendanceDetail};
use sqlx::SqlitePool;

const ACTIVITY_SELECT: &str = "SELECT id, title, description, modality, location, scheduled_at, points_value, sector_id, is_global, created_by, created_at FROM activity";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Activity>> {
    let sql = format!("{} WHERE id = ?", ACTIVITY_SELECT);
    let row = sqlx::query_as::<_, Activity>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert an activity with an already-resolved scope
pub async fn create(
    pool: &SqlitePool,
    data: ActivityCreate,
    sector_id: Option<i64>,
    is_global: bool,
    created_by: i64,
) -> RepoResult<Activity> {
    validate_points(data.points_value, "Activity points")?;
    if data.modality == ActivityModality::InPerson
        && data.location.as_deref().unwrap_or("").trim().is_empty()
    {
        return Err(RepoError::Validation(
            "In-person activities require a location".into(),
        ));
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO activity (id, title, description, modality, location, scheduled_at, points_value, sector_id, is_global, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.modality)
    .bind(&data.location)
    .bind(data.scheduled_at)
    .bind(data.points_value)
    .bind(sector_id)
    .bind(is_global)
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create activity".into()))
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Activity>> {
    let sql = format!("{} ORDER BY scheduled_at DESC", ACTIVITY_SELECT);
    let rows = sqlx::query_as::<_, Activity>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Global activities plus those of the member's sectors, newest first
pub async fn find_visible_for_member(
    pool: &SqlitePool,
    member_id: i64,
) -> RepoResult<Vec<Activity>> {
    let sql = format!(
        "{} WHERE is_global = 1 OR sector_id IN (SELECT sector_id FROM sector_member WHERE member_id = ?) ORDER BY scheduled_at DESC",
        ACTIVITY_SELECT
    );
    let rows = sqlx::query_as::<_, Activity>(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Check a member in to an activity
///
/// Sector-scoped activities require roster membership. At most one
/// record per (member, activity); the UNIQUE constraint backs up the
/// pre-check under concurrent check-ins. Returns the points granted.
pub async fn record_attendance(
    pool: &SqlitePool,
    member_id: i64,
    activity_id: i64,
) -> RepoResult<i64> {
    let activity = find_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Activity {activity_id} not found")))?;

    if !activity.is_global
        && let Some(sector_id) = activity.sector_id
        && !super::sector::is_member(pool, sector_id, member_id).await?
    {
        return Err(RepoError::ScopeViolation(format!(
            "Member {member_id} is not in sector {sector_id}"
        )));
    }

    let recorded = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM attendance_record WHERE member_id = ? AND activity_id = ?)",
    )
    .bind(member_id)
    .bind(activity_id)
    .fetch_one(pool)
    .await?;
    if recorded != 0 {
        return Err(RepoError::AlreadyRecorded(format!(
            "Member {member_id} already checked in to activity {activity_id}"
        )));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO attendance_record (id, member_id, activity_id, recorded_at) VALUES (?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(member_id)
    .bind(activity_id)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(e) = result {
        if super::is_unique_violation(&e) {
            return Err(RepoError::AlreadyRecorded(format!(
                "Member {member_id} already checked in to activity {activity_id}"
            )));
        }
        return Err(e.into());
    }

    Ok(activity.points_value)
}

/// Attendance lines for a member summary, newest first
pub async fn attendance_details(
    pool: &SqlitePool,
    member_id: i64,
) -> RepoResult<Vec<AttendanceDetail>> {
    let rows = sqlx::query_as::<_, AttendanceDetail>(
        "SELECT a.id AS activity_id, a.title AS activity_title, a.points_value, a.scheduled_at, ar.recorded_at FROM attendance_record ar JOIN activity a ON ar.activity_id = a.id WHERE ar.member_id = ? ORDER BY ar.recorded_at DESC",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
