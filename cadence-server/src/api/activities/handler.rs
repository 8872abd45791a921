//! Activity Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{activity, sector};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::AppResult;
use shared::models::{Activity, ActivityCreate};

/// POST /api/activities - create an attendance event (leader/admin)
///
/// Scope defaults by role: admins global, leaders their led sector.
/// An explicit `sector_id` pins the scope; `general = true` forces
/// global.
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ActivityCreate>,
) -> AppResult<Json<Activity>> {
    validate_required_text(&req.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&req.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&req.location, "location", MAX_NAME_LEN)?;

    let (sector_id, is_global) =
        sector::resolve_scope(&state.pool, user.id, user.role, req.sector_id, req.general).await?;
    let created = activity::create(&state.pool, req, sector_id, is_global, user.id).await?;

    tracing::info!(
        activity_id = created.id,
        sector_id = created.sector_id,
        is_global = created.is_global,
        created_by = user.id,
        "Activity created"
    );
    Ok(Json(created))
}

/// GET /api/activities - activities visible to the caller
///
/// Admins see everything; other members see global activities plus
/// those of their own sectors.
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Activity>>> {
    let activities = if user.is_admin() {
        activity::find_all(&state.pool).await?
    } else {
        activity::find_visible_for_member(&state.pool, user.id).await?
    };
    Ok(Json(activities))
}

#[derive(serde::Serialize)]
pub struct CheckinResponse {
    pub activity_id: i64,
    pub points_earned: i64,
}

/// POST /api/activities/{id}/checkin - record attendance
pub async fn checkin(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<CheckinResponse>> {
    let points_earned = activity::record_attendance(&state.pool, user.id, id).await?;

    tracing::info!(
        member_id = user.id,
        activity_id = id,
        points = points_earned,
        "Attendance recorded"
    );
    Ok(Json(CheckinResponse {
        activity_id: id,
        points_earned,
    }))
}
