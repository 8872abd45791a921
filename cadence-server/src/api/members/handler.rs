//! Member Administration Handlers
//!
//! Pending-approval workflow, role transitions, and per-member
//! breakdowns. Route-level guards enforce the role; handlers narrow
//! leaders to members of sectors they lead.

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{activity, code, member, sector};
use crate::points::{self, Scope};
use crate::security_log;
use crate::utils::{AppError, AppResult};
use shared::models::{MemberInfo, MemberSummary, PromoteRequest};

/// GET /api/members - all members (admin)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<MemberInfo>>> {
    let members = member::find_all(&state.pool).await?;
    Ok(Json(members))
}

/// GET /api/members/pending - members awaiting approval
///
/// Admins see every pending member; leaders only those on the rosters
/// of sectors they lead.
pub async fn list_pending(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<MemberInfo>>> {
    let members = if user.is_admin() {
        member::list_pending(&state.pool).await?
    } else {
        member::list_pending_for_leader(&state.pool, user.id).await?
    };
    Ok(Json(members))
}

/// PUT /api/members/{id}/approve - activate a PENDING member (admin)
pub async fn approve(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberInfo>> {
    let approved = member::approve(&state.pool, id).await?;
    security_log!("INFO", "member_approved", member_id = id, operator_id = user.id);
    Ok(Json(approved.into()))
}

/// DELETE /api/members/{id}/reject - delete a PENDING member (admin)
pub async fn reject(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    member::reject(&state.pool, id).await?;
    security_log!("WARN", "member_rejected", member_id = id, operator_id = user.id);
    Ok(Json(true))
}

/// PUT /api/members/{id}/promote - grant LEADER or ADMIN role (admin)
///
/// Promotion forces the member ACTIVE regardless of prior status.
pub async fn promote(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<PromoteRequest>,
) -> AppResult<Json<MemberInfo>> {
    let promoted = member::promote(&state.pool, id, req.role).await?;
    security_log!(
        "INFO",
        "member_promoted",
        member_id = id,
        new_role = format!("{:?}", req.role),
        operator_id = user.id
    );
    Ok(Json(promoted.into()))
}

/// PUT /api/members/{id}/demote - return a member to REGULAR (admin)
pub async fn demote(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberInfo>> {
    let demoted = member::demote(&state.pool, id).await?;
    security_log!("INFO", "member_demoted", member_id = id, operator_id = user.id);
    Ok(Json(demoted.into()))
}

/// GET /api/members/{id}/summary - per-member points breakdown
pub async fn summary(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<MemberSummary>> {
    if !user.is_admin() && !sector::leads_member(&state.pool, user.id, id).await? {
        return Err(AppError::forbidden("Not a leader of this member's sector"));
    }

    let member = member::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", id)))?;

    let total_points = points::calculate_points(&state.pool, id, Scope::Global, None).await?;
    let attendance = activity::attendance_details(&state.pool, id).await?;
    let redemptions = code::redemption_details(&state.pool, id).await?;

    Ok(Json(MemberSummary {
        member: member.into(),
        total_points,
        attendance,
        redemptions,
    }))
}

/// DELETE /api/members/{id} - remove a REGULAR member and their history
pub async fn remove(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !user.is_admin() && !sector::leads_member(&state.pool, user.id, id).await? {
        return Err(AppError::forbidden("Not a leader of this member's sector"));
    }

    member::remove(&state.pool, id).await?;
    security_log!("WARN", "member_removed", member_id = id, operator_id = user.id);
    Ok(Json(true))
}
