//! Sector Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, sector};
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{
    AssignLeaderRequest, JoinSectorRequest, Sector, SectorCreate, SectorMemberEntry,
    SectorWithLeader,
};

/// Attempts at generating a non-colliding invite token
const TOKEN_ATTEMPTS: usize = 3;

/// POST /api/sectors - create a sector (admin)
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SectorCreate>,
) -> AppResult<Json<Sector>> {
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;

    // Invite tokens are random; a Duplicate can only be a token
    // collision, so regenerate and retry
    let mut attempt = 1;
    loop {
        let token = shared::util::invite_token();
        match sector::create(&state.pool, &req.name, &token).await {
            Ok(created) => {
                tracing::info!(
                    sector_id = created.id,
                    name = %created.name,
                    operator_id = user.id,
                    "Sector created"
                );
                return Ok(Json(created));
            }
            Err(RepoError::Duplicate(_)) if attempt < TOKEN_ATTEMPTS => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// GET /api/sectors - all sectors with leader and roster size (admin)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<SectorWithLeader>>> {
    let sectors = sector::find_all_with_leader(&state.pool).await?;
    Ok(Json(sectors))
}

/// PUT /api/sectors/{id}/leader - point a sector at a leader (admin)
pub async fn assign_leader(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<AssignLeaderRequest>,
) -> AppResult<Json<Sector>> {
    let updated = sector::assign_leader(&state.pool, id, req.member_id).await?;
    security_log!(
        "INFO",
        "sector_leader_assigned",
        sector_id = id,
        leader_id = req.member_id,
        operator_id = user.id
    );
    Ok(Json(updated))
}

/// GET /api/sectors/{id}/members - sector roster
pub async fn members(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<SectorMemberEntry>>> {
    let target = sector::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Sector {}", id)))?;
    if !user.is_admin() && target.leader_id != Some(user.id) {
        return Err(AppError::forbidden("Not the leader of this sector"));
    }

    let roster = sector::members(&state.pool, id).await?;
    Ok(Json(roster))
}

/// DELETE /api/sectors/{sector_id}/members/{member_id} - drop a member
/// from the roster
pub async fn remove_member(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((sector_id, member_id)): Path<(i64, i64)>,
) -> AppResult<Json<bool>> {
    let target = sector::find_by_id(&state.pool, sector_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Sector {}", sector_id)))?;
    if !user.is_admin() && target.leader_id != Some(user.id) {
        return Err(AppError::forbidden("Not the leader of this sector"));
    }

    sector::remove_member(&state.pool, sector_id, member_id).await?;
    tracing::info!(
        sector_id = sector_id,
        member_id = member_id,
        operator_id = user.id,
        "Member removed from sector"
    );
    Ok(Json(true))
}

/// POST /api/sectors/join - join a sector by invite token
pub async fn join(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<JoinSectorRequest>,
) -> AppResult<Json<Sector>> {
    let target = sector::find_by_invite_token(&state.pool, &req.invite_token)
        .await?
        .ok_or_else(|| AppError::not_found("Unknown invite token"))?;

    sector::add_member(&state.pool, target.id, user.id).await?;

    tracing::info!(
        sector_id = target.id,
        member_id = user.id,
        "Member joined sector"
    );
    Ok(Json(target))
}
