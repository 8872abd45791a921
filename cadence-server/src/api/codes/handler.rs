//! Redeem Code Handlers

use axum::{
    Json,
    extract::{Extension, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, code, sector};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::AppResult;
use shared::models::{CodeCreate, RedeemCode, RedeemRequest};

/// Attempts at generating a non-colliding code token
const TOKEN_ATTEMPTS: usize = 3;

/// POST /api/codes - create a redeem code (leader/admin)
///
/// Scope resolution matches activities. UNIQUE codes need an assignee,
/// GENERAL codes must not have one.
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CodeCreate>,
) -> AppResult<Json<RedeemCode>> {
    validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;

    let (sector_id, is_global) =
        sector::resolve_scope(&state.pool, user.id, user.role, req.sector_id, req.general).await?;

    let mut attempt = 1;
    loop {
        let token = shared::util::code_token();
        match code::create(
            &state.pool,
            req.clone(),
            &token,
            sector_id,
            is_global,
            user.id,
        )
        .await
        {
            Ok(created) => {
                tracing::info!(
                    code_id = created.id,
                    kind = format!("{:?}", created.kind),
                    sector_id = created.sector_id,
                    is_global = created.is_global,
                    created_by = user.id,
                    "Redeem code created"
                );
                return Ok(Json(created));
            }
            Err(RepoError::Duplicate(_)) if attempt < TOKEN_ATTEMPTS => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// GET /api/codes - codes created by the caller (leader/admin)
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<RedeemCode>>> {
    let codes = code::list_by_creator(&state.pool, user.id).await?;
    Ok(Json(codes))
}

#[derive(serde::Serialize)]
pub struct RedeemResponse {
    pub points_earned: i64,
}

/// POST /api/codes/redeem - redeem a code by token
pub async fn redeem(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<RedeemRequest>,
) -> AppResult<Json<RedeemResponse>> {
    let points_earned = code::redeem(&state.pool, user.id, &req.token).await?;

    tracing::info!(
        member_id = user.id,
        points = points_earned,
        "Code redeemed"
    );
    Ok(Json(RedeemResponse { points_earned }))
}
