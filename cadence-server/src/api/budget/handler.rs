//! Budget Handlers
//!
//! Admins top up leader budgets; leaders hand points on to members as
//! pre-redeemed transfer records.

use axum::{
    Json,
    extract::{Extension, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{code, member};
use crate::security_log;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};
use shared::models::{AddBudgetRequest, DistributeRequest, Member, RedeemCode};

/// POST /api/budget/distribute - move points from own budget to a member
pub async fn distribute(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<DistributeRequest>,
) -> AppResult<Json<RedeemCode>> {
    if !user.is_leader() {
        return Err(AppError::forbidden("Only leaders hold distributable budget"));
    }
    validate_optional_text(&req.note, "note", MAX_NOTE_LEN)?;

    let transfer =
        code::distribute(&state.pool, user.id, req.member_id, req.points, req.note).await?;

    security_log!(
        "INFO",
        "budget_distributed",
        leader_id = user.id,
        member_id = req.member_id,
        points = req.points
    );
    Ok(Json(transfer))
}

/// POST /api/budget/add - top up a leader's budget (admin)
pub async fn add(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<AddBudgetRequest>,
) -> AppResult<Json<Member>> {
    let updated = member::add_budget(&state.pool, req.member_id, req.points).await?;

    security_log!(
        "INFO",
        "budget_added",
        member_id = req.member_id,
        points = req.points,
        operator_id = user.id
    );
    Ok(Json(updated))
}
