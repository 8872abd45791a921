//! Authentication Handlers
//!
//! Registration, login, and the member's own profile.

use std::time::Duration;

use axum::{
    Json,
    extract::{Extension, State},
};

use crate::auth::{CurrentUser, hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::{member, sector};
use crate::points::{self, Scope};
use crate::security_log;
use crate::utils::validation::{
    MAX_NAME_LEN, validate_email, validate_password, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{
    LoginRequest, LoginResponse, MemberCreate, MemberInfo, MemberProfile, MemberRole, MemberStatus,
    MemberUpdate, RegisterRequest,
};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// POST /api/auth/register - create a member account
///
/// The very first account bootstraps the organization as an ACTIVE
/// admin, no invite needed. Every later registration requires a sector
/// invite token and lands as a PENDING regular on that sector's roster.
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<MemberInfo>> {
    validate_email(&req.email)?;
    validate_required_text(&req.display_name, "display_name", MAX_NAME_LEN)?;
    validate_password(&req.password)?;

    let hash_pass = hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;

    if member::count_all(&state.pool).await? == 0 {
        let admin = member::create(
            &state.pool,
            MemberCreate {
                email: req.email,
                display_name: req.display_name,
                hash_pass,
                role: MemberRole::Admin,
                status: MemberStatus::Active,
            },
        )
        .await?;

        security_log!("INFO", "founding_admin_created", member_id = admin.id);
        tracing::info!(member_id = admin.id, "Founding admin registered");
        return Ok(Json(admin.into()));
    }

    let token = req.invite_token.as_deref().unwrap_or_default();
    if token.is_empty() {
        return Err(AppError::validation("invite_token is required"));
    }
    let target_sector = sector::find_by_invite_token(&state.pool, token)
        .await?
        .ok_or_else(|| AppError::not_found("Unknown invite token"))?;

    let created = member::create(
        &state.pool,
        MemberCreate {
            email: req.email,
            display_name: req.display_name,
            hash_pass,
            role: MemberRole::Regular,
            status: MemberStatus::Pending,
        },
    )
    .await?;
    sector::add_member(&state.pool, target_sector.id, created.id).await?;

    tracing::info!(
        member_id = created.id,
        sector_id = target_sector.id,
        "Member registered, pending approval"
    );
    Ok(Json(created.into()))
}

/// POST /api/auth/login - authenticate and issue a JWT
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let found = member::find_by_email(&state.pool, &req.email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent email enumeration
    let member = match found {
        Some(m) => {
            let password_valid = verify_password(&req.password, &m.hash_pass)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
            if !password_valid {
                security_log!(
                    "WARN",
                    "login_failed",
                    email = req.email.clone(),
                    reason = "invalid_credentials"
                );
                tracing::warn!(email = %req.email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }
            m
        }
        None => {
            security_log!(
                "WARN",
                "login_failed",
                email = req.email.clone(),
                reason = "unknown_email"
            );
            tracing::warn!(email = %req.email, "Login failed - unknown email");
            return Err(AppError::invalid_credentials());
        }
    };

    if member.status == MemberStatus::Pending {
        security_log!("WARN", "login_pending_member", member_id = member.id);
        return Err(AppError::forbidden("Account pending approval"));
    }

    let token = state
        .get_jwt_service()
        .generate_token(member.id, &member.email, &member.display_name, member.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(member_id = member.id, email = %member.email, "Member logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.config.jwt.expiration_minutes * 60,
        member: member.into(),
    }))
}

/// GET /api/auth/me - own profile with points breakdown
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<MemberProfile>> {
    let member = member::find_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", user.id)))?;

    let total_points = points::calculate_points(&state.pool, user.id, Scope::Global, None).await?;
    let sectors = points::sector_breakdown(&state.pool, user.id).await?;

    Ok(Json(MemberProfile {
        member: member.into(),
        total_points,
        sectors,
    }))
}

/// PUT /api/auth/me - update own display name and/or password
pub async fn update_me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<MemberUpdate>,
) -> AppResult<Json<MemberInfo>> {
    if req.display_name.is_none() && req.password.is_none() {
        return Err(AppError::validation("Nothing to update"));
    }
    if let Some(name) = &req.display_name {
        validate_required_text(name, "display_name", MAX_NAME_LEN)?;
    }
    let hash_pass = match &req.password {
        Some(password) => {
            validate_password(password)?;
            let hashed = hash_password(password)
                .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;
            Some(hashed)
        }
        None => None,
    };

    let updated = member::update_profile(&state.pool, user.id, req.display_name, hash_pass).await?;

    tracing::info!(member_id = user.id, "Profile updated");
    Ok(Json(updated.into()))
}
