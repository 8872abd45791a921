//! Authentication middleware
//!
//! Axum middleware for JWT authentication and role checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppError;
use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::db::repository::member;
use crate::security_log;
use shared::models::MemberStatus;

/// Authentication middleware - requires a logged-in member
///
/// Extracts and validates the JWT from the `Authorization: Bearer <token>`
/// header, loads the member row and injects [`CurrentUser`] into request
/// extensions (`req.extensions_mut().insert(user)`). The member row is read
/// fresh on every request so role and status changes apply immediately.
///
/// # Paths that skip authentication
///
/// - `OPTIONS *` (CORS preflight)
/// - non-`/api/` paths
/// - `/api/auth/login`, `/api/auth/register`
/// - `/api/health` and below
///
/// # Errors
///
/// | Case | HTTP status |
/// |------|-------------|
/// | Missing Authorization header | 401 Unauthorized |
/// | Expired token | 401 TokenExpired |
/// | Invalid token / unknown member | 401 InvalidToken |
/// | PENDING member | 403 Forbidden |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // Allow CORS preflight OPTIONS requests through
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes skip auth (let them 404 normally)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // Public API routes skip auth
    let is_public_api_route = path == "/api/auth/login"
        || path == "/api/auth/register"
        || path == "/api/health"
        || path.starts_with("/api/health/");
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    let claims = match jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            return match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            };
        }
    };

    let member_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Invalid token"))?;

    let member = member::find_by_id(&state.pool, member_id).await?;
    let member = match member {
        Some(m) => m,
        None => {
            security_log!("WARN", "auth_unknown_member", member_id = member_id);
            return Err(AppError::invalid_token("Invalid token"));
        }
    };

    // PENDING members stay locked out until a leader approves them
    if member.status == MemberStatus::Pending {
        security_log!(
            "WARN",
            "auth_pending_member",
            member_id = member_id,
            email = member.email.clone()
        );
        return Err(AppError::forbidden("Account pending approval"));
    }

    req.extensions_mut().insert(CurrentUser::from(member));
    Ok(next.run(req).await)
}

/// Admin middleware - requires the ADMIN role
///
/// # Errors
///
/// Non-admins get 403 Forbidden
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id,
            email = user.email.clone()
        );
        return Err(AppError::forbidden("Administrator access required"));
    }

    Ok(next.run(req).await)
}

/// Role middleware - requires the LEADER or ADMIN role
///
/// # Errors
///
/// Regular members get 403 Forbidden
pub async fn require_leader_or_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_admin() && !user.is_leader() {
        security_log!(
            "WARN",
            "leader_required",
            user_id = user.id,
            email = user.email.clone()
        );
        return Err(AppError::forbidden("Leader access required"));
    }

    Ok(next.run(req).await)
}
