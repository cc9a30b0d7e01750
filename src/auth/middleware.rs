//! Auth middleware for Axum routes.
//!
//! Validates session Bearer tokens and resolves the caller into an
//! [`AuthUser`]. Implements deny-by-default: if `auth_config` is None, all
//! requests are rejected.

use crate::api::handlers::{AppError, CmsState};
use crate::auth::extractor::AuthUser;
use crate::auth::jwt::decode_jwt;
use crate::error::CmsError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware that requires a valid session Bearer token.
///
/// # Behavior
/// 1. If `auth_config` is `None` → 403 Forbidden (deny-by-default)
/// 2. Extract `Authorization: Bearer <token>` header → 401 if missing
/// 3. Validate JWT with the configured secret → 401 if invalid/expired
/// 4. Check `allowed_email_domain` if configured → 403 if domain mismatch
/// 5. Resolve the effective role: the stored user record wins over the
///    token's role claim, which may lag behind an unmirrored change
/// 6. Inject `Claims` and `AuthUser` into request extensions
pub async fn require_auth(
    State(state): State<CmsState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_config = state.auth_config.as_ref().ok_or_else(|| {
        AppError::Forbidden("Authentication not configured, access denied".to_string())
    })?;

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))?;

    let claims = decode_jwt(token, &auth_config.jwt_secret)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    if let Some(ref domain) = auth_config.allowed_email_domain {
        let suffix = format!("@{}", domain.to_lowercase());
        if !claims.email.to_lowercase().ends_with(&suffix) {
            return Err(AppError::Forbidden(format!(
                "Email domain not allowed (expected @{})",
                domain
            )));
        }
    }

    let mut user = AuthUser::from_claims(&claims)?;
    match state.users.get_by_clerk_id(&user.clerk_id).await {
        Ok(stored) => {
            if user.role_claim != Some(stored.role) {
                tracing::debug!(
                    "Role claim of {} is {:?}, using stored role {}",
                    user.clerk_id,
                    user.role_claim,
                    stored.role
                );
            }
            user.role = stored.role;
        }
        // not synced yet; the claim is all there is
        Err(CmsError::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================
