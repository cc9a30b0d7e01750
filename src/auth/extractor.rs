//! AuthUser extractor for Axum handlers.
//!
//! Extracts the authenticated user's identity from request extensions
//! (populated by the `require_auth` middleware).

use crate::api::handlers::{AppError, CmsState};
use crate::auth::jwt::Claims;
use crate::users::Role;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Authenticated caller, resolved by `require_auth` from the session claims
/// and the stored user record.
///
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> Result<impl IntoResponse, AppError> {
///     user.require(Role::Editor)?;
///     Ok(format!("Hello, {}!", user.name))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub clerk_id: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    /// Effective role: the stored record's role once synced, else the claim
    /// (a missing or unknown claim counts as viewer)
    pub role: Role,
    /// The role claim exactly as carried by the token
    pub role_claim: Option<Role>,
}

impl AuthUser {
    pub(crate) fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }
        let role_claim = claims.role_claim();
        Ok(Self {
            clerk_id: claims.sub.clone(),
            email: claims.email.clone(),
            name: claims.name.clone(),
            image_url: claims.image_url.clone(),
            role: role_claim.unwrap_or_default(),
            role_claim,
        })
    }

    /// Reject with 403 unless the caller holds at least `required`
    pub fn require(&self, required: Role) -> Result<(), AppError> {
        if self.role.permits(required) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Requires {} role (current: {})",
                required, self.role
            )))
        }
    }
}

impl FromRequestParts<CmsState> for AuthUser {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &CmsState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async {
            parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
                AppError::Unauthorized("Authentication required: no caller in request".to_string())
            })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
