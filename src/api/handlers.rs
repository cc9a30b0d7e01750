//! Shared server state, error mapping and the health check

use crate::company::CompanySettings;
use crate::content::{ContentFields, OrderedCollection};
use crate::error::CmsError;
use crate::identity::WebhookVerifier;
use crate::store::RecordStore;
use crate::users::UserManager;
use crate::{AppState, AuthConfig};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub store: Arc<dyn RecordStore>,
    pub company: CompanySettings,
    pub users: UserManager,
    /// None means identity webhooks are refused
    pub webhook_verifier: Option<WebhookVerifier>,
    /// Auth config; None means deny-by-default
    pub auth_config: Option<AuthConfig>,
}

/// Shared CMS state
pub type CmsState = Arc<ServerState>;

impl ServerState {
    /// Wire the access functions over an initialised application state
    pub fn from_app_state(state: &AppState) -> anyhow::Result<Self> {
        let config = &state.config;
        let webhook_verifier = match config.identity.webhook_secret.as_deref() {
            Some(secret) => Some(WebhookVerifier::new(secret)?),
            None => None,
        };
        let users = UserManager::new(
            state.store.clone(),
            state.identity.clone(),
            config.owner_email.clone(),
        )
        .with_invitation_redirect(config.identity.invitation_redirect_url.clone());

        Ok(Self {
            store: state.store.clone(),
            company: CompanySettings::new(state.store.clone()),
            users,
            webhook_verifier,
            auth_config: config.auth_config.clone(),
        })
    }

    /// Access functions for one content collection
    pub fn collection<F: ContentFields>(&self) -> OrderedCollection<F> {
        OrderedCollection::new(self.store.clone())
    }
}

// ============================================================================
// Health check
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub identity_provider: String,
}

/// Health check handler. Verifies connectivity to the record store.
///
/// Returns 200 + `"ok"` when the store answers, 503 + `"unhealthy"` otherwise.
pub async fn health(State(state): State<CmsState>) -> (StatusCode, Json<HealthResponse>) {
    let store_ok = state.store.health_check().await.unwrap_or(false);

    let (http_status, status) = if store_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: if store_ok { "connected" } else { "disconnected" }.to_string(),
            identity_provider: if state.users.has_identity_provider() {
                "configured"
            } else {
                "not_configured"
            }
            .to_string(),
        }),
    )
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// An upstream service (the identity provider) failed
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<CmsError> for AppError {
    fn from(err: CmsError) -> Self {
        match err {
            CmsError::Validation(msg) => AppError::BadRequest(msg),
            e @ CmsError::NotFound { .. } => AppError::NotFound(e.to_string()),
            CmsError::Storage(e) => AppError::Internal(e),
            e @ (CmsError::Mirror { .. } | CmsError::Identity(_)) => {
                AppError::BadGateway(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Collection;
    use uuid::Uuid;

    fn status_of(err: CmsError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_cms_error_status_mapping() {
        assert_eq!(
            status_of(CmsError::validation("title is required")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CmsError::not_found(Collection::Faqs, Uuid::nil())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CmsError::Storage(anyhow::anyhow!("connection refused"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(CmsError::Mirror {
                user_id: Uuid::nil(),
                source: anyhow::anyhow!("503"),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(CmsError::identity(anyhow::anyhow!("timeout"))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_mirror_message_says_role_was_saved() {
        let err = CmsError::Mirror {
            user_id: Uuid::nil(),
            source: anyhow::anyhow!("Clerk metadata update failed (503)"),
        };
        match AppError::from(err) {
            AppError::BadGateway(msg) => {
                assert!(msg.contains("saved locally"), "{}", msg);
                assert!(msg.contains("503"), "{}", msg);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
