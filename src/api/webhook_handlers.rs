//! Identity provider webhook endpoint

use super::handlers::{AppError, CmsState};
use crate::identity::IdentityEvent;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

/// Verify, parse and apply a user lifecycle event.
///
/// Refused with 403 when no signing secret is configured.
pub async fn identity_webhook(
    State(state): State<CmsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let verifier = state.webhook_verifier.as_ref().ok_or_else(|| {
        AppError::Forbidden("Identity webhooks are not configured".to_string())
    })?;

    verifier.verify(&headers, &body).map_err(|e| {
        tracing::warn!("Rejected identity webhook: {}", e);
        AppError::Unauthorized(e.to_string())
    })?;

    let event = IdentityEvent::parse(&body)
        .map_err(|e| AppError::BadRequest(format!("{:#}", e)))?;
    tracing::debug!("Identity webhook: {:?}", event);

    state.users.apply_identity_event(event).await?;
    Ok(StatusCode::NO_CONTENT)
}
