//! Company settings API handlers

use super::handlers::{AppError, CmsState};
use crate::auth::AuthUser;
use crate::company::{CompanyInfo, CompanyInfoPatch};
use crate::users::Role;
use axum::{extract::State, Json};

async fn current(state: &CmsState) -> Result<Json<CompanyInfo>, AppError> {
    state
        .company
        .get()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Company settings have not been set up".to_string()))
}

/// Company settings for the public site
pub async fn get_public(State(state): State<CmsState>) -> Result<Json<CompanyInfo>, AppError> {
    current(&state).await
}

pub async fn admin_get(
    State(state): State<CmsState>,
    user: AuthUser,
) -> Result<Json<CompanyInfo>, AppError> {
    user.require(Role::Viewer)?;
    current(&state).await
}

/// Patch the settings, creating them on first use
pub async fn update(
    State(state): State<CmsState>,
    user: AuthUser,
    Json(patch): Json<CompanyInfoPatch>,
) -> Result<Json<CompanyInfo>, AppError> {
    user.require(Role::Editor)?;
    Ok(Json(state.company.update(patch).await?))
}
