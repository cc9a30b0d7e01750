//! User API handlers: the caller's own record and admin user management

use super::handlers::{AppError, CmsState};
use crate::auth::AuthUser;
use crate::users::{InviteOutcome, Role, RoleChange, SyncUser, User};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response of `POST /api/me/sync`
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub user: User,
    /// Whether the stored role had to be pushed back to the provider
    pub role_mirrored: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// The caller's user record
pub async fn me(State(state): State<CmsState>, user: AuthUser) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get_by_clerk_id(&user.clerk_id).await?))
}

/// Create or refresh the caller's record from their session claims.
///
/// The token's role claim seeds the role of a new record only; for a known
/// user the stored role stands and is pushed back if the claim disagrees.
pub async fn sync_me(
    State(state): State<CmsState>,
    user: AuthUser,
) -> Result<Json<SyncResponse>, AppError> {
    let (user_record, role_mirrored) = state
        .users
        .sync_with_claim(
            SyncUser {
                clerk_id: user.clerk_id,
                email: user.email,
                name: user.name,
                image_url: user.image_url,
                role: None,
            },
            user.role_claim,
        )
        .await?;

    Ok(Json(SyncResponse {
        user: user_record,
        role_mirrored,
    }))
}

pub async fn list_users(
    State(state): State<CmsState>,
    user: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    user.require(Role::Admin)?;
    Ok(Json(state.users.list().await?))
}

pub async fn update_role(
    State(state): State<CmsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<RoleChange>, AppError> {
    user.require(Role::Admin)?;
    Ok(Json(state.users.update_role(id, req.role).await?))
}

pub async fn invite(
    State(state): State<CmsState>,
    user: AuthUser,
    Json(req): Json<InviteRequest>,
) -> Result<(StatusCode, Json<InviteOutcome>), AppError> {
    user.require(Role::Admin)?;
    let outcome = state.users.invite(&req.email, req.role).await?;
    let status = match outcome {
        InviteOutcome::Invited { .. } => StatusCode::CREATED,
        InviteOutcome::ExistingAccount { .. } => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

pub async fn resync(
    State(state): State<CmsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    user.require(Role::Admin)?;
    Ok(Json(state.users.resync_from_provider(id).await?))
}

pub async fn remove_user(
    State(state): State<CmsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require(Role::Admin)?;
    state.users.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
