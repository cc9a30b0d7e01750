//! Content API handlers
//!
//! Generic over the collection payload so every ordered collection shares the
//! same list/get/create/update/remove/reorder surface.

use super::handlers::{AppError, CmsState};
use crate::auth::AuthUser;
use crate::content::{ContentFields, Project, ProjectFields, Record};
use crate::users::Role;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

/// Request body for `POST /api/admin/{collection}/reorder`
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

// ============================================================================
// Public reads
// ============================================================================

/// List a collection for the public site
pub async fn list_public<F: ContentFields>(
    State(state): State<CmsState>,
) -> Result<Json<Vec<Record<F>>>, AppError> {
    Ok(Json(state.collection::<F>().list().await?))
}

/// Published projects only
pub async fn list_published_projects(
    State(state): State<CmsState>,
) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(
        state.collection::<ProjectFields>().list_published().await?,
    ))
}

/// A published project by slug; drafts are 404
pub async fn get_published_project(
    State(state): State<CmsState>,
    Path(slug): Path<String>,
) -> Result<Json<Project>, AppError> {
    state
        .collection::<ProjectFields>()
        .get_published_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", slug)))
}

// ============================================================================
// Admin
// ============================================================================

pub async fn admin_list<F: ContentFields>(
    State(state): State<CmsState>,
    user: AuthUser,
) -> Result<Json<Vec<Record<F>>>, AppError> {
    user.require(Role::Viewer)?;
    Ok(Json(state.collection::<F>().list().await?))
}

pub async fn admin_get<F: ContentFields>(
    State(state): State<CmsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Record<F>>, AppError> {
    user.require(Role::Viewer)?;
    Ok(Json(state.collection::<F>().get(id).await?))
}

/// Any project by slug, drafts included
pub async fn admin_get_project_by_slug(
    State(state): State<CmsState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<Json<Project>, AppError> {
    user.require(Role::Viewer)?;
    state
        .collection::<ProjectFields>()
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", slug)))
}

pub async fn create<F: ContentFields>(
    State(state): State<CmsState>,
    user: AuthUser,
    Json(fields): Json<F>,
) -> Result<(StatusCode, Json<Record<F>>), AppError> {
    user.require(Role::Editor)?;
    let record = state.collection::<F>().create(fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<F: ContentFields>(
    State(state): State<CmsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<F::Patch>,
) -> Result<Json<Record<F>>, AppError> {
    user.require(Role::Editor)?;
    Ok(Json(state.collection::<F>().update(id, patch).await?))
}

pub async fn remove<F: ContentFields>(
    State(state): State<CmsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require(Role::Editor)?;
    state.collection::<F>().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rewrite positions from an explicit id sequence; returns the new list
pub async fn reorder<F: ContentFields>(
    State(state): State<CmsState>,
    user: AuthUser,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<Record<F>>>, AppError> {
    user.require(Role::Editor)?;
    let collection = state.collection::<F>();
    collection.reorder(&req.ids).await?;
    Ok(Json(collection.list().await?))
}
