use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    middleware_layer::auth::CurrentUser,
    services::{projects as project_service, tasks as task_service},
    state::AppState,
    validation::forms::{JsonBody, validate},
};

/// The body returned by deletions.
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// The request payload for creating a project.
#[derive(Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[garde(length(min = 1, max = 255))]
    pub title: String,
    #[garde(length(min = 1, max = 1000))]
    pub description: String,
}

/// Creates a new project.
#[axum::debug_handler]
pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    JsonBody(mut req): JsonBody<CreateProjectRequest>,
) -> Result<Response> {
    req.title = req.title.trim().to_string();
    req.description = req.description.trim().to_string();
    validate(&req)?;

    let project =
        project_service::create_project(&state, session.user_id, req.title, req.description)
            .await?;

    Ok((StatusCode::CREATED, Json(project)).into_response())
}

/// Lists the caller's projects.
#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Response> {
    let projects = project_service::list_projects(&state, session.user_id).await?;
    Ok(Json(projects).into_response())
}

/// Gets one of the caller's projects.
#[axum::debug_handler]
pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<Response> {
    let project = project_service::get_project(&state, session.user_id, project_id).await?;
    Ok(Json(project).into_response())
}

/// Deletes one of the caller's projects with its tasks.
#[axum::debug_handler]
pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<Response> {
    project_service::delete_project(&state, session.user_id, project_id).await?;
    Ok(Json(SuccessResponse { success: true }).into_response())
}

/// The kanban board of one of the caller's projects.
#[axum::debug_handler]
pub async fn project_board(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<Response> {
    let board = task_service::project_board(&state, session.user_id, project_id).await?;
    Ok(Json(board).into_response())
}
