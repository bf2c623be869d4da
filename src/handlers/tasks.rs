use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use garde::Validate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    handlers::projects::SuccessResponse,
    middleware_layer::auth::CurrentUser,
    models::task::{NewTask, TaskChanges, TaskStatus},
    services::tasks as task_service,
    state::AppState,
    validation::forms::{JsonBody, validate},
};

/// The request payload for creating a task.
#[derive(Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[garde(skip)]
    pub project_id: Uuid,
    #[garde(length(min = 1, max = 255))]
    pub title: String,
    #[garde(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub status: TaskStatus,
    #[garde(skip)]
    pub due_date: Option<NaiveDate>,
}

/// The request payload for updating a task. Absent fields are left as they are.
#[derive(Deserialize, Validate, Default)]
pub struct UpdateTaskRequest {
    #[garde(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[garde(length(max = 1000))]
    pub description: Option<String>,
    #[garde(skip)]
    pub status: Option<TaskStatus>,
    #[garde(skip)]
    pub due_date: Option<NaiveDate>,
}

/// The query parameters for listing tasks.
#[derive(Deserialize)]
pub struct ListTasksQuery {
    pub project_id: Option<Uuid>,
}

/// Creates a task in one of the caller's projects.
#[axum::debug_handler]
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    JsonBody(mut req): JsonBody<CreateTaskRequest>,
) -> Result<Response> {
    req.title = req.title.trim().to_string();
    validate(&req)?;

    let task = task_service::create_task(
        &state,
        session.user_id,
        NewTask {
            project_id: req.project_id,
            title: req.title,
            description: req.description.filter(|d| !d.trim().is_empty()),
            status: req.status,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)).into_response())
}

/// Lists the tasks of one of the caller's projects.
#[axum::debug_handler]
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Response> {
    let project_id = query
        .project_id
        .ok_or_else(|| AppError::validation("Project ID is required"))?;

    let tasks = task_service::list_project_tasks(&state, session.user_id, project_id).await?;
    Ok(Json(tasks).into_response())
}

/// Updates a task. Dragging a card between board columns sends only `status`.
#[axum::debug_handler]
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(task_id): Path<Uuid>,
    JsonBody(mut req): JsonBody<UpdateTaskRequest>,
) -> Result<Response> {
    req.title = req.title.map(|t| t.trim().to_string());
    validate(&req)?;

    let task = task_service::update_task(
        &state,
        session.user_id,
        task_id,
        TaskChanges {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok(Json(task).into_response())
}

/// Deletes one of the caller's tasks.
#[axum::debug_handler]
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(task_id): Path<Uuid>,
) -> Result<Response> {
    task_service::delete_task(&state, session.user_id, task_id).await?;
    Ok(Json(SuccessResponse { success: true }).into_response())
}
