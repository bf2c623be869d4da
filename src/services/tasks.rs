use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::task::{Board, NewTask, Task, TaskChanges},
    repositories::{project as project_repo, task as task_repo},
    state::AppState,
};

/// Creates a task in one of the user's projects.
pub async fn create_task(state: &AppState, user_id: Uuid, task: NewTask) -> Result<Task> {
    let task_id = Uuid::new_v4();

    let task = task_repo::create_task(&state.db, task_id, user_id, &task)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("✅ Task created: {} in project {}", task.id, task.project_id);
    Ok(task)
}

/// Lists a project's tasks, or `NotFound` if the project is not the user's.
pub async fn list_project_tasks(state: &AppState, user_id: Uuid, project_id: Uuid) -> Result<Vec<Task>> {
    project_repo::find_project(&state.db, project_id, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    task_repo::list_project_tasks(&state.db, project_id, user_id).await
}

/// The kanban board of a project.
pub async fn project_board(state: &AppState, user_id: Uuid, project_id: Uuid) -> Result<Board> {
    let tasks = list_project_tasks(state, user_id, project_id).await?;
    Ok(Board::from_tasks(tasks))
}

/// Applies a partial update, such as a status change from the board.
pub async fn update_task(
    state: &AppState,
    user_id: Uuid,
    task_id: Uuid,
    changes: TaskChanges,
) -> Result<Task> {
    let task = task_repo::update_task(&state.db, task_id, user_id, &changes)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::debug!("✏️ Task updated: {} (status {:?})", task.id, task.status);
    Ok(task)
}

/// Deletes one of the user's tasks.
pub async fn delete_task(state: &AppState, user_id: Uuid, task_id: Uuid) -> Result<()> {
    if !task_repo::delete_task(&state.db, task_id, user_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️ Task deleted: {}", task_id);
    Ok(())
}
