use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::project::Project,
    repositories::project as project_repo,
    state::AppState,
};

/// Creates a new project owned by `user_id`.
pub async fn create_project(
    state: &AppState,
    user_id: Uuid,
    title: String,
    description: String,
) -> Result<Project> {
    let project_id = Uuid::new_v4();

    let project = project_repo::create_project(
        &state.db,
        project_id,
        user_id,
        &title,
        &description,
    )
    .await?;

    tracing::info!("✅ Project created: {} (user {})", project.id, user_id);
    Ok(project)
}

/// Lists the projects of a user.
pub async fn list_projects(state: &AppState, user_id: Uuid) -> Result<Vec<Project>> {
    project_repo::list_projects(&state.db, user_id).await
}

/// Gets one project, or `NotFound` if it does not exist or is not the user's.
pub async fn get_project(state: &AppState, user_id: Uuid, project_id: Uuid) -> Result<Project> {
    project_repo::find_project(&state.db, project_id, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Deletes a project and its tasks.
pub async fn delete_project(state: &AppState, user_id: Uuid, project_id: Uuid) -> Result<()> {
    if !project_repo::delete_project(&state.db, project_id, user_id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("🗑️ Project deleted: {} (user {})", project_id, user_id);
    Ok(())
}
