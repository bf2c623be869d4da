use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::Result,
    models::task::{Task, TaskCounts},
    repositories::{project as project_repo, task as task_repo},
    state::AppState,
};

/// Number of tasks listed under "recent tasks".
pub const RECENT_TASKS_LIMIT: i64 = 5;

/// Everything the dashboard page shows.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    /// First word of the user's name; empty when unknown.
    pub first_name: String,
    pub project_count: i64,
    pub task_counts: TaskCounts,
    pub recent_tasks: Vec<Task>,
}

/// Builds the dashboard for a user.
///
/// "Today" for overdue tasks is the UTC date of the session clock.
pub async fn summary(state: &AppState, user_id: Uuid) -> Result<DashboardSummary> {
    let first_name = state
        .users
        .find_by_id(user_id)
        .await?
        .map(|user| user.first_name().to_string())
        .unwrap_or_default();

    let today = state.clock.now().date_naive();

    let project_count = project_repo::count_projects(&state.db, user_id).await?;
    let task_counts = task_repo::count_tasks(&state.db, user_id, today).await?;
    let recent_tasks = task_repo::recent_tasks(&state.db, user_id, RECENT_TASKS_LIMIT).await?;

    Ok(DashboardSummary {
        first_name,
        project_count,
        task_counts,
        recent_tasks,
    })
}
