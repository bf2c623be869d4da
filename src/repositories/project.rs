use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{error::Result, models::project::Project};

/// Creates a new project in the database.
pub async fn create_project(
    pool: &Pool,
    id: Uuid,
    user_id: Uuid,
    title: &str,
    description: &str,
) -> Result<Project> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO projects (id, user_id, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, created_at
            "#,
            &[&id, &user_id, &title, &description],
        )
        .await?;
    Project::try_from(&row)
}

/// Lists the projects owned by a user, newest first.
pub async fn list_projects(pool: &Pool, user_id: Uuid) -> Result<Vec<Project>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, user_id, title, description, created_at
            FROM projects
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
            &[&user_id],
        )
        .await?;
    rows.iter().map(Project::try_from).collect()
}

/// Finds a project if it belongs to `user_id`.
pub async fn find_project(pool: &Pool, project_id: Uuid, user_id: Uuid) -> Result<Option<Project>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, user_id, title, description, created_at
            FROM projects
            WHERE id = $1 AND user_id = $2
            "#,
            &[&project_id, &user_id],
        )
        .await?;
    row.map(|r| Project::try_from(&r)).transpose()
}

/// Counts the projects owned by a user.
pub async fn count_projects(pool: &Pool, user_id: Uuid) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            "SELECT COUNT(*) AS count FROM projects WHERE user_id = $1",
            &[&user_id],
        )
        .await?;
    Ok(row.try_get("count")?)
}

/// Deletes a project and, through the foreign key, its tasks.
///
/// # Returns
///
/// `true` if a project owned by `user_id` was deleted.
pub async fn delete_project(pool: &Pool, project_id: Uuid, user_id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let deleted = client
        .execute(
            "DELETE FROM projects WHERE id = $1 AND user_id = $2",
            &[&project_id, &user_id],
        )
        .await?;
    Ok(deleted > 0)
}
