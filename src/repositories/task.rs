use chrono::NaiveDate;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::task::{NewTask, Task, TaskChanges, TaskCounts},
};

const TASK_COLUMNS: &str =
    "t.id, t.project_id, t.title, t.description, t.status, t.due_date, t.created_at";

/// Inserts a task into a project owned by `user_id`.
///
/// # Returns
///
/// `None` if the project does not exist or belongs to someone else.
pub async fn create_task(pool: &Pool, id: Uuid, user_id: Uuid, task: &NewTask) -> Result<Option<Task>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            INSERT INTO tasks (id, project_id, title, description, status, due_date)
            SELECT $1::uuid, p.id, $3::varchar, $4::text, $5::task_status, $6::date
            FROM projects p
            WHERE p.id = $2 AND p.user_id = $7
            RETURNING id, project_id, title, description, status, due_date, created_at
            "#,
            &[
                &id,
                &task.project_id,
                &task.title,
                &task.description,
                &task.status,
                &task.due_date,
                &user_id,
            ],
        )
        .await?;
    row.map(|r| Task::try_from(&r)).transpose()
}

/// Lists the tasks of one project in creation order.
pub async fn list_project_tasks(pool: &Pool, project_id: Uuid, user_id: Uuid) -> Result<Vec<Task>> {
    let client = pool.get().await?;
    let query = format!(
        r#"
        SELECT {TASK_COLUMNS}
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE t.project_id = $1 AND p.user_id = $2
        ORDER BY t.created_at ASC, t.id ASC
        "#
    );
    let rows = client.query(query.as_str(), &[&project_id, &user_id]).await?;
    rows.iter().map(Task::try_from).collect()
}

/// The most recently created tasks across all of a user's projects.
pub async fn recent_tasks(pool: &Pool, user_id: Uuid, limit: i64) -> Result<Vec<Task>> {
    let client = pool.get().await?;
    let query = format!(
        r#"
        SELECT {TASK_COLUMNS}
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE p.user_id = $1
        ORDER BY t.created_at DESC, t.id DESC
        LIMIT $2
        "#
    );
    let rows = client.query(query.as_str(), &[&user_id, &limit]).await?;
    rows.iter().map(Task::try_from).collect()
}

/// Applies a partial update to a task owned (through its project) by `user_id`.
pub async fn update_task(
    pool: &Pool,
    task_id: Uuid,
    user_id: Uuid,
    changes: &TaskChanges,
) -> Result<Option<Task>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            UPDATE tasks t
            SET title = COALESCE($3::varchar, t.title),
                description = COALESCE($4::text, t.description),
                status = COALESCE($5::task_status, t.status),
                due_date = COALESCE($6::date, t.due_date)
            FROM projects p
            WHERE t.id = $1 AND p.id = t.project_id AND p.user_id = $2
            RETURNING t.id, t.project_id, t.title, t.description, t.status, t.due_date, t.created_at
            "#,
            &[
                &task_id,
                &user_id,
                &changes.title,
                &changes.description,
                &changes.status,
                &changes.due_date,
            ],
        )
        .await?;
    row.map(|r| Task::try_from(&r)).transpose()
}

/// Deletes a task owned (through its project) by `user_id`.
pub async fn delete_task(pool: &Pool, task_id: Uuid, user_id: Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let deleted = client
        .execute(
            r#"
            DELETE FROM tasks t
            USING projects p
            WHERE t.id = $1 AND p.id = t.project_id AND p.user_id = $2
            "#,
            &[&task_id, &user_id],
        )
        .await?;
    Ok(deleted > 0)
}

/// Aggregate counters over all of a user's tasks.
///
/// A task is overdue when it is still `todo` and its due date is before `today`.
pub async fn count_tasks(pool: &Pool, user_id: Uuid, today: NaiveDate) -> Result<TaskCounts> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE t.status = 'done') AS completed,
                COUNT(*) FILTER (WHERE t.status = 'in-progress') AS in_progress,
                COUNT(*) FILTER (WHERE t.status = 'todo' AND t.due_date < $2) AS overdue
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE p.user_id = $1
            "#,
            &[&user_id, &today],
        )
        .await?;

    Ok(TaskCounts {
        total: row.try_get("total")?,
        completed: row.try_get("completed")?,
        in_progress: row.try_get("in_progress")?,
        overdue: row.try_get("overdue")?,
    })
}
