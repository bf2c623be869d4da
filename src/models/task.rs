use chrono::{DateTime, NaiveDate, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Workflow state of a task, and the kanban column it sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "task_status")]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo")]
    #[postgres(name = "todo")]
    Todo,
    #[serde(rename = "in-progress")]
    #[postgres(name = "in-progress")]
    InProgress,
    #[serde(rename = "done")]
    #[postgres(name = "done")]
    Done,
}

/// Represents a task in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// The unique identifier for the task.
    pub id: Uuid,
    /// The project the task belongs to.
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    /// The timestamp when the task was created.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Task {
    type Error = AppError;

    fn try_from(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
            project_id: row.try_get("project_id").map_err(|_| AppError::MissingData("project_id".to_string()))?,
            title: row.try_get("title").map_err(|_| AppError::MissingData("title".to_string()))?,
            description: row.try_get("description").map_err(|_| AppError::MissingData("description".to_string()))?,
            status: row.try_get("status").map_err(|_| AppError::MissingData("status".to_string()))?,
            due_date: row.try_get("due_date").map_err(|_| AppError::MissingData("due_date".to_string()))?,
            created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        })
    }
}

/// The values of a task to be inserted.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
}

/// A partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<NaiveDate>,
}

/// Aggregate task counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub overdue: i64,
}

/// A project's tasks split into kanban columns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    pub todo: Vec<Task>,
    #[serde(rename = "in-progress")]
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl Board {
    /// Distributes `tasks` into columns, keeping their order within each.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut board = Board::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => board.todo.push(task),
                TaskStatus::InProgress => board.in_progress.push(task),
                TaskStatus::Done => board.done.push(task),
            }
        }
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            status,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn board_groups_by_status_in_order() {
        let board = Board::from_tasks(vec![
            task("a", TaskStatus::Done),
            task("b", TaskStatus::Todo),
            task("c", TaskStatus::InProgress),
            task("d", TaskStatus::Todo),
        ]);

        let titles = |col: &[Task]| col.iter().map(|t| t.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&board.todo), ["b", "d"]);
        assert_eq!(titles(&board.in_progress), ["c"]);
        assert_eq!(titles(&board.done), ["a"]);
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        assert_eq!(sonic_rs::to_string(&TaskStatus::InProgress).unwrap(), r#""in-progress""#);
        let status: TaskStatus = sonic_rs::from_str(r#""done""#).unwrap();
        assert_eq!(status, TaskStatus::Done);
    }
}
