use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Represents a project in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// The unique identifier for the project.
    pub id: Uuid,
    /// The ID of the user who owns the project.
    pub user_id: Uuid,
    /// The title of the project.
    pub title: String,
    /// The description of the project.
    pub description: String,
    /// The timestamp when the project was created.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Project {
    type Error = AppError;

    fn try_from(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
            user_id: row.try_get("user_id").map_err(|_| AppError::MissingData("user_id".to_string()))?,
            title: row.try_get("title").map_err(|_| AppError::MissingData("title".to_string()))?,
            description: row.try_get("description").map_err(|_| AppError::MissingData("description".to_string()))?,
            created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        })
    }
}
