//! Soft-delete permission command

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct DeletePermissionCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeletePermissionResponse {
    pub id: i64,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeletePermissionError {
    #[error("Permission {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    command: DeletePermissionCommand,
) -> Result<DeletePermissionResponse, DeletePermissionError> {
    let deleted = sqlx::query_as::<_, DeletePermissionResponse>(
        "UPDATE permissions SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL RETURNING id, deleted_at",
    )
    .bind(command.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(DeletePermissionError::NotFound(command.id))?;

    tracing::info!(permission_id = deleted.id, "Permission soft-deleted");

    Ok(deleted)
}

impl From<DeletePermissionError> for AppError {
    fn from(err: DeletePermissionError) -> Self {
        match err {
            DeletePermissionError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeletePermissionError::Database(e) => AppError::Database(e),
        }
    }
}
