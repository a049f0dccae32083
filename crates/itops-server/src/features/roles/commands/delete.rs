//! Soft-delete role command

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct DeleteRoleCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRoleResponse {
    pub id: i64,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteRoleError {
    #[error("Role {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    command: DeleteRoleCommand,
) -> Result<DeleteRoleResponse, DeleteRoleError> {
    let deleted = sqlx::query_as::<_, DeleteRoleResponse>(
        "UPDATE roles SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL RETURNING id, deleted_at",
    )
    .bind(command.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(DeleteRoleError::NotFound(command.id))?;

    tracing::info!(role_id = deleted.id, "Role soft-deleted");

    Ok(deleted)
}

impl From<DeleteRoleError> for AppError {
    fn from(err: DeleteRoleError) -> Self {
        match err {
            DeleteRoleError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteRoleError::Database(e) => AppError::Database(e),
        }
    }
}
