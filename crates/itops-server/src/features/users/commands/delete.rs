//! Soft-delete user command

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct DeleteUserCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub id: i64,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteUserError {
    #[error("User {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Mark a user deleted. Role assignments stay in place and are hidden by
/// every read that filters deleted rows.
#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    command: DeleteUserCommand,
) -> Result<DeleteUserResponse, DeleteUserError> {
    let deleted = sqlx::query_as::<_, DeleteUserResponse>(
        r#"
        UPDATE users SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id, deleted_at
        "#,
    )
    .bind(command.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(DeleteUserError::NotFound(command.id))?;

    tracing::info!(user_id = deleted.id, "User soft-deleted");

    Ok(deleted)
}

impl From<DeleteUserError> for AppError {
    fn from(err: DeleteUserError) -> Self {
        match err {
            DeleteUserError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteUserError::Database(e) => AppError::Database(e),
        }
    }
}
