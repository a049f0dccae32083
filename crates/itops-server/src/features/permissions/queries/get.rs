//! Get a single permission

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{Permission, PERMISSION_COLUMNS};

#[derive(Debug, Clone)]
pub struct GetPermissionQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetPermissionError {
    #[error("Permission {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetPermissionQuery) -> Result<Permission, GetPermissionError> {
    let sql =
        format!("SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = $1 AND deleted_at IS NULL");

    sqlx::query_as::<_, Permission>(&sql)
        .bind(query.id)
        .fetch_optional(&pool)
        .await?
        .ok_or(GetPermissionError::NotFound(query.id))
}

impl From<GetPermissionError> for AppError {
    fn from(err: GetPermissionError) -> Self {
        match err {
            GetPermissionError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetPermissionError::Database(e) => AppError::Database(e),
        }
    }
}
