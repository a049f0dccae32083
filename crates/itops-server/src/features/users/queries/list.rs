//! List users with pagination

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;
use crate::features::shared::{PaginationMetadata, PaginationParams};
use crate::models::{User, UserStatus, USER_COLUMNS};

/// Query string for `GET /users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<UserStatus>,
}

impl ListUsersQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub items: Vec<User>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListUsersError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ListUsersQuery) -> Result<ListUsersResponse, ListUsersError> {
    let pagination = query.pagination();
    pagination.validate().map_err(ListUsersError::Validation)?;

    let status = query.status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(&pool)
    .await?;

    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users \
         WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR status = $1) \
         ORDER BY id LIMIT $2 OFFSET $3"
    );

    let items = sqlx::query_as::<_, User>(&sql)
        .bind(status)
        .bind(pagination.per_page())
        .bind(pagination.offset())
        .fetch_all(&pool)
        .await?;

    Ok(ListUsersResponse {
        items,
        pagination: PaginationMetadata::from_params(&pagination, total),
    })
}

impl From<ListUsersError> for AppError {
    fn from(err: ListUsersError) -> Self {
        match err {
            ListUsersError::Validation(msg) => AppError::Validation(msg.to_string()),
            ListUsersError::Database(e) => AppError::Database(e),
        }
    }
}
