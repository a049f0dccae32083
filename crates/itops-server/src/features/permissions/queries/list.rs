//! List permissions with pagination

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;
use crate::features::shared::{PaginationMetadata, PaginationParams};
use crate::models::{Permission, PERMISSION_COLUMNS};

/// Query string for `GET /permissions`; `resource` filters exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPermissionsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPermissionsResponse {
    pub items: Vec<Permission>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListPermissionsError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListPermissionsQuery,
) -> Result<ListPermissionsResponse, ListPermissionsError> {
    let pagination = PaginationParams::new(query.page, query.page_size);
    pagination.validate().map_err(ListPermissionsError::Validation)?;

    let resource = query.resource.map(|r| r.trim().to_ascii_lowercase());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM permissions \
         WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR resource = $1)",
    )
    .bind(resource.as_deref())
    .fetch_one(&pool)
    .await?;

    let sql = format!(
        "SELECT {PERMISSION_COLUMNS} FROM permissions \
         WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR resource = $1) \
         ORDER BY id LIMIT $2 OFFSET $3"
    );
    let items = sqlx::query_as::<_, Permission>(&sql)
        .bind(resource.as_deref())
        .bind(pagination.per_page())
        .bind(pagination.offset())
        .fetch_all(&pool)
        .await?;

    Ok(ListPermissionsResponse {
        items,
        pagination: PaginationMetadata::from_params(&pagination, total),
    })
}

impl From<ListPermissionsError> for AppError {
    fn from(err: ListPermissionsError) -> Self {
        match err {
            ListPermissionsError::Validation(msg) => AppError::Validation(msg.to_string()),
            ListPermissionsError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_filter_by_resource(pool: PgPool) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO permissions (name, resource, action) VALUES \
             ('user:create', 'user', 'create'), ('role:create', 'role', 'create')",
        )
        .execute(&pool)
        .await?;

        let response = handle(
            pool,
            ListPermissionsQuery {
                resource: Some("USER".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].name, "user:create");
        Ok(())
    }
}
