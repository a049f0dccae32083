//! List roles with pagination

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;
use crate::features::shared::{PaginationMetadata, PaginationParams};
use crate::models::{Role, ROLE_COLUMNS};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRolesQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRolesResponse {
    pub items: Vec<Role>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListRolesError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ListRolesQuery) -> Result<ListRolesResponse, ListRolesError> {
    let pagination = PaginationParams::new(query.page, query.page_size);
    pagination.validate().map_err(ListRolesError::Validation)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE deleted_at IS NULL")
        .fetch_one(&pool)
        .await?;

    let sql = format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2"
    );
    let items = sqlx::query_as::<_, Role>(&sql)
        .bind(pagination.per_page())
        .bind(pagination.offset())
        .fetch_all(&pool)
        .await?;

    Ok(ListRolesResponse {
        items,
        pagination: PaginationMetadata::from_params(&pagination, total),
    })
}

impl From<ListRolesError> for AppError {
    fn from(err: ListRolesError) -> Self {
        match err {
            ListRolesError::Validation(msg) => AppError::Validation(msg.to_string()),
            ListRolesError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_list_hides_deleted_roles(pool: PgPool) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO roles (name) VALUES ('a'), ('b')")
            .execute(&pool)
            .await?;
        sqlx::query("INSERT INTO roles (name, deleted_at) VALUES ('c', NOW())")
            .execute(&pool)
            .await?;

        let response = handle(pool, ListRolesQuery::default()).await.unwrap();
        assert_eq!(response.pagination.total, 2);
        assert_eq!(
            response.items.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_rejects_oversized_page(pool: PgPool) {
        let result = handle(
            pool,
            ListRolesQuery {
                page: None,
                page_size: Some(500),
            },
        )
        .await;
        assert!(matches!(result, Err(ListRolesError::Validation(_))));
    }
}
