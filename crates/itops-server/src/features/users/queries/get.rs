//! Get a single user with its roles

use serde::Serialize;

use crate::associations::{AssociationError, AssociationService};
use crate::error::AppError;
use crate::models::{Role, User, USER_COLUMNS};

#[derive(Debug, Clone)]
pub struct GetUserQuery {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserResponse {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetUserError {
    #[error("User {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Association(#[from] AssociationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(service))]
pub async fn handle(
    service: &AssociationService,
    query: GetUserQuery,
) -> Result<GetUserResponse, GetUserError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(query.id)
        .fetch_optional(service.pool())
        .await?
        .ok_or(GetUserError::NotFound(query.id))?;

    let roles = service.roles_of_user(user.id).await?;

    Ok(GetUserResponse { user, roles })
}

impl From<GetUserError> for AppError {
    fn from(err: GetUserError) -> Self {
        match err {
            GetUserError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetUserError::Association(e) => e.into(),
            GetUserError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itops_common::Telemetry;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_get_includes_live_roles_only(pool: PgPool) -> sqlx::Result<()> {
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, username, password_hash) \
             VALUES ('a@example.com', 'a', 'x') RETURNING id",
        )
        .fetch_one(&pool)
        .await?;
        let live: i64 = sqlx::query_scalar("INSERT INTO roles (name) VALUES ('live') RETURNING id")
            .fetch_one(&pool)
            .await?;
        let gone: i64 = sqlx::query_scalar(
            "INSERT INTO roles (name, deleted_at) VALUES ('gone', NOW()) RETURNING id",
        )
        .fetch_one(&pool)
        .await?;
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2), ($1, $3)")
            .bind(user_id)
            .bind(live)
            .bind(gone)
            .execute(&pool)
            .await?;

        let service = AssociationService::new(pool, Telemetry::disabled());
        let response = handle(&service, GetUserQuery { id: user_id }).await.unwrap();

        assert_eq!(response.user.id, user_id);
        assert_eq!(response.roles.len(), 1);
        assert_eq!(response.roles[0].id, live);

        let missing = handle(&service, GetUserQuery { id: user_id + 1000 }).await;
        assert!(matches!(missing, Err(GetUserError::NotFound(_))));

        Ok(())
    }
}
