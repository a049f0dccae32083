//! Get a single role with its permissions

use serde::Serialize;

use crate::associations::{AssociationError, AssociationService};
use crate::error::AppError;
use crate::models::{Permission, Role, ROLE_COLUMNS};

#[derive(Debug, Clone)]
pub struct GetRoleQuery {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRoleResponse {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetRoleError {
    #[error("Role {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Association(#[from] AssociationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(service))]
pub async fn handle(
    service: &AssociationService,
    query: GetRoleQuery,
) -> Result<GetRoleResponse, GetRoleError> {
    let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 AND deleted_at IS NULL");

    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(query.id)
        .fetch_optional(service.pool())
        .await?
        .ok_or(GetRoleError::NotFound(query.id))?;

    let permissions = service.permissions_of_role(role.id).await?;

    Ok(GetRoleResponse { role, permissions })
}

impl From<GetRoleError> for AppError {
    fn from(err: GetRoleError) -> Self {
        match err {
            GetRoleError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetRoleError::Association(e) => e.into(),
            GetRoleError::Database(e) => AppError::Database(e),
        }
    }
}
