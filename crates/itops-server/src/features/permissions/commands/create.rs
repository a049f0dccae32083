//! Create permission command

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::AppError;
use crate::features::shared::error_helpers::map_unique_violation;
use crate::features::shared::validation::{validate_name, NameValidationError};
use crate::models::{Permission, PERMISSION_COLUMNS};

/// `{ "name": "user:create", "resource": "user", "action": "create" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionCommand {
    pub name: String,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreatePermissionError {
    #[error("{0}")]
    Field(#[from] NameValidationError),

    #[error("Permission '{0}' already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreatePermissionCommand {
    pub fn validate(&self) -> Result<(), CreatePermissionError> {
        validate_name(&self.name, "Permission name", 100)?;
        validate_name(&self.resource, "Resource", 64)?;
        validate_name(&self.action, "Action", 64)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(name = %command.name))]
pub async fn handle(
    pool: PgPool,
    command: CreatePermissionCommand,
) -> Result<Permission, CreatePermissionError> {
    command.validate()?;

    let name = command.name.trim().to_string();
    let sql = format!(
        "INSERT INTO permissions (name, resource, action, description) \
         VALUES ($1, $2, $3, $4) RETURNING {PERMISSION_COLUMNS}"
    );

    let permission = sqlx::query_as::<_, Permission>(&sql)
        .bind(&name)
        .bind(command.resource.trim().to_ascii_lowercase())
        .bind(command.action.trim().to_ascii_lowercase())
        .bind(command.description.as_deref())
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                CreatePermissionError::Duplicate(name.clone()),
                CreatePermissionError::Database,
            )
        })?;

    tracing::info!(permission_id = permission.id, "Permission created");

    Ok(permission)
}

impl From<CreatePermissionError> for AppError {
    fn from(err: CreatePermissionError) -> Self {
        match err {
            CreatePermissionError::Field(_) => AppError::Validation(err.to_string()),
            CreatePermissionError::Duplicate(_) => AppError::Conflict(err.to_string()),
            CreatePermissionError::Database(e) => AppError::Database(e),
        }
    }
}
