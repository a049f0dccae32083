//! Create role command

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::AppError;
use crate::features::shared::error_helpers::map_unique_violation;
use crate::features::shared::validation::{validate_name, NameValidationError};
use crate::models::{Role, ROLE_COLUMNS};

const MAX_ROLE_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleCommand {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateRoleError {
    #[error("{0}")]
    Name(#[from] NameValidationError),

    #[error("Description must be at most {} characters", MAX_DESCRIPTION_LENGTH)]
    DescriptionTooLong,

    #[error("Role '{0}' already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateRoleCommand {
    pub fn validate(&self) -> Result<(), CreateRoleError> {
        validate_name(&self.name, "Role name", MAX_ROLE_NAME_LENGTH)?;
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(CreateRoleError::DescriptionTooLong);
            }
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(name = %command.name))]
pub async fn handle(pool: PgPool, command: CreateRoleCommand) -> Result<Role, CreateRoleError> {
    command.validate()?;

    let name = command.name.trim().to_string();
    let sql = format!("INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}");

    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(&name)
        .bind(command.description.as_deref())
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, CreateRoleError::Duplicate(name.clone()), CreateRoleError::Database)
        })?;

    tracing::info!(role_id = role.id, "Role created");

    Ok(role)
}

impl From<CreateRoleError> for AppError {
    fn from(err: CreateRoleError) -> Self {
        match err {
            CreateRoleError::Name(_) | CreateRoleError::DescriptionTooLong => {
                AppError::Validation(err.to_string())
            },
            CreateRoleError::Duplicate(_) => AppError::Conflict(err.to_string()),
            CreateRoleError::Database(e) => AppError::Database(e),
        }
    }
}
