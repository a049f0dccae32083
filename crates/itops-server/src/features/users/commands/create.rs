//! Create user command

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::AppError;
use crate::features::shared::error_helpers::map_unique_violation;
use crate::features::shared::password::{hash_password, PasswordError};
use crate::features::shared::validation::{
    validate_email, validate_name, validate_password, EmailValidationError, NameValidationError,
    PasswordValidationError,
};
use crate::models::{User, UserStatus, USER_COLUMNS};

/// Command to create a new user
///
/// ```json
/// { "email": "ops@example.com", "username": "ops", "password": "s3cret-pass" }
/// ```
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserCommand {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

impl std::fmt::Debug for CreateUserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserCommand")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

/// Errors that can occur when creating a user
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("{0}")]
    Email(#[from] EmailValidationError),

    #[error("{0}")]
    Username(#[from] NameValidationError),

    #[error("{0}")]
    Password(#[from] PasswordValidationError),

    #[error("A user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error(transparent)]
    Hash(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateUserCommand {
    #[tracing::instrument(skip(self), fields(email = %self.email, username = %self.username))]
    pub fn validate(&self) -> Result<(), CreateUserError> {
        validate_email(&self.email)?;
        validate_name(&self.username, "Username", 64)?;
        validate_password(&self.password)?;

        tracing::debug!("Command validation passed");
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(email = %command.email))]
pub async fn handle(pool: PgPool, command: CreateUserCommand) -> Result<User, CreateUserError> {
    command.validate()?;

    let email = command.email.trim().to_string();
    let password_hash = hash_password(command.password).await?;
    let status = command.status.unwrap_or_default();

    let sql = format!(
        "INSERT INTO users (email, username, password_hash, status) \
         VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
    );

    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&email)
        .bind(command.username.trim())
        .bind(&password_hash)
        .bind(status.as_str())
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                CreateUserError::DuplicateEmail(email.clone()),
                CreateUserError::Database,
            )
        })?;

    tracing::info!(user_id = user.id, "User created");

    Ok(user)
}

impl From<CreateUserError> for AppError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::Email(_)
            | CreateUserError::Username(_)
            | CreateUserError::Password(_) => AppError::Validation(err.to_string()),
            CreateUserError::DuplicateEmail(_) => AppError::Conflict(err.to_string()),
            CreateUserError::Hash(e) => AppError::Internal(e.to_string()),
            CreateUserError::Database(e) => AppError::Database(e),
        }
    }
}
