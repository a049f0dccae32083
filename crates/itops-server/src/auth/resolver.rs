use async_trait::async_trait;
use axum::http::HeaderMap;
use sqlx::PgPool;
use thiserror::Error;

use super::Identity;

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Malformed {} header", USER_ID_HEADER)]
    MalformedHeader,

    #[error("Identity lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Turns request headers into the caller's identity
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// `Ok(None)` means the request carries no credentials.
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, ResolveError>;
}

/// Trusts an upstream gateway that has already verified the caller and
/// forwards the user ID in `x-user-id`. Only active, non-deleted users
/// resolve.
#[derive(Clone)]
pub struct UserHeaderResolver {
    pool: PgPool,
}

impl UserHeaderResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn parse_user_id(headers: &HeaderMap) -> Result<Option<i64>, ResolveError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or(ResolveError::MalformedHeader)
}

#[async_trait]
impl IdentityResolver for UserHeaderResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, ResolveError> {
        let Some(user_id) = parse_user_id(headers)? else {
            return Ok(None);
        };

        let username: Option<String> = sqlx::query_scalar(
            r#"
            SELECT username FROM users
            WHERE id = $1 AND deleted_at IS NULL AND status = 'active'
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if username.is_none() {
            tracing::debug!(user_id, "Header names an unknown or inactive user");
        }

        Ok(username.map(|username| Identity { user_id, username }))
    }
}
