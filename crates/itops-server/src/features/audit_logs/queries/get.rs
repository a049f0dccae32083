//! Get a single audit entry

use sqlx::PgPool;

use crate::audit::{get_audit_log, AuditLog};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct GetAuditLogQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetAuditLogError {
    #[error("Audit log {0} not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetAuditLogQuery) -> Result<AuditLog, GetAuditLogError> {
    get_audit_log(&pool, query.id)
        .await?
        .ok_or(GetAuditLogError::NotFound(query.id))
}

impl From<GetAuditLogError> for AppError {
    fn from(err: GetAuditLogError) -> Self {
        match err {
            GetAuditLogError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetAuditLogError::Database(e) => AppError::Database(e),
        }
    }
}
