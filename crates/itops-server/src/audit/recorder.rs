//! Audit persistence seam
//!
//! The audit layer only knows the [`AuditRecorder`] trait. Production wires
//! in [`PgAuditRecorder`]; tests substitute an in-memory recorder.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::models::NewAuditLog;
use super::queries::create_audit_log;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to persist audit log: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Audit recorder unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AuditRecorder: Send + Sync + 'static {
    /// Persist one entry and return its ID.
    async fn record(&self, entry: NewAuditLog) -> Result<i64, RecordError>;
}

/// Writes entries to the `audit_logs` table
#[derive(Clone)]
pub struct PgAuditRecorder {
    pool: PgPool,
}

impl PgAuditRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRecorder for PgAuditRecorder {
    async fn record(&self, entry: NewAuditLog) -> Result<i64, RecordError> {
        let log = create_audit_log(&self.pool, &entry).await?;
        Ok(log.id)
    }
}
