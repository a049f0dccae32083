use thiserror::Error;

use super::EntityKind;
use crate::error::AppError;

/// Errors produced by association operations
#[derive(Debug, Error)]
pub enum AssociationError {
    /// The user or role the call targets does not exist or is soft-deleted.
    #[error("{entity} {id} not found")]
    TargetNotFound { entity: EntityKind, id: i64 },

    /// At least one candidate ID does not exist. Nothing was written.
    #[error("{} not found: {}", .entity.plural(), join_ids(.missing))]
    CandidatesNotFound { entity: EntityKind, missing: Vec<i64> },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AssociationError> for AppError {
    fn from(err: AssociationError) -> Self {
        match err {
            AssociationError::TargetNotFound { .. } => AppError::NotFound(err.to_string()),
            AssociationError::CandidatesNotFound { ref missing, .. } => {
                AppError::InvalidAssociation {
                    missing_ids: missing.clone(),
                    message: err.to_string(),
                }
            },
            AssociationError::Database(e) => AppError::Database(e),
        }
    }
}
