//! List audit entries, newest first

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::{
    count_audit_logs, list_audit_logs, AuditAction, AuditLog, AuditLogFilter,
    UnknownAuditAction, MAX_AUDIT_PAGE_SIZE,
};
use crate::error::AppError;
use crate::features::shared::{PaginationMetadata, PaginationParams};

/// `?userId=&action=&resource=&page=&pageSize=`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAuditLogsQuery {
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListAuditLogsResponse {
    pub items: Vec<AuditLog>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListAuditLogsError {
    #[error(transparent)]
    Action(#[from] UnknownAuditAction),

    #[error("{0}")]
    Pagination(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ListAuditLogsQuery {
    /// Validate the raw query and turn it into a storage filter
    pub fn into_filter(self) -> Result<(AuditLogFilter, PaginationParams), ListAuditLogsError> {
        let pagination = PaginationParams::new(self.page, self.page_size);
        pagination.validate().map_err(ListAuditLogsError::Pagination)?;

        let action = self
            .action
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::parse::<AuditAction>)
            .transpose()?;

        let resource = self
            .resource
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty());

        let filter = AuditLogFilter {
            user_id: self.user_id,
            action,
            resource,
            limit: pagination.per_page().min(MAX_AUDIT_PAGE_SIZE),
            offset: pagination.offset(),
        };

        Ok((filter, pagination))
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListAuditLogsQuery,
) -> Result<ListAuditLogsResponse, ListAuditLogsError> {
    let (filter, pagination) = query.into_filter()?;

    let total = count_audit_logs(&pool, &filter).await?;
    let items = list_audit_logs(&pool, &filter).await?;

    Ok(ListAuditLogsResponse {
        items,
        pagination: PaginationMetadata::from_params(&pagination, total),
    })
}

impl From<ListAuditLogsError> for AppError {
    fn from(err: ListAuditLogsError) -> Self {
        match err {
            ListAuditLogsError::Action(_) | ListAuditLogsError::Pagination(_) => {
                AppError::Validation(err.to_string())
            },
            ListAuditLogsError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_filter_normalizes_input() {
        let query = ListAuditLogsQuery {
            user_id: Some(7),
            action: Some("create".to_string()),
            resource: Some("user".to_string()),
            page: Some(3),
            page_size: Some(10),
        };

        let (filter, pagination) = query.into_filter().unwrap();
        assert_eq!(filter.user_id, Some(7));
        assert_eq!(filter.action, Some(AuditAction::Create));
        assert_eq!(filter.resource.as_deref(), Some("USER"));
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 20);
        assert_eq!(pagination.page(), 3);
    }

    #[test]
    fn test_into_filter_defaults() {
        let (filter, _) = ListAuditLogsQuery::default().into_filter().unwrap();
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.offset, 0);
        assert!(filter.action.is_none());
    }

    #[test]
    fn test_into_filter_rejects_bad_input() {
        let bad_action = ListAuditLogsQuery {
            action: Some("PATCH".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_action.into_filter(), Err(ListAuditLogsError::Action(_))));

        let bad_page = ListAuditLogsQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(bad_page.into_filter(), Err(ListAuditLogsError::Pagination(_))));

        let bad_size = ListAuditLogsQuery {
            page_size: Some(101),
            ..Default::default()
        };
        assert!(matches!(bad_size.into_filter(), Err(ListAuditLogsError::Pagination(_))));
    }
}
