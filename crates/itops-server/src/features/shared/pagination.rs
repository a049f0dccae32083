//! Shared pagination utilities
//!
//! ```rust,ignore
//! let params = PaginationParams::new(Some(2), Some(20));
//! params.validate()?;
//! let rows = fetch(params.per_page(), params.offset()).await?;
//! let meta = PaginationMetadata::from_params(&params, total);
//! ```

use serde::{Deserialize, Serialize};

/// Default items per page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest accepted `pageSize`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Common pagination request parameters (`page`, `pageSize`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Items per page. Defaults to 20.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self { page, page_size }
    }

    /// Get the page number (1-indexed), defaulting to 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get items per page, defaulting to 20 and clamped to 1-100
    pub fn per_page(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Calculate the offset for SQL OFFSET clause
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }

    /// Reject out-of-range values instead of silently clamping them
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err("page must be greater than 0");
            }
        }
        if let Some(page_size) = self.page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
                return Err("pageSize must be between 1 and 100");
            }
        }
        Ok(())
    }
}

/// Pagination metadata for response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMetadata {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }

    pub fn from_params(params: &PaginationParams, total: i64) -> Self {
        Self::new(params.page(), params.per_page(), total)
    }
}
