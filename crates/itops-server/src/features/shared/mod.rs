//! Shared utilities and types for feature modules
//!
//! - **pagination**: page/pageSize parameters and response metadata
//! - **validation**: input validation for identity fields
//! - **error_helpers**: database constraint classification
//! - **password**: credential hashing

pub mod error_helpers;
pub mod pagination;
pub mod password;
pub mod validation;

// Re-export commonly used types
pub use pagination::{PaginationMetadata, PaginationParams};
