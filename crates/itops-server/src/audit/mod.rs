//! Audit logging module
//!
//! Records who did what to which resource for every successful request.
//!
//! # Architecture
//!
//! - [`AuditClassifier`] maps method and path to `(action, resource,
//!   resource_id)` using the [`ResourceRegistry`] built while routes are
//!   mounted, or skips the request
//! - [`AuditLayer`] wraps the router, reads the caller identity, and after a
//!   2xx response merges the handler's [`AuditOverrides`]
//! - [`AuditRecorder`] persists the entry on a detached task
//!
//! The audit path is never on a handler's correctness path: a recorder
//! failure is a warning in the log and the response goes out unchanged.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::Router;
//! use sqlx::PgPool;
//! use itops_server::audit::{
//!     AuditClassifier, AuditLayer, PgAuditRecorder, ResourceRegistry, ResourceSpec,
//! };
//!
//! # fn example(pool: PgPool) {
//! let registry = ResourceRegistry::new()
//!     .with(ResourceSpec::collection("responsibility-groups"));
//! let layer = AuditLayer::new(
//!     AuditClassifier::new(registry),
//!     Arc::new(PgAuditRecorder::new(pool)),
//! );
//! let app: Router = Router::new().layer(layer);
//! # }
//! ```

mod classifier;
mod context;
mod middleware;
mod models;
mod queries;
mod recorder;
mod registry;

#[cfg(test)]
mod middleware_tests;

pub use classifier::{AuditClassifier, Classification, DEFAULT_SKIP_PATHS};
pub use context::AuditOverrides;
pub use middleware::{AuditLayer, AuditMiddleware, AuditWrites};
pub use models::{
    AuditAction, AuditLog, AuditLogFilter, NewAuditLog, NewAuditLogBuilder, UnknownAuditAction,
    DEFAULT_AUDIT_PAGE_SIZE, MAX_AUDIT_PAGE_SIZE,
};
pub use queries::{count_audit_logs, create_audit_log, get_audit_log, list_audit_logs};
pub use recorder::{AuditRecorder, PgAuditRecorder, RecordError};
pub use registry::{
    normalize_resource_segment, IdExtractor, ResourceRegistry, ResourceSpec, PLURAL_EXCEPTIONS,
};
