//! Read access to the audit trail
//!
//! The trail itself is written only by the audit layer; these routes are
//! mounted outside the resource registry so reading it is never audited.

pub mod queries;
pub mod routes;

pub use queries::{GetAuditLogError, GetAuditLogQuery, ListAuditLogsError, ListAuditLogsQuery};
pub use routes::audit_logs_routes;
