pub mod get;
pub mod list;

pub use get::{GetAuditLogError, GetAuditLogQuery};
pub use list::{ListAuditLogsError, ListAuditLogsQuery, ListAuditLogsResponse};
