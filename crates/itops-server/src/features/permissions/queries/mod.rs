pub mod get;
pub mod list;
pub mod list_for_role;

pub use get::{GetPermissionError, GetPermissionQuery};
pub use list::{ListPermissionsError, ListPermissionsQuery, ListPermissionsResponse};
pub use list_for_role::ListRolePermissionsQuery;
