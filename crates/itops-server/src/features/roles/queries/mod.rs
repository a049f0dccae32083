pub mod get;
pub mod list;

pub use get::{GetRoleError, GetRoleQuery, GetRoleResponse};
pub use list::{ListRolesError, ListRolesQuery, ListRolesResponse};
