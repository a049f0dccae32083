//! Role management

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{CreateRoleCommand, CreateRoleError, DeleteRoleCommand, DeleteRoleError};
pub use queries::{GetRoleError, GetRoleQuery, GetRoleResponse, ListRolesError, ListRolesQuery};
pub use routes::roles_routes;
