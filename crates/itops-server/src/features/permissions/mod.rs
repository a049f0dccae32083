//! Permission catalogue and role grants

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    AddPermissionsCommand, CreatePermissionCommand, CreatePermissionError,
    DeletePermissionCommand, DeletePermissionError, RemovePermissionsCommand,
};
pub use queries::{
    GetPermissionError, GetPermissionQuery, ListPermissionsError, ListPermissionsQuery,
    ListRolePermissionsQuery,
};
pub use routes::permissions_routes;
