//! User management and role assignment

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    AssignRolesCommand, CreateUserCommand, CreateUserError, DeleteUserCommand, DeleteUserError,
    DeleteUserResponse, RemoveRolesCommand,
};
pub use queries::{
    GetUserError, GetUserQuery, GetUserResponse, ListUserRolesQuery, ListUsersError,
    ListUsersQuery, ListUsersResponse,
};
pub use routes::users_routes;
