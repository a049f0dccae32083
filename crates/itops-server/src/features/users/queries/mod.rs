pub mod get;
pub mod list;
pub mod list_roles;

pub use get::{GetUserError, GetUserQuery, GetUserResponse};
pub use list::{ListUsersError, ListUsersQuery, ListUsersResponse};
pub use list_roles::ListUserRolesQuery;
