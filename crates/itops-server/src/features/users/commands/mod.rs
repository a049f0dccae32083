pub mod assign_roles;
pub mod create;
pub mod delete;
pub mod remove_roles;

pub use assign_roles::AssignRolesCommand;
pub use create::{CreateUserCommand, CreateUserError};
pub use delete::{DeleteUserCommand, DeleteUserError, DeleteUserResponse};
pub use remove_roles::RemoveRolesCommand;
