pub mod create;
pub mod delete;

pub use create::{CreateRoleCommand, CreateRoleError};
pub use delete::{DeleteRoleCommand, DeleteRoleError, DeleteRoleResponse};
