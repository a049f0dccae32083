pub mod add_to_role;
pub mod create;
pub mod delete;
pub mod remove_from_role;

pub use add_to_role::AddPermissionsCommand;
pub use create::{CreatePermissionCommand, CreatePermissionError};
pub use delete::{DeletePermissionCommand, DeletePermissionError, DeletePermissionResponse};
pub use remove_from_role::RemovePermissionsCommand;
