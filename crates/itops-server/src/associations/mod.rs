//! Role and permission association management
//!
//! Bulk changes to the `user_roles` and `role_permissions` join tables. Every
//! call is all-or-nothing: the target row is locked, the whole candidate set
//! is validated in one lookup, and the join rows are written in the same
//! transaction. A single unknown candidate ID aborts the call with nothing
//! committed.
//!
//! Concurrent calls on the same user or role serialize on the target row
//! lock; calls on different targets proceed in parallel.

mod error;
mod service;

pub use error::AssociationError;
pub use service::{AssociationChange, AssociationService};

use serde::Serialize;

/// Entities that take part in associations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Role,
    Permission,
}

impl EntityKind {
    /// Backing table. Always a compile-time constant, safe to splice into SQL.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Role => "roles",
            Self::Permission => "permissions",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Role => "Role",
            Self::Permission => "Permission",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::User => "Users",
            Self::Role => "Roles",
            Self::Permission => "Permissions",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A many-to-many relation managed by [`AssociationService`]
#[derive(Debug, Clone, Copy)]
pub struct Association {
    pub target: EntityKind,
    pub candidate: EntityKind,
    pub(crate) table: &'static str,
    pub(crate) target_column: &'static str,
    pub(crate) candidate_column: &'static str,
}

/// Users and the roles assigned to them.
pub const USER_ROLES: Association = Association {
    target: EntityKind::User,
    candidate: EntityKind::Role,
    table: "user_roles",
    target_column: "user_id",
    candidate_column: "role_id",
};

/// Roles and the permissions granted to them.
pub const ROLE_PERMISSIONS: Association = Association {
    target: EntityKind::Role,
    candidate: EntityKind::Permission,
    table: "role_permissions",
    target_column: "role_id",
    candidate_column: "permission_id",
};
