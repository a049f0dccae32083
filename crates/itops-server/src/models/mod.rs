//! Identity store records
//!
//! Row types shared by the feature slices and the association service. All of
//! them serialize with camelCase keys and never expose credential material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account status of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Disabled,
}

#[derive(Debug, Error)]
#[error("Unknown user status '{0}', expected 'active' or 'disabled'")]
pub struct UnknownUserStatus(pub String);

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = UnknownUserStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            _ => Err(UnknownUserStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for UserStatus {
    type Error = UnknownUserStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A user account without its credential hash
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named `(resource, action)` grant, e.g. `user` / `create`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column lists matching the structs above.
pub(crate) const USER_COLUMNS: &str = "id, email, username, status, created_at, updated_at";
pub(crate) const ROLE_COLUMNS: &str = "id, name, description, created_at, updated_at";
pub(crate) const PERMISSION_COLUMNS: &str =
    "id, name, resource, action, description, created_at, updated_at";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_status_parsing() {
        assert_eq!("active".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert_eq!("DISABLED".parse::<UserStatus>().unwrap(), UserStatus::Disabled);
        assert!("locked".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User {
            id: 3,
            email: "ops@example.com".to_string(),
            username: "ops".to_string(),
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["status"], "active");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
    }
}
