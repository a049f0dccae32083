//! Audit data models

use axum::http::Method;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

// ============================================================================
// Audit Query Constants
// ============================================================================

/// Default number of audit entries returned per page
pub const DEFAULT_AUDIT_PAGE_SIZE: i64 = 20;

/// Maximum number of audit entries that can be returned in a single page.
pub const MAX_AUDIT_PAGE_SIZE: i64 = 100;

/// Audit log entry from the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    /// Acting user (None for anonymous requests)
    pub user_id: Option<i64>,
    /// Username captured at write time
    pub username: Option<String>,
    pub action: String,
    /// Upper-case resource token, e.g. `USER`
    pub resource: String,
    /// 0 when the request named no resource ID
    pub resource_id: i64,
    pub details: JsonValue,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Read,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown audit action '{0}', expected one of CREATE, UPDATE, DELETE, READ")]
pub struct UnknownAuditAction(pub String);

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Read => "READ",
        }
    }

    /// Map an HTTP method to its action. Methods outside the table yield None.
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::POST => Some(Self::Create),
            Method::PUT | Method::PATCH => Some(Self::Update),
            Method::DELETE => Some(Self::Delete),
            Method::GET => Some(Self::Read),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = UnknownAuditAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "READ" => Ok(Self::Read),
            _ => Err(UnknownAuditAction(s.to_string())),
        }
    }
}

/// Filters for listing audit logs, already validated
#[derive(Debug, Clone)]
pub struct AuditLogFilter {
    pub user_id: Option<i64>,
    pub action: Option<AuditAction>,
    pub resource: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditLogFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            action: None,
            resource: None,
            limit: DEFAULT_AUDIT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Input for creating an audit entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditLog {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub action: AuditAction,
    pub resource: String,
    pub resource_id: i64,
    pub details: JsonValue,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditLog {
    pub fn builder() -> NewAuditLogBuilder {
        NewAuditLogBuilder::default()
    }
}

/// Builder for [`NewAuditLog`]
#[derive(Debug, Clone, Default)]
pub struct NewAuditLogBuilder {
    user_id: Option<i64>,
    username: Option<String>,
    action: Option<AuditAction>,
    resource: Option<String>,
    resource_id: i64,
    details: Option<JsonValue>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl NewAuditLogBuilder {
    /// Set the acting user; `None` records an anonymous request.
    pub fn actor(mut self, user_id: Option<i64>, username: Option<String>) -> Self {
        self.user_id = user_id;
        self.username = username;
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn resource_id(mut self, resource_id: i64) -> Self {
        self.resource_id = resource_id;
        self
    }

    pub fn details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn ip_address(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build the entry, failing if action or resource are missing
    pub fn try_build(self) -> Result<NewAuditLog, &'static str> {
        let action = self.action.ok_or("action is required")?;
        let resource = self.resource.ok_or("resource is required")?;

        Ok(NewAuditLog {
            user_id: self.user_id,
            username: self.username,
            action,
            resource,
            resource_id: self.resource_id,
            details: self.details.unwrap_or_else(|| JsonValue::Object(Default::default())),
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        })
    }
}
