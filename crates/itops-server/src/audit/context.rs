//! Typed per-request audit overrides
//!
//! A handler that knows better than the path (the ID of a freshly created
//! row, a more precise resource, a detail payload) returns an
//! [`AuditOverrides`] next to its body:
//!
//! ```rust,ignore
//! Ok((
//!     StatusCode::CREATED,
//!     AuditOverrides::new().resource_id(user.id).detail(json!({ "email": user.email })),
//!     Json(ApiResponse::success(user)),
//! ))
//! ```
//!
//! The value travels in the response extensions and is consumed by the audit
//! layer once the handler has finished.

use axum::response::{IntoResponseParts, ResponseParts};
use serde_json::Value as JsonValue;
use std::convert::Infallible;

use super::models::AuditAction;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditOverrides {
    pub resource: Option<String>,
    pub action: Option<AuditAction>,
    pub resource_id: Option<i64>,
    pub detail: Option<JsonValue>,
}

impl AuditOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into().to_ascii_uppercase());
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn resource_id(mut self, resource_id: i64) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    pub fn detail(mut self, detail: JsonValue) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl IntoResponseParts for AuditOverrides {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}
