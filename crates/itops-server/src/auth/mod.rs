//! Caller identity
//!
//! Token verification is not this crate's concern. An [`IdentityResolver`]
//! turns request headers into an [`Identity`]; the [`identify`] middleware
//! runs it once per request and stores the result in the request extensions,
//! where the audit layer and the [`AuthUser`] extractor pick it up.

mod resolver;

pub use resolver::{IdentityResolver, ResolveError, UserHeaderResolver, USER_ID_HEADER};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppError;

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

/// Resolve the caller and attach it to the request.
///
/// Requests without credentials pass through anonymously. A resolver error
/// is logged and treated the same way.
pub async fn identify(
    State(resolver): State<Arc<dyn IdentityResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolver.resolve(request.headers()).await {
        Ok(Some(identity)) => {
            tracing::debug!(user_id = identity.user_id, "Request authenticated");
            request.extensions_mut().insert(identity);
        },
        Ok(None) => {},
        Err(e) => {
            tracing::warn!(error = %e, "Identity resolution failed, continuing anonymously");
        },
    }

    next.run(request).await
}

/// Extractor for handlers that require an authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}
