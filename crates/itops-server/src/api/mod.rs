//! Application assembly
//!
//! [`build_app`] wires the feature routers, the audit classifier built from
//! their registry, and the middleware stack. From outermost to innermost:
//!
//! 1. CORS
//! 2. identity resolution
//! 3. audit
//! 4. request tracing
//! 5. compression

pub mod extract;
pub mod response;

use axum::{
    extract::State, http::StatusCode, middleware::from_fn_with_state, response::IntoResponse,
    routing::get, Json, Router,
};
use itops_common::Telemetry;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

use crate::audit::{AuditClassifier, AuditLayer, AuditRecorder, AuditWrites, PgAuditRecorder};
use crate::auth::{identify, IdentityResolver, UserHeaderResolver};
use crate::config::Config;
use crate::db;
use crate::features::{self, FeatureState};
use crate::middleware;
use response::{ApiResponse, ErrorResponse};

/// Build the router with the PostgreSQL recorder and the header resolver.
///
/// Audit rows are written on tasks tracked by `writes`.
pub fn build_app(
    pool: PgPool,
    config: &Config,
    telemetry: Telemetry,
    writes: AuditWrites,
) -> Router {
    let recorder: Arc<dyn AuditRecorder> = Arc::new(PgAuditRecorder::new(pool.clone()));
    let resolver: Arc<dyn IdentityResolver> = Arc::new(UserHeaderResolver::new(pool.clone()));

    build_app_with(pool, config, telemetry, writes, recorder, resolver)
}

/// Build the router with explicit collaborators.
pub fn build_app_with(
    pool: PgPool,
    config: &Config,
    telemetry: Telemetry,
    writes: AuditWrites,
    recorder: Arc<dyn AuditRecorder>,
    resolver: Arc<dyn IdentityResolver>,
) -> Router {
    let (api, registry) = features::api_routes().into_parts();

    tracing::info!(collections = registry.len(), "Audit resource registry built");

    let classifier = AuditClassifier::new(registry)
        .with_skip_paths(config.audit.skip_paths.iter().cloned())
        .strict(config.audit.strict_resources);

    let audit_layer = AuditLayer::new(classifier, recorder)
        .with_telemetry(telemetry.clone())
        .with_writes(writes)
        .record_reads(config.audit.record_reads);

    let state = FeatureState::new(pool, telemetry);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api.route("/health", get(health_check)))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(audit_layer)
        .layer(from_fn_with_state(resolver, identify))
        .layer(middleware::cors_layer(&config.cors))
}

async fn health_check(State(pool): State<PgPool>) -> impl IntoResponse {
    match db::health_check(&pool).await {
        Ok(()) => ApiResponse::success(json!({
            "status": "healthy",
            "database": "connected"
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(
                    "SERVICE_UNAVAILABLE",
                    "Database is not reachable",
                )),
            )
                .into_response()
        },
    }
}
