//! HTTP middleware for the IT-Ops server
//!
//! - CORS (Cross-Origin Resource Sharing)
//! - Request logging with tracing
//!
//! Audit logging lives in [`crate::audit`] and caller identification in
//! [`crate::auth`].

use axum::http::{header, HeaderName, Method};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

use crate::auth::USER_ID_HEADER;
use crate::config::CorsConfig;

/// Create CORS layer from configuration
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::CONTENT_LANGUAGE,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .max_age(Duration::from_secs(3600));

    let wildcard =
        config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*");

    if wildcard {
        // tower-http rejects credentials combined with a wildcard origin.
        if config.allow_credentials {
            tracing::warn!("CORS credentials disabled because all origins are allowed");
        }
        return cors.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    cors.allow_origin(origins)
        .allow_credentials(config.allow_credentials)
}

/// Create tracing/logging layer
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Micros),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn preflight(config: &CorsConfig, origin: &str) -> axum::http::HeaderMap {
        let app = Router::new()
            .route("/api/v1/users", get(|| async { "ok" }))
            .layer(cors_layer(config));

        app.oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/users")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, USER_ID_HEADER)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .headers()
        .clone()
    }

    #[tokio::test]
    async fn test_specific_origin_with_credentials() {
        let config = CorsConfig {
            allowed_origins: vec!["https://ops.example.com".to_string()],
            allow_credentials: true,
        };

        let headers = preflight(&config, "https://ops.example.com").await;
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://ops.example.com"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_wildcard_drops_credentials() {
        let config = CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: true,
        };

        let headers = preflight(&config, "https://anywhere.example").await;
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[test]
    fn test_tracing_layer_builds() {
        let _layer = tracing_layer();
    }
}
