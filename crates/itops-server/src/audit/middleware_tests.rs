use super::*;
use crate::auth::Identity;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Forwards every entry into a channel.
struct ChannelRecorder {
    tx: mpsc::UnboundedSender<NewAuditLog>,
}

#[async_trait]
impl AuditRecorder for ChannelRecorder {
    async fn record(&self, entry: NewAuditLog) -> Result<i64, RecordError> {
        self.tx
            .send(entry)
            .map_err(|e| RecordError::Unavailable(e.to_string()))?;
        Ok(1)
    }
}

/// Fails every call and counts attempts.
#[derive(Default)]
struct FailingRecorder {
    attempts: AtomicUsize,
}

#[async_trait]
impl AuditRecorder for FailingRecorder {
    async fn record(&self, _entry: NewAuditLog) -> Result<i64, RecordError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RecordError::Unavailable("disk full".into()))
    }
}

async fn create_user() -> impl IntoResponse {
    (
        StatusCode::CREATED,
        AuditOverrides::new()
            .resource_id(42)
            .detail(json!({ "email": "ops@example.com" })),
        Json(json!({ "id": 42 })),
    )
}

async fn assign_permissions() -> impl IntoResponse {
    (
        AuditOverrides::new().resource("ROLE").action(AuditAction::Update),
        Json(json!({ "ok": true })),
    )
}

/// Completes after a delay and counts completions.
#[derive(Default)]
struct SlowRecorder {
    completed: AtomicUsize,
}

#[async_trait]
impl AuditRecorder for SlowRecorder {
    async fn record(&self, _entry: NewAuditLog) -> Result<i64, RecordError> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }
}

/// Never completes.
struct StuckRecorder;

#[async_trait]
impl AuditRecorder for StuckRecorder {
    async fn record(&self, _entry: NewAuditLog) -> Result<i64, RecordError> {
        std::future::pending().await
    }
}

async fn ok_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn failing_handler() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, Json(json!({ "success": false })))
}

async fn unauthorized_handler() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        AuditOverrides::new().resource("AUDIT_LOG").action(AuditAction::Read),
        Json(json!({ "success": false })),
    )
}

async fn server_error_handler() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "success": false })))
}

fn registry() -> ResourceRegistry {
    ResourceRegistry::new()
        .with(ResourceSpec::collection("users"))
        .with(ResourceSpec::collection("roles"))
        .with(ResourceSpec::collection("permissions"))
}

fn test_router(layer: AuditLayer) -> Router {
    Router::new()
        .route("/api/v1/users", post(create_user).get(ok_handler))
        .route("/api/v1/users/:id", delete(ok_handler))
        .route("/api/v1/users/:id/roles", post(failing_handler))
        .route("/api/v1/permissions/roles/:id", post(assign_permissions))
        .route("/api/v1/auth/login", post(ok_handler))
        .route("/api/v1/audit-logs", get(ok_handler))
        .route("/api/v1/audit-logs/:id", get(unauthorized_handler))
        .route("/health", get(ok_handler))
        .route("/metrics", get(server_error_handler))
        .layer(layer)
}

fn channel_router(record_reads: bool) -> (Router, mpsc::UnboundedReceiver<NewAuditLog>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let layer = AuditLayer::new(AuditClassifier::new(registry()), Arc::new(ChannelRecorder { tx }))
        .record_reads(record_reads);
    (test_router(layer), rx)
}

fn request(method: Method, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("user-agent", "audit-test/1.0")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::empty())
        .unwrap()
}

async fn next_entry(rx: &mut mpsc::UnboundedReceiver<NewAuditLog>) -> NewAuditLog {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("audit entry not recorded in time")
        .expect("recorder channel closed")
}

/// Give detached recording tasks a chance to run, then assert silence.
///
/// A closed channel also counts: once the router and every recording task
/// are gone, buffered entries would still have been delivered first.
async fn assert_no_entry(rx: &mut mpsc::UnboundedReceiver<NewAuditLog>) {
    match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        Err(_) | Ok(None) => {},
        Ok(Some(entry)) => panic!("unexpected audit entry: {entry:?}"),
    }
}

#[tokio::test]
async fn test_create_records_handler_overrides() {
    let (app, mut rx) = channel_router(true);

    let mut req = request(Method::POST, "/api/v1/users");
    req.extensions_mut().insert(Identity {
        user_id: 7,
        username: "alice".into(),
    });

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.extensions().get::<AuditOverrides>().is_none());

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Create);
    assert_eq!(entry.resource, "USER");
    assert_eq!(entry.resource_id, 42);
    assert_eq!(entry.user_id, Some(7));
    assert_eq!(entry.username.as_deref(), Some("alice"));
    assert_eq!(entry.details, json!({ "email": "ops@example.com" }));
    assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.9"));
    assert_eq!(entry.user_agent.as_deref(), Some("audit-test/1.0"));

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_default_detail_and_anonymous_actor() {
    let (app, mut rx) = channel_router(true);

    let response = app.oneshot(request(Method::DELETE, "/api/v1/users/15")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Delete);
    assert_eq!(entry.resource_id, 15);
    assert_eq!(entry.user_id, None);
    assert_eq!(entry.username, None);
    assert_eq!(
        entry.details,
        json!({ "path": "/api/v1/users/15", "method": "DELETE", "status": 200 })
    );
}

#[tokio::test]
async fn test_resource_and_action_overrides() {
    let (app, mut rx) = channel_router(true);

    app.oneshot(request(Method::POST, "/api/v1/permissions/roles/5"))
        .await
        .unwrap();

    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(entry.resource, "ROLE");
    assert_eq!(entry.resource_id, 5);
}

#[tokio::test]
async fn test_non_success_is_not_recorded() {
    let (app, mut rx) = channel_router(true);

    let response = app
        .oneshot(request(Method::POST, "/api/v1/users/3/roles"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_unknown_route_is_not_recorded() {
    let (app, mut rx) = channel_router(true);

    let response = app
        .oneshot(request(Method::POST, "/api/v1/assets/3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_skip_listed_paths_are_not_recorded() {
    let (app, mut rx) = channel_router(true);

    for (method, uri, status) in [
        (Method::POST, "/api/v1/auth/login", StatusCode::OK),
        (Method::GET, "/api/v1/audit-logs", StatusCode::OK),
        (Method::GET, "/api/v1/audit-logs/3", StatusCode::UNAUTHORIZED),
        (Method::GET, "/health", StatusCode::OK),
        (Method::GET, "/metrics", StatusCode::INTERNAL_SERVER_ERROR),
    ] {
        let response = app.clone().oneshot(request(method, uri)).await.unwrap();
        assert_eq!(response.status(), status, "{uri}");
    }

    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_reads_follow_configuration() {
    let (app, mut rx) = channel_router(true);
    app.oneshot(request(Method::GET, "/api/v1/users")).await.unwrap();
    let entry = next_entry(&mut rx).await;
    assert_eq!(entry.action, AuditAction::Read);
    assert_eq!(entry.resource, "USER");

    let (app, mut rx) = channel_router(false);
    app.oneshot(request(Method::GET, "/api/v1/users")).await.unwrap();
    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_one_entry_per_request() {
    let (app, mut rx) = channel_router(true);

    for _ in 0..3 {
        app.clone()
            .oneshot(request(Method::DELETE, "/api/v1/users/1"))
            .await
            .unwrap();
    }

    for _ in 0..3 {
        next_entry(&mut rx).await;
    }
    assert_no_entry(&mut rx).await;
}

#[tokio::test]
async fn test_recorder_failure_does_not_alter_response() {
    let recorder = Arc::new(FailingRecorder::default());
    let layer = AuditLayer::new(AuditClassifier::new(registry()), recorder.clone());
    let app = test_router(layer);

    let response = app.oneshot(request(Method::POST, "/api/v1/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    assert_eq!(&body[..], br#"{"id":42}"#);

    for _ in 0..20 {
        if recorder.attempts.load(Ordering::SeqCst) == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("recorder was never called");
}

#[tokio::test]
async fn test_drain_waits_for_pending_writes() {
    let recorder = Arc::new(SlowRecorder::default());
    let writes = AuditWrites::new();
    let layer = AuditLayer::new(AuditClassifier::new(registry()), recorder.clone())
        .with_writes(writes.clone());
    let app = test_router(layer);

    let response = app
        .oneshot(request(Method::DELETE, "/api/v1/users/4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(recorder.completed.load(Ordering::SeqCst), 0);
    assert_eq!(writes.pending(), 1);

    assert_eq!(writes.drain(Duration::from_secs(2)).await, 0);
    assert_eq!(recorder.completed.load(Ordering::SeqCst), 1);
    assert_eq!(writes.pending(), 0);
}

#[tokio::test]
async fn test_drain_reports_writes_left_behind() {
    let writes = AuditWrites::new();
    let layer = AuditLayer::new(AuditClassifier::new(registry()), Arc::new(StuckRecorder))
        .with_writes(writes.clone());
    let app = test_router(layer);

    app.oneshot(request(Method::DELETE, "/api/v1/users/4"))
        .await
        .unwrap();

    assert_eq!(writes.drain(Duration::from_millis(50)).await, 1);
}
