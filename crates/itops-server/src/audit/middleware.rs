//! Audit logging middleware
//!
//! - Classifies the request before the handler runs
//! - Reads the acting identity that the `identify` layer attached
//! - After the handler, records only 2xx responses, merging any
//!   [`AuditOverrides`] the handler returned
//! - Persists on a task tracked by [`AuditWrites`]; failures are logged,
//!   never surfaced

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    response::Response,
};
use itops_common::Telemetry;
use serde_json::json;
use std::{
    future::Future,
    net::{IpAddr, SocketAddr},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio_util::task::TaskTracker;
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::classifier::AuditClassifier;
use super::context::AuditOverrides;
use super::models::{AuditAction, NewAuditLog};
use super::recorder::AuditRecorder;
use crate::auth::Identity;

/// Audit writes that have been handed to the recorder but not finished
///
/// Clones share the same set. The binary drains it after the server stops
/// accepting requests so pending rows are not dropped with the runtime.
#[derive(Debug, Clone, Default)]
pub struct AuditWrites {
    tracker: TaskTracker,
}

impl AuditWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait up to `timeout` for every pending write.
    ///
    /// Returns the number of writes still running when the wait gave up.
    pub async fn drain(&self, timeout: Duration) -> usize {
        self.tracker.close();
        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => 0,
            Err(_) => self.tracker.len(),
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }
}

/// Audit logging layer
#[derive(Clone)]
pub struct AuditLayer {
    classifier: Arc<AuditClassifier>,
    recorder: Arc<dyn AuditRecorder>,
    telemetry: Telemetry,
    writes: AuditWrites,
    record_reads: bool,
}

impl AuditLayer {
    pub fn new(classifier: AuditClassifier, recorder: Arc<dyn AuditRecorder>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            recorder,
            telemetry: Telemetry::default(),
            writes: AuditWrites::default(),
            record_reads: true,
        }
    }

    /// Track recording tasks in `writes` instead of a private set.
    pub fn with_writes(mut self, writes: AuditWrites) -> Self {
        self.writes = writes;
        self
    }

    /// Run recording tasks under this telemetry handle.
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Whether successful GET requests produce READ entries.
    pub fn record_reads(mut self, record_reads: bool) -> Self {
        self.record_reads = record_reads;
        self
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

/// Audit middleware service
#[derive(Clone)]
pub struct AuditMiddleware<S> {
    inner: S,
    layer: AuditLayer,
}

impl<S> Service<Request> for AuditMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // The clone is not necessarily ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let layer = self.layer.clone();

        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            let classification = layer
                .classifier
                .classify_request(&method, &path)
                .filter(|c| layer.record_reads || c.action != AuditAction::Read);

            let Some(classification) = classification else {
                return inner.call(request).await;
            };

            let actor = request.extensions().get::<Identity>().cloned();
            let ip_address = client_ip(&request);
            let user_agent = request
                .headers()
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            let mut response = inner.call(request).await?;
            let status = response.status();
            let overrides = response
                .extensions_mut()
                .remove::<AuditOverrides>()
                .unwrap_or_default();

            if !status.is_success() {
                debug!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    "Non-success response, not audited"
                );
                return Ok(response);
            }

            let classification = classification.merge(&overrides);
            let details = overrides.detail.unwrap_or_else(|| {
                json!({
                    "path": path,
                    "method": method.as_str(),
                    "status": status.as_u16(),
                })
            });

            let (user_id, username) = match actor {
                Some(identity) => (Some(identity.user_id), Some(identity.username)),
                None => (None, None),
            };

            let entry = NewAuditLog {
                user_id,
                username,
                action: classification.action,
                resource: classification.resource,
                resource_id: classification.resource_id,
                details,
                ip_address,
                user_agent,
            };

            let recorder = layer.recorder.clone();
            layer.writes.spawn(layer.telemetry.instrument(async move {
                let action = entry.action;
                let resource = entry.resource.clone();
                let resource_id = entry.resource_id;
                let user_id = entry.user_id;

                match recorder.record(entry).await {
                    Ok(audit_id) => debug!(
                        audit_id,
                        action = %action,
                        resource = %resource,
                        resource_id,
                        "Audit log entry created"
                    ),
                    Err(e) => warn!(
                        error = %e,
                        action = %action,
                        resource = %resource,
                        resource_id,
                        user_id = ?user_id,
                        "Failed to record audit log entry"
                    ),
                }
            }));

            Ok(response)
        })
    }
}

/// First hop of X-Forwarded-For, then X-Real-IP, then the peer address.
///
/// Header values count only when they parse as an IP address.
fn client_ip(request: &Request) -> Option<String> {
    forwarded_ip(request.headers()).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
    })
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip)
        .or_else(|| header("x-real-ip").and_then(parse_ip))
        .map(|ip| ip.to_string())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
