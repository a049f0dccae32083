//! Injected observability handle
//!
//! A [`Telemetry`] wraps a `tracing::Dispatch`. Components receive a clone at
//! construction and run their work under it, so logging never depends on an
//! ambient global and tests can hand each component its own subscriber.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;

/// Cloneable handle to a configured subscriber
#[derive(Clone)]
pub struct Telemetry {
    dispatch: Dispatch,
    // Flushes the non-blocking file writer when the last clone is dropped.
    _guard: Option<Arc<WorkerGuard>>,
}

impl Telemetry {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            _guard: None,
        }
    }

    pub(crate) fn with_guard(dispatch: Dispatch, guard: WorkerGuard) -> Self {
        Self {
            dispatch,
            _guard: Some(Arc::new(guard)),
        }
    }

    /// A handle that discards everything
    pub fn disabled() -> Self {
        Self::new(Dispatch::none())
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run a closure with this handle as the current subscriber
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Attach this handle to a future for every poll
    pub fn instrument<F: Future>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }

    /// Install this handle as the process default
    ///
    /// Only the binary should call this, once, so that crates which log
    /// through the default dispatcher (tower-http, sqlx) are captured too.
    pub fn install_global(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .context("A global subscriber is already installed")
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("file_writer", &self._guard.is_some())
            .finish()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::disabled()
    }
}
