use crate::domain::{error::ApiError, ports::Transport, request::ApiRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, instrument, warn};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed request.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// HTTP method, e.g. "GET".
    pub method: &'static str,
    /// Request path relative to the API base URL.
    pub path: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Whether the request ended in an error.
    pub failed: bool,
}

/// Accumulated request timings for one CLI invocation.
///
/// Shared across clones of the decorator via `Arc<Mutex<_>>`. After the run,
/// pass to [`crate::presentation::cli_summary::print_perf_summary`].
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_ms: u128,
    pub failures: usize,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn requests(&self) -> usize {
        self.timings.len()
    }

    pub fn total_ms(&self) -> u128 {
        self.total_ms
    }

    fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            if timing.failed {
                r.failures += 1;
            }
            r.timings.push(timing);
        }
    }
}

// ─── MonitoringTransport ─────────────────────────────────────────────────────

/// Decorator: wraps any `Transport`, measures wall time per request, and
/// appends the result to the shared `PerfReport`.
pub struct MonitoringTransport {
    inner: Arc<dyn Transport>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringTransport {
    pub fn new(inner: Arc<dyn Transport>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

#[async_trait]
impl Transport for MonitoringTransport {
    #[instrument(
        name = "http_request",
        skip(self, request),
        fields(http.method = request.method.as_str(), http.path = %request.path),
        level = "info"
    )]
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let method = request.method.as_str();
        let path = request.path.clone();
        let start = Instant::now();
        let result = self.inner.send(request).await;
        let duration_ms = start.elapsed().as_millis();

        match &result {
            Ok(_) => info!(method, path = %path, duration_ms, "request completed"),
            Err(e) => warn!(method, path = %path, duration_ms, error = %e, "request failed"),
        }

        PerfReport::record(
            &self.report,
            OpTiming {
                method,
                path,
                duration_ms,
                failed: result.is_err(),
            },
        );

        result
    }
}
