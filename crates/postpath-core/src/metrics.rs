//! Prometheus metrics helpers for postpath.
//!
//! The recorder is optional: without [`init_metrics`] every helper here is a
//! no-op, which keeps the engine usable in tests and embedded setups.
//!
//! # Usage
//!
//! ```rust,ignore
//! use postpath_core::metrics::{init_metrics, start_metrics_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let handle = init_metrics();
//!     start_metrics_server(9091, handle).await.unwrap();
//! }
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: `postpath_`
//! - Suffix: unit or type (`_total`, `_seconds`)
//! - Labels: bounded sets only (outcome, reason)

use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
///
/// Must be called once at startup, before any metric is recorded.
///
/// # Panics
///
/// Panics if a recorder is already installed.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    register_metrics();

    handle
}

/// Like [`init_metrics`], but returns `None` if a recorder is already
/// installed.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_metrics();
    Some(handle)
}

/// Serve `/metrics` on `port` from a background task.
///
/// Binds before returning so an unusable port is reported to the caller.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

/// Register descriptions for every metric postpath records.
fn register_metrics() {
    describe_counter!(
        "postpath_decisions_total",
        "Engine decisions by outcome (label: outcome = redirect|render|not_found)"
    );
    describe_counter!(
        "postpath_not_found_total",
        "Not-found decisions by internal reason (label: reason)"
    );
    describe_counter!(
        "postpath_backend_requests_total",
        "Outbound GraphQL requests (label: result = ok|error)"
    );
    describe_histogram!(
        "postpath_backend_request_duration_seconds",
        "Time spent waiting on the GraphQL backend"
    );
}

// =============================================================================
// Metric Recording Helpers
// =============================================================================

/// Count one engine decision.
#[inline]
pub fn record_decision(outcome: &'static str) {
    metrics::counter!("postpath_decisions_total", "outcome" => outcome).increment(1);
}

/// Count one not-found decision with its internal reason.
#[inline]
pub fn record_not_found(reason: &'static str) {
    metrics::counter!("postpath_not_found_total", "reason" => reason).increment(1);
}

/// Record one outbound backend request.
pub fn record_backend_request(elapsed: Duration, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("postpath_backend_requests_total", "result" => result).increment(1);
    metrics::histogram!("postpath_backend_request_duration_seconds").record(elapsed.as_secs_f64());
}
