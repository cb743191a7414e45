//! Process health metrics
//!
//! A small axum server bound to its own port exposing `GET /metrics` in the
//! Prometheus text exposition format. Counters are process-local atomics
//! updated by the scheduler; there are no other routes.

use crate::errors::ExporterError;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default)]
pub struct BackupMetrics {
    ticks_total: AtomicU64,
    successes_total: AtomicU64,
    failures_total: AtomicU64,
    last_duration_ms: AtomicU64,
}

impl BackupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.successes_total.fetch_add(1, Ordering::Relaxed);
        self.last_duration_ms
            .store(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Renders the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "# HELP etcd_backup_ticks_total Total number of fired backup ticks."
        );
        let _ = writeln!(out, "# TYPE etcd_backup_ticks_total counter");
        let _ = writeln!(
            out,
            "etcd_backup_ticks_total {}",
            self.ticks_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "# HELP etcd_backup_successes_total Total number of successful backups."
        );
        let _ = writeln!(out, "# TYPE etcd_backup_successes_total counter");
        let _ = writeln!(
            out,
            "etcd_backup_successes_total {}",
            self.successes_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "# HELP etcd_backup_failures_total Total number of failed backup ticks."
        );
        let _ = writeln!(out, "# TYPE etcd_backup_failures_total counter");
        let _ = writeln!(
            out,
            "etcd_backup_failures_total {}",
            self.failures_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "# HELP etcd_backup_last_capture_duration_seconds Duration of the most recent successful capture."
        );
        let _ = writeln!(out, "# TYPE etcd_backup_last_capture_duration_seconds gauge");
        let _ = writeln!(
            out,
            "etcd_backup_last_capture_duration_seconds {:.3}",
            self.last_duration_ms.load(Ordering::Relaxed) as f64 / 1000.0
        );
        out
    }
}

pub fn router(metrics: Arc<BackupMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .with_state(metrics)
}

async fn serve_metrics(State(metrics): State<Arc<BackupMetrics>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render(),
    )
}

/// Binds the listen address and serves the metrics endpoint until the
/// process exits. Bind failure (port already in use) is an exporter error
/// the supervisor treats as fatal.
pub async fn serve(listen: &str, metrics: Arc<BackupMetrics>) -> Result<(), ExporterError> {
    let listener =
        tokio::net::TcpListener::bind(listen)
            .await
            .map_err(|e| ExporterError::BindFailed {
                addr: listen.to_string(),
                reason: e.to_string(),
            })?;

    info!("Metrics exporter listening on http://{}/metrics", listen);

    axum::serve(listener, router(metrics))
        .await
        .map_err(|e| ExporterError::ServeFailed {
            reason: e.to_string(),
        })
}
