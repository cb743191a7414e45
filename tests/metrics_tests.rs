//! Integration tests for the metrics endpoint

use etcd_backup::errors::ExporterError;
use etcd_backup::metrics::{self, BackupMetrics};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn metrics_endpoint_serves_exposition_text() {
    let metrics = Arc::new(BackupMetrics::new());
    metrics.record_tick();
    metrics.record_success(Duration::from_secs(2));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = metrics::router(metrics.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let response = reqwest::get(format!("http://{}/metrics", addr))
        .await
        .unwrap();
    assert!(response.status().is_success());

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.unwrap();
    assert!(body.contains("etcd_backup_ticks_total 1"));
    assert!(body.contains("etcd_backup_successes_total 1"));
    assert!(body.contains("etcd_backup_last_capture_duration_seconds 2.000"));
}

#[tokio::test(flavor = "multi_thread")]
async fn occupied_port_is_a_bind_failure() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = occupied.local_addr().unwrap();

    let err = metrics::serve(&addr.to_string(), Arc::new(BackupMetrics::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, ExporterError::BindFailed { .. }));
    drop(occupied);
}
