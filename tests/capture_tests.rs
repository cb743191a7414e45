//! Tests for capture command construction and execution
//!
//! Command construction is verified against fixed instants; execution tests
//! substitute a stand-in program for etcdctl so no real cluster is needed.

use chrono::{TimeZone, Utc};
use etcd_backup::capture::CaptureCommand;
use etcd_backup::config::{EtcdConfig, StorageConfig, StorageMode};
use etcd_backup::errors::CaptureError;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use tempfile::TempDir;

fn test_etcd_config() -> EtcdConfig {
    EtcdConfig {
        endpoint: "https://etcd.internal:2379".to_string(),
        cacert: "/ssl/ca.pem".to_string(),
        cert: "/ssl/client.pem".to_string(),
        key: "/ssl/client-key.pem".to_string(),
    }
}

fn timestamp_suffix(artifact: &str) -> &str {
    let name = artifact.rsplit('/').next().unwrap();
    name.strip_prefix("etcd_")
        .and_then(|s| s.strip_suffix(".db"))
        .expect("artifact name should be etcd_<timestamp>.db")
}

#[test]
fn build_is_deterministic_for_a_fixed_instant() {
    let command = CaptureCommand::new(test_etcd_config(), Duration::from_secs(300));
    let instant = Utc.with_ymd_and_hms(2026, 8, 25, 23, 0, 0).unwrap();

    let first = command.build_at("/var/lib/etcd_backup", instant);
    let second = command.build_at("/var/lib/etcd_backup", instant);

    assert_eq!(first, second);
    assert_eq!(first.artifact, "/var/lib/etcd_backup/etcd_20260825230000.db");
    assert_eq!(first.program, "etcdctl");
    assert_eq!(
        first.args,
        vec![
            "snapshot".to_string(),
            "save".to_string(),
            "/var/lib/etcd_backup/etcd_20260825230000.db".to_string(),
            "--endpoints=https://etcd.internal:2379".to_string(),
            "--cacert=/ssl/ca.pem".to_string(),
            "--cert=/ssl/client.pem".to_string(),
            "--key=/ssl/client-key.pem".to_string(),
        ]
    );
}

#[test]
fn timestamp_suffix_matches_format() {
    let command = CaptureCommand::new(test_etcd_config(), Duration::from_secs(300));
    let prepared = command.build("/var/lib/etcd_backup");

    let suffix = timestamp_suffix(&prepared.artifact);
    assert_eq!(suffix.len(), 14, "suffix should be YYYYMMDDHHMMSS");
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn timestamp_suffix_increases_across_ticks() {
    let command = CaptureCommand::new(test_etcd_config(), Duration::from_secs(300));
    let first_tick = Utc.with_ymd_and_hms(2026, 8, 25, 23, 0, 0).unwrap();
    let second_tick = Utc.with_ymd_and_hms(2026, 8, 25, 23, 0, 1).unwrap();

    let first = command.build_at("/backups", first_tick);
    let second = command.build_at("/backups", second_tick);

    assert!(timestamp_suffix(&second.artifact) > timestamp_suffix(&first.artifact));
}

#[test]
fn command_line_renders_env_and_arguments() {
    let command = CaptureCommand::new(test_etcd_config(), Duration::from_secs(300));
    let instant = Utc.with_ymd_and_hms(2026, 8, 25, 23, 0, 0).unwrap();

    let line = command.build_at("/backups", instant).command_line();
    assert_eq!(
        line,
        "ETCDCTL_API=3 etcdctl snapshot save /backups/etcd_20260825230000.db \
         --endpoints=https://etcd.internal:2379 --cacert=/ssl/ca.pem \
         --cert=/ssl/client.pem --key=/ssl/client-key.pem"
    );
}

fn local_storage(temp_dir: &TempDir) -> StorageConfig {
    StorageConfig {
        mode: StorageMode::Local,
        path: temp_dir.path().to_string_lossy().to_string(),
    }
}

#[tokio::test]
async fn successful_subprocess_produces_a_report() {
    let temp_dir = TempDir::new().unwrap();
    let command = CaptureCommand::new(test_etcd_config(), Duration::from_secs(5))
        .with_program("echo");

    let report = command.execute(&local_storage(&temp_dir)).await.unwrap();

    assert!(report.output.contains("snapshot save"));
    assert!(report.command_line.starts_with("ETCDCTL_API=3 echo snapshot save"));
    assert!(report.artifact.ends_with(".db"));
}

#[tokio::test]
async fn non_zero_exit_is_a_capture_error() {
    let temp_dir = TempDir::new().unwrap();
    let command = CaptureCommand::new(test_etcd_config(), Duration::from_secs(5))
        .with_program("false");

    let err = command.execute(&local_storage(&temp_dir)).await.unwrap_err();

    assert!(matches!(
        err,
        CaptureError::NonZeroExit { code: Some(1), .. }
    ));
}

#[tokio::test]
async fn missing_program_is_a_spawn_failure() {
    let temp_dir = TempDir::new().unwrap();
    let command = CaptureCommand::new(test_etcd_config(), Duration::from_secs(5))
        .with_program("/nonexistent/etcdctl-stand-in");

    let err = command.execute(&local_storage(&temp_dir)).await.unwrap_err();

    assert!(matches!(err, CaptureError::SpawnFailed { .. }));
}

#[tokio::test]
async fn overrunning_the_deadline_times_out() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("slow.sh");
    fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
    let mut perms = fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).unwrap();

    let command = CaptureCommand::new(test_etcd_config(), Duration::from_millis(200))
        .with_program(script.to_str().unwrap());

    let err = command.execute(&local_storage(&temp_dir)).await.unwrap_err();

    assert!(matches!(err, CaptureError::TimedOut { .. }));
}
