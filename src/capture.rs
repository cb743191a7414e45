//! etcd snapshot capture command
//!
//! Builds and runs the external `etcdctl snapshot save` invocation. The
//! command is assembled as a structured argument list rather than a shell
//! string, so endpoint addresses and certificate paths never pass through a
//! shell. Artifact names embed a `YYYYMMDDHHMMSS` timestamp taken at build
//! time, which keeps them unique across ticks.

use crate::config::{EtcdConfig, StorageConfig};
use crate::errors::CaptureError;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::debug;

const CAPTURE_PROGRAM: &str = "etcdctl";
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Executes point-in-time snapshots of an etcd cluster via etcdctl.
///
/// Owns the cluster connection parameters; they are immutable for the life
/// of the process.
pub struct CaptureCommand {
    etcd: EtcdConfig,
    timeout: Duration,
    program: String,
}

/// A fully assembled capture invocation: one program, one argument list,
/// one artifact path.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCapture {
    pub program: String,
    pub args: Vec<String>,
    pub artifact: String,
}

impl PreparedCapture {
    /// Rendered command line, for logging only. Execution always goes
    /// through the argument list.
    pub fn command_line(&self) -> String {
        format!("ETCDCTL_API=3 {} {}", self.program, self.args.join(" "))
    }
}

/// Result of a completed capture subprocess.
#[derive(Debug)]
pub struct CaptureReport {
    pub artifact: String,
    pub command_line: String,
    pub output: String,
    pub elapsed: Duration,
}

impl CaptureCommand {
    pub fn new(etcd: EtcdConfig, deadline: Duration) -> Self {
        Self {
            etcd,
            timeout: deadline,
            program: CAPTURE_PROGRAM.to_string(),
        }
    }

    /// Overrides the invoked program. Test hook: lets the capture run
    /// against a stand-in binary instead of etcdctl.
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    /// Assembles the invocation with the timestamp taken now.
    pub fn build(&self, storage_path: &str) -> PreparedCapture {
        self.build_at(storage_path, Utc::now())
    }

    /// Assembles the invocation for a fixed instant. The same instant
    /// always yields the same command.
    pub fn build_at(&self, storage_path: &str, now: DateTime<Utc>) -> PreparedCapture {
        let artifact = format!(
            "{}/etcd_{}.db",
            storage_path.trim_end_matches('/'),
            now.format(TIMESTAMP_FORMAT)
        );

        let args = vec![
            "snapshot".to_string(),
            "save".to_string(),
            artifact.clone(),
            format!("--endpoints={}", self.etcd.endpoint),
            format!("--cacert={}", self.etcd.cacert),
            format!("--cert={}", self.etcd.cert),
            format!("--key={}", self.etcd.key),
        ];

        PreparedCapture {
            program: self.program.clone(),
            args,
            artifact,
        }
    }

    /// Runs exactly one capture subprocess and waits for it to exit.
    ///
    /// No retry is attempted here; that policy belongs to the caller. The
    /// artifact is written by etcdctl as a side effect and is not verified
    /// after the call returns. A subprocess that overruns the configured
    /// deadline is killed and reported as `CaptureError::TimedOut`.
    pub async fn execute(&self, storage: &StorageConfig) -> Result<CaptureReport, CaptureError> {
        let prepared = self.build(&storage.path);
        debug!("Executing capture: {}", prepared.command_line());

        let mut command = AsyncCommand::new(&prepared.program);
        command
            .env("ETCDCTL_API", "3")
            .args(&prepared.args)
            .kill_on_drop(true);

        let start = Instant::now();
        let output = match timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(CaptureError::TimedOut {
                    seconds: self.timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                return Err(CaptureError::SpawnFailed {
                    program: prepared.program.clone(),
                    reason: e.to_string(),
                })
            }
            Ok(Ok(output)) => output,
        };
        let elapsed = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            let command_line = prepared.command_line();
            Ok(CaptureReport {
                artifact: prepared.artifact,
                command_line,
                output: stdout,
                elapsed,
            })
        } else {
            let detail = if !stderr.is_empty() { stderr } else { stdout };
            Err(CaptureError::NonZeroExit {
                code: output.status.code(),
                output: detail,
            })
        }
    }
}
