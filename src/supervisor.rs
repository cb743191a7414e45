//! Fail-fast supervision
//!
//! Runs the metrics exporter and the backup scheduler as a bounded set of
//! supervised tasks and blocks until the first tagged fatal signal arrives.
//! Any subsystem failure is equally fatal: a backup process with a broken
//! subsystem should restart under external supervision rather than limp
//! along partially functional.

use crate::capture::CaptureCommand;
use crate::config::Config;
use crate::errors::BackupError;
use crate::metrics::{self, BackupMetrics};
use crate::scheduler::BackupScheduler;
use anyhow::{anyhow, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Number of supervised subsystems; sizes the signal channel so a second
/// concurrent failure never blocks on a channel nobody reads anymore.
const SUBSYSTEM_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Scheduler,
    MetricsExporter,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subsystem::Scheduler => write!(f, "backup scheduler"),
            Subsystem::MetricsExporter => write!(f, "metrics exporter"),
        }
    }
}

/// The single value type flowing through the supervision channel: which
/// subsystem failed, and with what error.
#[derive(Debug)]
pub struct FatalSignal {
    pub subsystem: Subsystem,
    pub error: BackupError,
}

pub struct Supervisor {
    config: Arc<Config>,
    metrics: Arc<BackupMetrics>,
}

impl Supervisor {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            metrics: Arc::new(BackupMetrics::new()),
        }
    }

    /// Starts the exporter and the scheduler, then blocks until the first
    /// fatal signal and returns it. Configuration errors (invalid cron
    /// spec) surface as an `Err` before any subsystem task is spawned.
    pub async fn run(self) -> Result<FatalSignal> {
        let (fatal_tx, mut fatal_rx) = mpsc::channel::<FatalSignal>(SUBSYSTEM_COUNT);

        // Scheduler construction validates the cron spec; do it before
        // spawning anything so a bad config aborts a cold process.
        let capture = Arc::new(CaptureCommand::new(
            self.config.etcd.clone(),
            Duration::from_secs(self.config.capture.timeout_seconds),
        ));
        let scheduler = BackupScheduler::new(
            self.config.clone(),
            capture,
            self.metrics.clone(),
            fatal_tx.clone(),
        )
        .await?;

        let exporter_tx = fatal_tx.clone();
        let listen = self.config.metrics.listen.clone();
        let exporter_metrics = self.metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics::serve(&listen, exporter_metrics).await {
                let _ = exporter_tx.try_send(FatalSignal {
                    subsystem: Subsystem::MetricsExporter,
                    error: BackupError::Exporter(e),
                });
            }
        });

        scheduler.start().await?;

        drop(fatal_tx);
        fatal_rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("Fatal signal channel closed without a signal"))
    }
}
