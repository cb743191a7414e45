use crate::capture::CaptureCommand;
use crate::config::{Config, StorageConfig};
use crate::errors::BackupError;
use crate::metrics::BackupMetrics;
use crate::scheduler::{validate_cron_spec, CaptureOutcome};
use crate::storage;
use crate::supervisor::{FatalSignal, Subsystem};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub struct BackupScheduler {
    spec: String,
    storage: StorageConfig,
    capture: Arc<CaptureCommand>,
    metrics: Arc<BackupMetrics>,
    fatal_tx: mpsc::Sender<FatalSignal>,
    scheduler: JobScheduler,
}

impl BackupScheduler {
    /// Creates the scheduler, validating the cron spec eagerly. An invalid
    /// spec is a startup configuration error, not a first-tick surprise.
    pub async fn new(
        config: Arc<Config>,
        capture: Arc<CaptureCommand>,
        metrics: Arc<BackupMetrics>,
        fatal_tx: mpsc::Sender<FatalSignal>,
    ) -> Result<Self> {
        validate_cron_spec(&config.schedule.spec).map_err(BackupError::Config)?;

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            spec: config.schedule.spec.clone(),
            storage: config.storage.clone(),
            capture,
            metrics,
            fatal_tx,
            scheduler,
        })
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        info!(
            "Starting backup scheduler with 6-field cron spec '{}'",
            self.spec
        );

        let storage = self.storage.clone();
        let capture = self.capture.clone();
        let metrics = self.metrics.clone();
        let fatal_tx = self.fatal_tx.clone();
        // Ticks must never overlap: the underlying scheduler spawns each
        // fire independently, so a tick that finds the guard held skips.
        let in_flight = Arc::new(Mutex::new(()));

        let job = Job::new_async(self.spec.as_str(), move |_uuid, _scheduler| {
            let storage = storage.clone();
            let capture = capture.clone();
            let metrics = metrics.clone();
            let fatal_tx = fatal_tx.clone();
            let in_flight = in_flight.clone();

            Box::pin(async move {
                let Ok(_guard) = in_flight.try_lock() else {
                    warn!("Previous capture still in flight, skipping this tick");
                    return;
                };

                let tick_id = Uuid::new_v4();
                info!("Starting etcd backup tick {}", tick_id);
                metrics.record_tick();

                match run_tick(&capture, &storage).await {
                    CaptureOutcome::Success {
                        artifact,
                        command_line,
                        output,
                        elapsed,
                    } => {
                        info!("etcd backup command: {}", command_line);
                        info!(
                            "Backup '{}' ({}) completed in {:.2?}",
                            artifact,
                            output.trim(),
                            elapsed
                        );
                        metrics.record_success(elapsed);
                    }
                    CaptureOutcome::Failure(err) => {
                        error!("Backup tick {} failed: {}", tick_id, err);
                        metrics.record_failure();

                        let signal = FatalSignal {
                            subsystem: Subsystem::Scheduler,
                            error: err,
                        };
                        if fatal_tx.try_send(signal).is_err() {
                            warn!("Supervisor already shutting down, dropping fatal signal");
                        }
                    }
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create backup job for '{}': {}", self.spec, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add backup job to scheduler: {}", e))?;

        self.scheduler.start().await?;
        info!("Backup scheduler started");

        Ok(())
    }
}

/// One unit of scheduled work: prepare the storage destination, then run the
/// capture command. Either failure makes the whole tick a failure.
pub async fn run_tick(capture: &CaptureCommand, storage: &StorageConfig) -> CaptureOutcome {
    if let Err(e) = storage::prepare(storage).await {
        return CaptureOutcome::Failure(BackupError::Storage(e));
    }

    match capture.execute(storage).await {
        Ok(report) => CaptureOutcome::Success {
            artifact: report.artifact,
            command_line: report.command_line,
            output: report.output,
            elapsed: report.elapsed,
        },
        Err(e) => CaptureOutcome::Failure(BackupError::Capture(e)),
    }
}
