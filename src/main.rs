use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use etcd_backup::config::{self, Config};
use etcd_backup::supervisor::Supervisor;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("etcd_backup=info".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("axum=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting etcd backup daemon");

    let args: Vec<String> = std::env::args().skip(1).collect();
    config::validate_args(&args)?;

    let config_path =
        std::env::var("ETCD_BACKUP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = Arc::new(Config::load(&config_path).await?);
    info!(
        "Configuration loaded: endpoint {}, storage mode {} at '{}', schedule '{}'",
        config.etcd.endpoint, config.storage.mode, config.storage.path, config.schedule.spec
    );

    let supervisor = Supervisor::new(config);
    let signal = supervisor.run().await?;

    // First fatal signal from any subsystem terminates the process.
    error!("{} failed, shutting down: {}", signal.subsystem, signal.error);
    Err(signal.error.into())
}
