pub mod capture;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod scheduler;
pub mod storage;
pub mod supervisor;

// Re-export commonly used types
pub use capture::CaptureCommand;
pub use config::{Config, StorageConfig, StorageMode};
pub use errors::BackupError;
pub use metrics::BackupMetrics;
pub use scheduler::BackupScheduler;
pub use supervisor::{FatalSignal, Subsystem, Supervisor};
