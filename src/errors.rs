//! Custom error types for the backup daemon
//!
//! Provides structured error handling with context for the different failure
//! scenarios: startup configuration, storage preparation, capture execution
//! and the metrics exporter.

use std::fmt;

/// Main error type for the backup daemon
#[derive(Debug)]
pub enum BackupError {
    /// Configuration-related errors (detected at startup)
    Config(ConfigError),

    /// Storage destination preparation errors
    Storage(StorageError),

    /// Capture command execution errors
    Capture(CaptureError),

    /// Metrics exporter errors
    Exporter(ExporterError),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    LoadFailed { path: String, reason: String },

    /// Configuration parsing error
    ParseError { path: String, reason: String },

    /// Invalid cron schedule expression
    InvalidCronSpec { spec: String, reason: String },

    /// Positional arguments are not supported
    UnexpectedArguments { args: Vec<String> },
}

/// Storage preparation error variants
#[derive(Debug)]
pub enum StorageError {
    /// Failed to create the destination directory
    CreateFailed { path: String, reason: String },

    /// Destination path exists but is not a directory
    NotADirectory { path: String },

    /// Selected backend is not implemented
    UnimplementedBackend { mode: String },
}

/// Capture command error variants
#[derive(Debug)]
pub enum CaptureError {
    /// Subprocess could not be spawned
    SpawnFailed { program: String, reason: String },

    /// Subprocess exited with a non-zero status
    NonZeroExit { code: Option<i32>, output: String },

    /// Subprocess did not complete within the configured deadline
    TimedOut { seconds: u64 },
}

/// Metrics exporter error variants
#[derive(Debug)]
pub enum ExporterError {
    /// Failed to bind the listen address
    BindFailed { addr: String, reason: String },

    /// Server terminated with an error
    ServeFailed { reason: String },
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::Config(e) => write!(f, "Configuration error: {}", e),
            BackupError::Storage(e) => write!(f, "Storage error: {}", e),
            BackupError::Capture(e) => write!(f, "Capture error: {}", e),
            BackupError::Exporter(e) => write!(f, "Exporter error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::ParseError { path, reason } => {
                write!(f, "Failed to parse config '{}': {}", path, reason)
            }
            ConfigError::InvalidCronSpec { spec, reason } => {
                write!(f, "Invalid cron spec '{}': {}", spec, reason)
            }
            ConfigError::UnexpectedArguments { args } => {
                write!(f, "No positional arguments are supported, got: {:?}", args)
            }
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::CreateFailed { path, reason } => {
                write!(f, "Failed to create storage directory '{}': {}", path, reason)
            }
            StorageError::NotADirectory { path } => {
                write!(f, "Storage path '{}' exists but is not a directory", path)
            }
            StorageError::UnimplementedBackend { mode } => {
                write!(f, "Storage backend '{}' is not implemented", mode)
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::SpawnFailed { program, reason } => {
                write!(f, "Failed to spawn '{}': {}", program, reason)
            }
            CaptureError::NonZeroExit { code, output } => match code {
                Some(code) => write!(f, "Capture exited with code {}: {}", code, output.trim()),
                None => write!(f, "Capture terminated by signal: {}", output.trim()),
            },
            CaptureError::TimedOut { seconds } => {
                write!(f, "Capture did not complete within {} seconds", seconds)
            }
        }
    }
}

impl fmt::Display for ExporterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExporterError::BindFailed { addr, reason } => {
                write!(f, "Failed to bind metrics listener on {}: {}", addr, reason)
            }
            ExporterError::ServeFailed { reason } => {
                write!(f, "Metrics server terminated: {}", reason)
            }
        }
    }
}

impl std::error::Error for BackupError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for StorageError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for ExporterError {}

// Conversion helpers for sub-errors
impl From<ConfigError> for BackupError {
    fn from(err: ConfigError) -> Self {
        BackupError::Config(err)
    }
}

impl From<StorageError> for BackupError {
    fn from(err: StorageError) -> Self {
        BackupError::Storage(err)
    }
}

impl From<CaptureError> for BackupError {
    fn from(err: CaptureError) -> Self {
        BackupError::Capture(err)
    }
}

impl From<ExporterError> for BackupError {
    fn from(err: ExporterError) -> Self {
        BackupError::Exporter(err)
    }
}
