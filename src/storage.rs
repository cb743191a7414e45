//! Storage backend preparation
//!
//! Before each capture the destination for the snapshot artifact is prepared
//! according to the configured backend. Only the local filesystem backend is
//! functional; the remote backends fail closed when selected so a
//! misconfigured deployment is caught on the first tick instead of silently
//! writing nowhere.

use crate::config::{StorageConfig, StorageMode};
use crate::errors::StorageError;
use std::io::ErrorKind;
use tokio::fs;
use tracing::debug;

/// Prepares the artifact destination for the configured backend.
///
/// For `local` this ensures the destination directory exists, creating the
/// full chain if absent. Idempotent: an existing directory is a no-op
/// success.
pub async fn prepare(config: &StorageConfig) -> Result<(), StorageError> {
    match config.mode {
        StorageMode::Local => prepare_local(&config.path).await,
        StorageMode::Ceph | StorageMode::S3 => Err(StorageError::UnimplementedBackend {
            mode: config.mode.to_string(),
        }),
    }
}

async fn prepare_local(path: &str) -> Result<(), StorageError> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {
            debug!("Storage directory '{}' already exists", path);
            Ok(())
        }
        Ok(_) => Err(StorageError::NotADirectory {
            path: path.to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Creating storage directory '{}'", path);
            fs::create_dir_all(path)
                .await
                .map_err(|e| StorageError::CreateFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
        }
        Err(e) => Err(StorageError::CreateFailed {
            path: path.to_string(),
            reason: e.to_string(),
        }),
    }
}
