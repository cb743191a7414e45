//! Daemon configuration
//!
//! All settings live in a single TOML file. A missing file is not an error:
//! every section falls back to its defaults, so a bare deployment backs up
//! a local etcd to `/var/lib/etcd_backup` daily at 23:00.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub etcd: EtcdConfig,
    pub schedule: ScheduleConfig,
    pub storage: StorageConfig,
    pub capture: CaptureConfig,
    pub metrics: MetricsConfig,
}

/// Connection parameters for the etcd cluster, handed to etcdctl as-is.
/// Constructed once at startup and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdConfig {
    pub endpoint: String,
    pub cacert: String,
    pub cert: String,
    pub key: String,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:2379".to_string(),
            cacert: "/etc/etcd/ssl/ca.pem".to_string(),
            cert: "/etc/etcd/ssl/etcd.pem".to_string(),
            key: "/etc/etcd/ssl/etcd-key.pem".to_string(),
        }
    }
}

/// 6-field cron expression (sec min hour day month dow)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub spec: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            // Daily at 23:00:00
            spec: "0 0 23 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub mode: StorageMode,
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Local,
            path: "/var/lib/etcd_backup".to_string(),
        }
    }
}

/// Closed set of storage backends. The path's meaning is backend-specific:
/// a filesystem directory for `local`, an object prefix for the remote modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    Ceph,
    S3,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Local => write!(f, "local"),
            StorageMode::Ceph => write!(f, "ceph"),
            StorageMode::S3 => write!(f, "s3"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Deadline for a single etcdctl invocation. A capture that overruns it
    /// is reported as a failed tick instead of hanging the schedule.
    pub timeout_seconds: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:9100".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        match fs::read_to_string(path).await {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Config file '{}' not found, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// The daemon takes no positional arguments.
pub fn validate_args(args: &[String]) -> Result<(), ConfigError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::UnexpectedArguments {
            args: args.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.etcd.endpoint, "http://localhost:2379");
        assert_eq!(config.schedule.spec, "0 0 23 * * *");
        assert_eq!(config.storage.mode, StorageMode::Local);
        assert_eq!(config.storage.path, "/var/lib/etcd_backup");
        assert_eq!(config.capture.timeout_seconds, 300);
        assert_eq!(config.metrics.listen, "0.0.0.0:9100");
    }

    #[test]
    fn rejects_positional_arguments() {
        assert!(validate_args(&[]).is_ok());
        assert!(validate_args(&["extra".to_string()]).is_err());
    }
}
