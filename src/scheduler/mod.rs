//! Cron-based scheduling for automated etcd backups
//!
//! Binds the configured 6-field cron expression (sec min hour day month dow)
//! to the backup work unit: prepare the storage destination, run the capture
//! command, log and record the outcome. Schedule expressions are validated
//! eagerly at construction, so a bad spec refuses to start instead of failing
//! on the first tick.

pub mod operations;
pub use operations::{run_tick, BackupScheduler};

use crate::errors::{BackupError, ConfigError};
use std::time::Duration;

/// Outcome of one fired schedule tick. Ephemeral: logged, counted, and for
/// failures forwarded to the supervisor; never persisted.
#[derive(Debug)]
pub enum CaptureOutcome {
    Success {
        artifact: String,
        command_line: String,
        output: String,
        elapsed: Duration,
    },
    Failure(BackupError),
}

/// Validates a 6-field cron expression: second minute hour day month dayofweek.
pub fn validate_cron_spec(spec: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = spec.split_whitespace().collect();

    if parts.len() != 6 {
        return Err(ConfigError::InvalidCronSpec {
            spec: spec.to_string(),
            reason: format!(
                "expected 6 fields (second minute hour day month dayofweek), got {}",
                parts.len()
            ),
        });
    }

    let fields = [
        (parts[0], "second", 0u32, 59u32),
        (parts[1], "minute", 0, 59),
        (parts[2], "hour", 0, 23),
        (parts[3], "day", 1, 31),
        (parts[4], "month", 1, 12),
        (parts[5], "dayofweek", 0, 7),
    ];

    for (field, name, min, max) in fields {
        validate_cron_field(field, name, min, max).map_err(|reason| {
            ConfigError::InvalidCronSpec {
                spec: spec.to_string(),
                reason,
            }
        })?;
    }

    Ok(())
}

fn validate_cron_field(field: &str, name: &str, min: u32, max: u32) -> Result<(), String> {
    if field == "*" || field == "?" {
        return Ok(());
    }

    if let Some((start, end)) = field.split_once('-') {
        let start = start
            .parse::<u32>()
            .map_err(|_| format!("invalid {} range start: {}", name, start))?;
        let end = end
            .parse::<u32>()
            .map_err(|_| format!("invalid {} range end: {}", name, end))?;

        if start < min || start > max || end < min || end > max {
            return Err(format!(
                "{} range {}-{} is outside valid range {}-{}",
                name, start, end, min, max
            ));
        }
        return Ok(());
    }

    if field.contains(',') {
        for part in field.split(',') {
            let value = part
                .parse::<u32>()
                .map_err(|_| format!("invalid {} value in list: {}", name, part))?;
            if value < min || value > max {
                return Err(format!(
                    "{} value {} is outside valid range {}-{}",
                    name, value, min, max
                ));
            }
        }
        return Ok(());
    }

    if let Some(step_str) = field.strip_prefix("*/") {
        let step = step_str
            .parse::<u32>()
            .map_err(|_| format!("invalid {} step value: {}", name, step_str))?;
        if step == 0 {
            return Err(format!("{} step value cannot be 0", name));
        }
        return Ok(());
    }

    let value = field
        .parse::<u32>()
        .map_err(|_| format!("invalid {} value: {}", name, field))?;

    if value < min || value > max {
        return Err(format!(
            "{} value {} is outside valid range {}-{}",
            name, value, min, max
        ));
    }

    Ok(())
}
