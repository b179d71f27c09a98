//! Configuration file loading.

use std::path::Path;

use doorlock_core::LockConfig;

use crate::error::NodeError;

/// Load a JSON config file. Fields left out keep their defaults.
///
/// Durations are written as `{"secs": 2, "nanos": 0}`.
pub fn load_config(path: impl AsRef<Path>) -> Result<LockConfig, NodeError> {
    let path = path.as_ref();
    let config_error =
        |reason: String| NodeError::Config { path: path.to_path_buf(), reason };

    let text = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let config: LockConfig = serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?;

    if config.max_attempts == 0 {
        return Err(config_error("max_attempts must be at least 1".to_string()));
    }
    if config.tick_interval.is_zero() {
        return Err(config_error("tick_interval must be non-zero".to_string()));
    }
    Ok(config)
}
