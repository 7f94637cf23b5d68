//! User preferences
//!
//! Stored as JSON at `<config_dir>/asusfan/preferences.json`, separate from the curve
//! store. Missing fields take their defaults so older files keep loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{device as device_const, metrics as metrics_const, paths};
use crate::data::{default_curves_dir, write_atomic};
use crate::error::{AsusfanError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Trailing window for displayed metric averages, 0-300 seconds
    #[serde(default = "default_averaging_window")]
    pub averaging_window_seconds: u32,

    /// How long metric samples are kept; at least the largest averaging window
    #[serde(default = "default_retention")]
    pub metrics_retention_seconds: u32,

    #[serde(default = "default_query_timeout")]
    pub device_query_timeout_ms: u64,

    #[serde(default = "default_apply_timeout")]
    pub device_apply_timeout_ms: u64,

    /// Curve store location; `<config_dir>/asusfan/curves` when unset
    #[serde(default)]
    pub curves_dir: Option<PathBuf>,
}

fn default_averaging_window() -> u32 {
    metrics_const::DEFAULT_WINDOW_SECS
}

fn default_retention() -> u32 {
    metrics_const::DEFAULT_RETENTION_SECS
}

fn default_query_timeout() -> u64 {
    device_const::DEFAULT_QUERY_TIMEOUT_MS
}

fn default_apply_timeout() -> u64 {
    device_const::DEFAULT_APPLY_TIMEOUT_MS
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            averaging_window_seconds: default_averaging_window(),
            metrics_retention_seconds: default_retention(),
            device_query_timeout_ms: default_query_timeout(),
            device_apply_timeout_ms: default_apply_timeout(),
            curves_dir: None,
        }
    }
}

impl Preferences {
    /// Directory of the curve store these preferences point at
    pub fn curves_root(&self) -> Result<PathBuf> {
        match &self.curves_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_curves_dir(),
        }
    }
}

/// Reject values outside their allowed ranges
pub fn validate_preferences(prefs: &Preferences) -> Result<()> {
    let invalid = |field: &str, reason: String| AsusfanError::InvalidConfig {
        field: field.to_string(),
        reason,
    };

    if prefs.averaging_window_seconds > metrics_const::MAX_WINDOW_SECS {
        return Err(invalid(
            "averaging_window_seconds",
            format!("must be between 0 and {}", metrics_const::MAX_WINDOW_SECS),
        ));
    }

    if prefs.metrics_retention_seconds < metrics_const::MAX_WINDOW_SECS {
        return Err(invalid(
            "metrics_retention_seconds",
            format!("must be at least {}", metrics_const::MAX_WINDOW_SECS),
        ));
    }

    for (field, value) in [
        ("device_query_timeout_ms", prefs.device_query_timeout_ms),
        ("device_apply_timeout_ms", prefs.device_apply_timeout_ms),
    ] {
        if value == 0 || value > device_const::MAX_TIMEOUT_MS {
            return Err(invalid(
                field,
                format!("must be between 1 and {}", device_const::MAX_TIMEOUT_MS),
            ));
        }
    }

    if let Some(dir) = &prefs.curves_dir {
        if dir.as_os_str().is_empty() {
            return Err(invalid("curves_dir", "cannot be empty".to_string()));
        }
    }

    Ok(())
}

pub fn get_preferences_path() -> Result<PathBuf> {
    paths::user_config_dir()
        .map(|dir| dir.join(paths::PREFERENCES_FILE))
        .ok_or_else(|| AsusfanError::config("Could not determine config directory"))
}

/// Load preferences from the default location
pub fn load_preferences() -> Result<Preferences> {
    load_preferences_from(&get_preferences_path()?)
}

/// Load preferences from `path`, returning defaults if the file does not exist
pub fn load_preferences_from(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        debug!("No preferences at {:?}, using defaults", path);
        return Ok(Preferences::default());
    }

    let content = fs::read_to_string(path).map_err(|e| AsusfanError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let prefs: Preferences = serde_json::from_str(&content)
        .map_err(|e| AsusfanError::config(format!("Failed to parse preferences JSON: {}", e)))?;

    validate_preferences(&prefs)?;
    Ok(prefs)
}

/// Save preferences to the default location
pub fn save_preferences(prefs: &Preferences) -> Result<()> {
    save_preferences_to(&get_preferences_path()?, prefs)
}

pub fn save_preferences_to(path: &Path, prefs: &Preferences) -> Result<()> {
    validate_preferences(prefs)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AsusfanError::WriteFailure {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let json = serde_json::to_string_pretty(prefs)?;
    write_atomic(path, json.as_bytes())?;

    info!("Saved preferences to {:?}", path);
    Ok(())
}

/// Load, modify, validate and save preferences in one step
pub fn update_preferences<F>(updater: F) -> Result<Preferences>
where
    F: FnOnce(&mut Preferences),
{
    let mut prefs = load_preferences()?;
    updater(&mut prefs);
    save_preferences(&prefs)?;
    Ok(prefs)
}
