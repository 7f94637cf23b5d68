//! Unified error handling for asusfan
//!
//! A single error type shared by every asusfan component. Variants are grouped by
//! the layer that raises them so callers can decide what is recoverable.

use std::io;
use std::path::PathBuf;

/// Result type alias using AsusfanError
pub type Result<T> = std::result::Result<T, AsusfanError>;

/// Unified error type for all asusfan operations
#[derive(thiserror::Error, Debug)]
pub enum AsusfanError {
    // ============================================================================
    // Curve Validation Errors
    // ============================================================================
    #[error("Curve needs at least 2 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("Curve has {count} points (max {max})")]
    TooManyPoints { count: usize, max: usize },

    #[error("Duplicate temperature {temperature}°C in curve")]
    DuplicateTemperature { temperature: f32 },

    #[error("Curve points are not sorted by temperature (point {index})")]
    UnsortedPoints { index: usize },

    #[error("Point {index} has speed {speed}% (must be 0-100)")]
    SpeedOutOfRange { index: usize, speed: u8 },

    #[error("Point {index} has invalid temperature {value}°C")]
    InvalidTemperature { index: usize, value: f32 },

    #[error("Invalid curve name {name:?}: {reason}")]
    InvalidCurveName { name: String, reason: String },

    // ============================================================================
    // Persistence Errors
    // ============================================================================
    #[error("Curve {profile}/{name} not found")]
    NotFound { profile: String, name: String },

    #[error("Corrupt curve record at {path}: {reason}")]
    CorruptRecord { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {source}")]
    WriteFailure { path: PathBuf, source: io::Error },

    #[error("Failed to read file {path}: {source}")]
    FileRead { path: PathBuf, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Active Curve and Device Errors
    // ============================================================================
    #[error("Curve {profile}/{name} is applied to hardware; deletion needs confirmation")]
    ActiveCurveDeleteRefused { profile: String, name: String },

    #[error("Curve {profile}/{name} is applied to hardware; choose Save As, Discard or Force")]
    ActiveCurveOverwriteRefused { profile: String, name: String },

    #[error("Curve {profile}/{name} already exists")]
    CurveExists { profile: String, name: String },

    #[error("Device {operation} timed out after {timeout_ms} ms")]
    DeviceQueryTimeout { operation: String, timeout_ms: u64 },

    #[error("Applying {profile}/{name} did not finish within {timeout_ms} ms; the stored curve was kept and may not be on hardware yet")]
    ApplyOutcomeUnknown { profile: String, name: String, timeout_ms: u64 },

    #[error("Device error: {0}")]
    Device(String),

    // ============================================================================
    // Metrics Errors
    // ============================================================================
    #[error("Rejected sample for {metric}: {reason}")]
    InvalidSample { metric: String, reason: String },

    #[error("Averaging window {window_secs}s exceeds retention of {retention_secs}s")]
    WindowExceedsRetention { window_secs: u32, retention_secs: u32 },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}

impl AsusfanError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a device error from a string
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a corrupt record error
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors raised by curve validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::TooFewPoints { .. }
                | Self::TooManyPoints { .. }
                | Self::DuplicateTemperature { .. }
                | Self::UnsortedPoints { .. }
                | Self::SpeedOutOfRange { .. }
                | Self::InvalidTemperature { .. }
                | Self::InvalidCurveName { .. }
        )
    }

    /// True for state errors the caller can resolve by choosing differently
    /// (confirming, picking another name, or retrying the device)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ActiveCurveDeleteRefused { .. }
                | Self::ActiveCurveOverwriteRefused { .. }
                | Self::CurveExists { .. }
                | Self::DeviceQueryTimeout { .. }
                | Self::ApplyOutcomeUnknown { .. }
        )
    }
}
