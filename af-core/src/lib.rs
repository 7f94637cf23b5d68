//! asusfan Core Library
//!
//! Fan curve management and telemetry aggregation for laptops whose fans are driven by
//! a vendor utility.
//!
//! # Features
//!
//! - **Curves**: validated, immutable temperature→speed curves per operating profile
//! - **Engine**: pure linear interpolation from temperature to fan speed
//! - **Store**: crash-safe JSON persistence with built-in preset seeding
//! - **Guard**: the curve applied to hardware cannot be silently overwritten or deleted
//! - **Metrics**: windowed averages over age-bounded telemetry series
//!
//! # Module Structure
//!
//! - `data/` - Curve types, validation, persistence
//! - `engine/` - Curve evaluation and presets
//! - `device`, `guard` - Hardware seam and active-curve protection
//! - `metrics`, `settings` - Telemetry and user preferences
//!
//! # Example
//!
//! ```no_run
//! use af_core::{evaluate, CurvePreset, Profile};
//!
//! let curve = CurvePreset::Balanced.curve(Profile::Balanced).unwrap();
//! let speed = evaluate(&curve, 65.0);
//! ```

// Grouped modules
pub mod data;
pub mod engine;

// Standalone modules
pub mod constants;
pub mod device;
pub mod guard;
pub mod metrics;
pub mod settings;

pub use af_error as error;

// Re-export primary types from data/
pub use data::{
    default_curves_dir, sort_points, validate_curve, validate_curve_name, validate_curve_points,
    Curve, CurvePoint, CurveRecord, CurveStore, CurveWarning, DeleteConfirmation, Profile,
};

// Re-export error types
pub use error::{AsusfanError, Result};

// Re-export engine types
pub use engine::{evaluate, interpolate, presets, CurvePreset};

pub use device::{DeviceAdapter, DeviceClient, DeviceTimeouts};
pub use guard::{ActiveCurveGuard, ActiveCurveState, CurveService, OverwriteChoice, SaveOutcome};
pub use metrics::{
    Clock, ManualClock, MetricKey, MetricSample, MetricSeries, MetricsAggregator, MonotonicClock,
    ThroughputMeter,
};
pub use settings::{
    get_preferences_path, load_preferences, load_preferences_from, save_preferences,
    save_preferences_to, update_preferences, validate_preferences, Preferences,
};
