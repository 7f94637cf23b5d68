//! Constants and configuration values for asusfan
//!
//! Centralizes all magic numbers, paths, and configuration defaults.
//! Add new values here rather than inlining them in other modules.

/// File system locations
pub mod paths {
    use std::path::PathBuf;

    /// Application directory name under the user's config dir
    pub const APP_DIR: &str = "asusfan";

    /// Curve store directory name under the app dir
    pub const CURVES_DIR: &str = "curves";

    /// Preferences file name under the app dir
    pub const PREFERENCES_FILE: &str = "preferences.json";

    /// Extension of persisted curve records
    pub const CURVE_EXTENSION: &str = "json";

    /// Suffix appended to deleted curve files
    pub const DELETED_SUFFIX: &str = "deleted";

    /// Suffix of unreadable records moved aside by an overwrite
    pub const CORRUPT_SUFFIX: &str = "corrupt";

    /// Marker written once presets have been copied into a profile
    pub const SEEDED_MARKER: &str = ".seeded";

    /// User configuration directory
    ///
    /// Resolution order: `XDG_CONFIG_HOME`, `HOME/.config`, then the platform default
    /// from `dirs`. Returns `<base>/asusfan`.
    pub fn user_config_dir() -> Option<PathBuf> {
        let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(xdg))
        } else if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".config"))
        } else {
            dirs::config_dir()
        };

        base.map(|p| p.join(APP_DIR))
    }
}

/// Curve structure limits
pub mod limits {
    /// Minimum number of points in a curve
    pub const MIN_CURVE_POINTS: usize = 2;

    /// Maximum number of curve points
    pub const MAX_CURVE_POINTS: usize = 16;

    /// Minimum valid temperature for curve points (°C)
    pub const MIN_CURVE_TEMPERATURE: f32 = -40.0;

    /// Maximum valid temperature for curve points (°C)
    pub const MAX_CURVE_TEMPERATURE: f32 = 150.0;

    /// Maximum fan speed percentage
    pub const MAX_SPEED_PERCENT: u8 = 100;

    /// Maximum curve name length
    pub const MAX_CURVE_NAME_LEN: usize = 64;

    /// Largest curve record accepted when loading (64KB)
    pub const MAX_RECORD_SIZE: u64 = 64 * 1024;
}

/// Device adapter timing
pub mod device {
    /// Default wait for an active-curve query before giving up
    pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 2_000;

    /// Default wait for a curve to be applied
    pub const DEFAULT_APPLY_TIMEOUT_MS: u64 = 10_000;

    /// Upper bound accepted for either timeout
    pub const MAX_TIMEOUT_MS: u64 = 60_000;

    /// Points per curve expected by the vendor utility
    pub const VENDOR_POINT_COUNT: usize = 8;
}

/// Telemetry aggregation parameters
pub mod metrics {
    /// Default averaging window presented to consumers (seconds)
    pub const DEFAULT_WINDOW_SECS: u32 = 60;

    /// Largest averaging window a consumer may request (seconds)
    pub const MAX_WINDOW_SECS: u32 = 300;

    /// Default sample retention; the largest window plus headroom (seconds)
    pub const DEFAULT_RETENTION_SECS: u32 = 360;

    /// Hard cap on samples kept per series regardless of age
    pub const DEFAULT_MAX_SAMPLES: usize = 10_000;

    /// Bits per byte, for throughput conversion
    pub const BITS_PER_BYTE: f64 = 8.0;

    /// Bits per megabit
    pub const BITS_PER_MEGABIT: f64 = 1_000_000.0;
}

/// Preset curve tables (°C, percent)
pub mod default_curve {
    /// Linear ramp from 20% at 30°C to 100% at 90°C
    pub const BALANCED: &[(f32, u8)] = &[
        (30.0, 20),
        (40.0, 33),
        (50.0, 47),
        (60.0, 60),
        (70.0, 73),
        (80.0, 87),
        (85.0, 93),
        (90.0, 100),
    ];

    /// Reaches full speed by 55°C
    pub const AGGRESSIVE: &[(f32, u8)] = &[
        (30.0, 40),
        (40.0, 60),
        (50.0, 80),
        (55.0, 100),
        (60.0, 100),
        (70.0, 100),
        (80.0, 100),
        (90.0, 100),
    ];

    /// Stays low until the top of the range
    pub const QUIET: &[(f32, u8)] = &[
        (30.0, 15),
        (40.0, 15),
        (50.0, 20),
        (60.0, 20),
        (70.0, 25),
        (80.0, 30),
        (85.0, 45),
        (90.0, 60),
    ];

    /// Lower than quiet at the bottom, steady climb to 75%
    pub const SILENT: &[(f32, u8)] = &[
        (30.0, 15),
        (40.0, 20),
        (50.0, 25),
        (60.0, 35),
        (70.0, 45),
        (80.0, 55),
        (85.0, 65),
        (90.0, 75),
    ];

    /// Starts at 40% and tops out from 85°C
    pub const PERFORMANCE: &[(f32, u8)] = &[
        (30.0, 40),
        (40.0, 50),
        (50.0, 60),
        (60.0, 70),
        (70.0, 80),
        (80.0, 90),
        (85.0, 100),
        (90.0, 100),
    ];

    /// Full speed from 54°C
    pub const CONSERVATIVE: &[(f32, u8)] = &[
        (30.0, 30),
        (40.0, 40),
        (50.0, 60),
        (54.0, 100),
        (60.0, 100),
        (70.0, 100),
        (80.0, 100),
        (90.0, 100),
    ];

    /// Quietest curve, never above 70%
    pub const SHUSH: &[(f32, u8)] = &[
        (30.0, 10),
        (40.0, 15),
        (50.0, 20),
        (60.0, 30),
        (70.0, 40),
        (80.0, 50),
        (85.0, 60),
        (90.0, 70),
    ];

    /// 100% everywhere
    pub const FULL_SPEED: &[(f32, u8)] = &[
        (30.0, 100),
        (40.0, 100),
        (50.0, 100),
        (60.0, 100),
        (70.0, 100),
        (80.0, 100),
        (85.0, 100),
        (90.0, 100),
    ];
}
