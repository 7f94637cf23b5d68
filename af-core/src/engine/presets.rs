//! Built-in preset curves

use std::fmt;
use std::str::FromStr;

use crate::constants::default_curve;
use crate::data::{Curve, CurvePoint, Profile};
use crate::error::{AsusfanError, Result};

/// Preset curve profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurvePreset {
    Balanced,
    Aggressive,
    Quiet,
    Silent,
    Performance,
    Conservative,
    Shush,
    FullSpeed,
}

impl CurvePreset {
    pub const ALL: [CurvePreset; 8] = [
        CurvePreset::Balanced,
        CurvePreset::Aggressive,
        CurvePreset::Quiet,
        CurvePreset::Silent,
        CurvePreset::Performance,
        CurvePreset::Conservative,
        CurvePreset::Shush,
        CurvePreset::FullSpeed,
    ];

    /// Curve name used when the preset is stored
    pub fn name(&self) -> &'static str {
        match self {
            CurvePreset::Balanced => "balanced",
            CurvePreset::Aggressive => "aggressive",
            CurvePreset::Quiet => "quiet",
            CurvePreset::Silent => "silent",
            CurvePreset::Performance => "performance",
            CurvePreset::Conservative => "conservative",
            CurvePreset::Shush => "shush",
            CurvePreset::FullSpeed => "full-speed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CurvePreset::Balanced => "Linear 20-100% between 30°C and 90°C",
            CurvePreset::Aggressive => "Full speed from 55°C",
            CurvePreset::Quiet => "Low speeds, ramps up only above 80°C",
            CurvePreset::Silent => "15-75% with a steady climb",
            CurvePreset::Performance => "40% floor, full speed from 85°C",
            CurvePreset::Conservative => "Full speed from 54°C",
            CurvePreset::Shush => "10-70%, the quietest curve",
            CurvePreset::FullSpeed => "100% at every temperature",
        }
    }

    /// Get the curve points for this preset
    pub fn points(&self) -> Vec<CurvePoint> {
        let table = match self {
            CurvePreset::Balanced => default_curve::BALANCED,
            CurvePreset::Aggressive => default_curve::AGGRESSIVE,
            CurvePreset::Quiet => default_curve::QUIET,
            CurvePreset::Silent => default_curve::SILENT,
            CurvePreset::Performance => default_curve::PERFORMANCE,
            CurvePreset::Conservative => default_curve::CONSERVATIVE,
            CurvePreset::Shush => default_curve::SHUSH,
            CurvePreset::FullSpeed => default_curve::FULL_SPEED,
        };
        table.iter().copied().map(CurvePoint::from).collect()
    }

    /// Build this preset as a curve for `profile`
    pub fn curve(&self, profile: Profile) -> Result<Curve> {
        Curve::new(self.name(), profile, self.points())
    }
}

impl fmt::Display for CurvePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurvePreset {
    type Err = AsusfanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(CurvePreset::Balanced),
            "aggressive" => Ok(CurvePreset::Aggressive),
            "quiet" => Ok(CurvePreset::Quiet),
            "silent" => Ok(CurvePreset::Silent),
            "performance" => Ok(CurvePreset::Performance),
            "conservative" => Ok(CurvePreset::Conservative),
            "shush" => Ok(CurvePreset::Shush),
            // max and loudmouth are both 100% at every point
            "full-speed" | "fullspeed" | "full_speed" | "max" | "loudmouth" => {
                Ok(CurvePreset::FullSpeed)
            }
            _ => Err(AsusfanError::UnknownPreset(s.to_string())),
        }
    }
}

/// Every preset built for `profile`
pub fn presets(profile: Profile) -> Result<Vec<(CurvePreset, Curve)>> {
    CurvePreset::ALL
        .iter()
        .map(|preset| Ok((*preset, preset.curve(profile)?)))
        .collect()
}
