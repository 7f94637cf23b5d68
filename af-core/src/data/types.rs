//! Core data types for asusfan
//!
//! Curves are immutable once built. The only way to obtain a [`Curve`] is through
//! [`Curve::new`] (or deserialization, which routes through it), so every curve that
//! reaches the engine has already passed the validator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::device as device_const;
use crate::data::validation::{sort_points, validate_curve_name, validate_curve_points, CurveWarning};
use crate::error::{AsusfanError, Result};

/// Operating profile a curve belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Balanced,
    Quiet,
    Performance,
}

impl Profile {
    /// Every profile, in display order
    pub const ALL: [Profile; 3] = [Profile::Balanced, Profile::Quiet, Profile::Performance];

    /// Lowercase identifier used in file paths and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Balanced => "balanced",
            Profile::Quiet => "quiet",
            Profile::Performance => "performance",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = AsusfanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(Profile::Balanced),
            "quiet" => Ok(Profile::Quiet),
            "performance" => Ok(Profile::Performance),
            _ => Err(AsusfanError::UnknownProfile(s.to_string())),
        }
    }
}

/// A point on a fan curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Temperature in °C
    pub temperature: f32,
    /// Fan speed in percent (0-100)
    pub speed: u8,
}

impl CurvePoint {
    pub fn new(temperature: f32, speed: u8) -> Self {
        Self { temperature, speed }
    }
}

impl From<(f32, u8)> for CurvePoint {
    fn from((temperature, speed): (f32, u8)) -> Self {
        Self { temperature, speed }
    }
}

/// A validated, named temperature→speed curve for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveParts")]
pub struct Curve {
    name: String,
    profile: Profile,
    points: Vec<CurvePoint>,
}

/// Unvalidated shape used only to route deserialization through [`Curve::new`]
#[derive(Deserialize)]
struct CurveParts {
    name: String,
    profile: Profile,
    points: Vec<CurvePoint>,
}

impl TryFrom<CurveParts> for Curve {
    type Error = AsusfanError;

    fn try_from(parts: CurveParts) -> Result<Self> {
        Curve::new(parts.name, parts.profile, parts.points)
    }
}

impl Curve {
    /// Build a curve, sorting the points by temperature and validating them
    ///
    /// Fails with the validator's error; non-fatal findings are available from
    /// [`Curve::warnings`].
    pub fn new(name: impl Into<String>, profile: Profile, points: Vec<CurvePoint>) -> Result<Self> {
        let name = name.into();
        validate_curve_name(&name)?;

        let points = sort_points(points);
        validate_curve_points(&points)?;

        Ok(Self { name, profile, points })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Points in strictly increasing temperature order
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Non-fatal findings such as speed decreasing with temperature
    pub fn warnings(&self) -> Vec<CurveWarning> {
        crate::data::validation::curve_warnings(&self.points)
    }

    /// Same points under a different name
    pub fn renamed(&self, name: impl Into<String>) -> Result<Self> {
        Curve::new(name, self.profile, self.points.clone())
    }

    /// Same name and points, assigned to another profile
    pub fn for_profile(&self, profile: Profile) -> Self {
        Self {
            name: self.name.clone(),
            profile,
            points: self.points.clone(),
        }
    }

    /// Same name and profile with new points
    pub fn with_points(&self, points: Vec<CurvePoint>) -> Result<Self> {
        Curve::new(self.name.clone(), self.profile, points)
    }

    /// Render points in the vendor utility's syntax: `30c:20%,40c:25%,...`
    ///
    /// Temperatures are rounded to whole degrees.
    pub fn to_device_data(&self) -> String {
        self.points
            .iter()
            .map(|p| format!("{}c:{}%", p.temperature.round() as i32, p.speed))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the vendor utility's point syntax into a curve
    ///
    /// Accepts `30c:20%,40c:25%` as well as the older whitespace form `30 20 40 25`.
    pub fn parse_device_data(name: impl Into<String>, profile: Profile, data: &str) -> Result<Self> {
        let data = data.trim();
        let mut points = Vec::with_capacity(device_const::VENDOR_POINT_COUNT);

        if data.contains("c:") {
            for entry in data.split(',') {
                let entry = entry.trim();
                let (temp, speed) = entry
                    .split_once("c:")
                    .ok_or_else(|| AsusfanError::device(format!("invalid curve point {:?}", entry)))?;
                points.push(CurvePoint::new(
                    parse_device_number(temp)?,
                    parse_device_speed(speed.trim_end_matches('%'))?,
                ));
            }
        } else {
            let parts: Vec<&str> = data.split_whitespace().collect();
            if parts.len() % 2 != 0 {
                return Err(AsusfanError::device(
                    "curve data must contain temperature/speed pairs",
                ));
            }
            for pair in parts.chunks(2) {
                points.push(CurvePoint::new(
                    parse_device_number(pair[0])?,
                    parse_device_speed(pair[1])?,
                ));
            }
        }

        Curve::new(name, profile, points)
    }
}

fn parse_device_number(s: &str) -> Result<f32> {
    s.trim()
        .parse::<f32>()
        .map_err(|e| AsusfanError::device(format!("invalid temperature {:?}: {}", s, e)))
}

fn parse_device_speed(s: &str) -> Result<u8> {
    s.trim()
        .parse::<u8>()
        .map_err(|e| AsusfanError::device(format!("invalid speed {:?}: {}", s, e)))
}

/// Persisted form of a curve
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRecord {
    pub curve: Curve,
    /// Unix seconds
    pub created_at: u64,
    /// Unix seconds
    pub updated_at: u64,
    pub is_preset: bool,
}

impl CurveRecord {
    /// New record stamped with the current time
    pub fn new(curve: Curve, is_preset: bool) -> Self {
        let now = current_timestamp();
        Self {
            curve,
            created_at: now,
            updated_at: now,
            is_preset,
        }
    }

    /// Replace the curve, keeping the creation time
    ///
    /// An edited preset copy is a user curve from then on.
    pub fn revised(&self, curve: Curve) -> Self {
        Self {
            curve,
            created_at: self.created_at,
            updated_at: current_timestamp().max(self.created_at),
            is_preset: false,
        }
    }

    pub fn profile(&self) -> Profile {
        self.curve.profile()
    }

    pub fn name(&self) -> &str {
        self.curve.name()
    }
}

pub(crate) fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
