//! Curve validation
//!
//! Enforces the structural invariants every curve must satisfy before it is stored,
//! applied, or evaluated.
//!
//! # Policy
//!
//! [`Curve::new`](crate::Curve::new) sorts points defensively and then runs the strict
//! checks here, so user input in any order is accepted as long as temperatures are
//! unique. Data read back from disk is checked strictly without sorting: the store
//! always writes sorted points, so anything else means the file was edited by hand.

use std::sync::OnceLock;

use regex::Regex;

use crate::constants::limits;
use crate::data::types::{Curve, CurvePoint};
use crate::error::{AsusfanError, Result};

/// Non-fatal finding about a curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveWarning {
    /// Speed at `index` is lower than at `index - 1`; can oscillate near the crossover
    NonMonotonicSpeed { index: usize, temperature: f32 },
}

impl std::fmt::Display for CurveWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveWarning::NonMonotonicSpeed { index, temperature } => write!(
                f,
                "fan speed drops at point {} ({:.0}°C); the fan may oscillate around this temperature",
                index, temperature
            ),
        }
    }
}

/// Sort points by ascending temperature (stable, IEEE total order)
pub fn sort_points(mut points: Vec<CurvePoint>) -> Vec<CurvePoint> {
    points.sort_by(|a, b| a.temperature.total_cmp(&b.temperature));
    points
}

/// Validates curve points without reordering them
///
/// Returns the curve's warnings when it is structurally valid.
pub fn validate_curve_points(points: &[CurvePoint]) -> Result<Vec<CurveWarning>> {
    if points.len() < limits::MIN_CURVE_POINTS {
        return Err(AsusfanError::TooFewPoints { count: points.len() });
    }

    if points.len() > limits::MAX_CURVE_POINTS {
        return Err(AsusfanError::TooManyPoints {
            count: points.len(),
            max: limits::MAX_CURVE_POINTS,
        });
    }

    for (index, point) in points.iter().enumerate() {
        if !point.temperature.is_finite()
            || !(limits::MIN_CURVE_TEMPERATURE..=limits::MAX_CURVE_TEMPERATURE)
                .contains(&point.temperature)
        {
            return Err(AsusfanError::InvalidTemperature {
                index,
                value: point.temperature,
            });
        }

        if point.speed > limits::MAX_SPEED_PERCENT {
            return Err(AsusfanError::SpeedOutOfRange {
                index,
                speed: point.speed,
            });
        }
    }

    // Duplicates are reported before ordering so an unsorted list with a repeated
    // temperature gets the more useful error.
    let mut temps: Vec<f32> = points.iter().map(|p| p.temperature).collect();
    temps.sort_by(f32::total_cmp);
    if let Some(pair) = temps.windows(2).find(|w| w[0] == w[1]) {
        return Err(AsusfanError::DuplicateTemperature { temperature: pair[0] });
    }

    if let Some(index) = points
        .windows(2)
        .position(|w| w[0].temperature >= w[1].temperature)
    {
        return Err(AsusfanError::UnsortedPoints { index: index + 1 });
    }

    Ok(curve_warnings(points))
}

/// Re-check an already constructed curve
pub fn validate_curve(curve: &Curve) -> Result<Vec<CurveWarning>> {
    validate_curve_name(curve.name())?;
    validate_curve_points(curve.points())
}

pub(crate) fn curve_warnings(points: &[CurvePoint]) -> Vec<CurveWarning> {
    points
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[1].speed < w[0].speed)
        .map(|(i, w)| CurveWarning::NonMonotonicSpeed {
            index: i + 1,
            temperature: w[1].temperature,
        })
        .collect()
}

fn curve_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _.\-]*$").ok())
        .as_ref()
}

/// Validates a curve name
///
/// Names double as file names, so only letters, digits, space, `_`, `.` and `-` are
/// allowed and the first character must be alphanumeric.
pub fn validate_curve_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| AsusfanError::InvalidCurveName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name cannot be empty"));
    }

    if name.chars().count() > limits::MAX_CURVE_NAME_LEN {
        return Err(invalid(&format!(
            "name exceeds maximum length of {} characters",
            limits::MAX_CURVE_NAME_LEN
        )));
    }

    if name != name.trim() {
        return Err(invalid("name cannot start or end with whitespace"));
    }

    let pattern = curve_name_pattern().ok_or_else(|| invalid("name pattern unavailable"))?;
    if !pattern.is_match(name) {
        return Err(invalid(
            "only letters, digits, space, '_', '.' and '-' are allowed, starting with a letter or digit",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(pairs: &[(f32, u8)]) -> Vec<CurvePoint> {
        pairs.iter().copied().map(CurvePoint::from).collect()
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            validate_curve_points(&[]),
            Err(AsusfanError::TooFewPoints { count: 0 })
        ));
        assert!(matches!(
            validate_curve_points(&pts(&[(50.0, 50)])),
            Err(AsusfanError::TooFewPoints { count: 1 })
        ));
    }

    #[test]
    fn test_too_many_points() {
        let points: Vec<CurvePoint> = (0..17).map(|i| CurvePoint::new(i as f32, 50)).collect();
        assert!(matches!(
            validate_curve_points(&points),
            Err(AsusfanError::TooManyPoints { count: 17, .. })
        ));
    }

    #[test]
    fn test_duplicate_temperature() {
        let err = validate_curve_points(&pts(&[(40.0, 20), (40.0, 30)])).unwrap_err();
        assert!(matches!(err, AsusfanError::DuplicateTemperature { temperature } if temperature == 40.0));
    }

    #[test]
    fn test_unsorted_points() {
        let err = validate_curve_points(&pts(&[(70.0, 80), (30.0, 20)])).unwrap_err();
        assert!(matches!(err, AsusfanError::UnsortedPoints { index: 1 }));
    }

    #[test]
    fn test_speed_out_of_range() {
        let err = validate_curve_points(&pts(&[(30.0, 20), (70.0, 101)])).unwrap_err();
        assert!(matches!(err, AsusfanError::SpeedOutOfRange { index: 1, speed: 101 }));
    }

    #[test]
    fn test_invalid_temperature() {
        assert!(matches!(
            validate_curve_points(&pts(&[(f32::NAN, 20), (70.0, 80)])),
            Err(AsusfanError::InvalidTemperature { index: 0, .. })
        ));
        assert!(matches!(
            validate_curve_points(&pts(&[(30.0, 20), (151.0, 80)])),
            Err(AsusfanError::InvalidTemperature { index: 1, .. })
        ));
        assert!(validate_curve_points(&pts(&[(-10.0, 0), (30.0, 20)])).is_ok());
    }

    #[test]
    fn test_non_monotonic_is_warning_only() {
        let warnings = validate_curve_points(&pts(&[(30.0, 40), (50.0, 30), (70.0, 80)])).unwrap();
        assert_eq!(
            warnings,
            vec![CurveWarning::NonMonotonicSpeed { index: 1, temperature: 50.0 }]
        );
        assert!(validate_curve_points(&pts(&[(30.0, 40), (70.0, 80)])).unwrap().is_empty());
    }

    #[test]
    fn test_curve_names() {
        assert!(validate_curve_name("Gaming").is_ok());
        assert!(validate_curve_name("night mode_2.1-b").is_ok());
        assert!(validate_curve_name("").is_err());
        assert!(validate_curve_name("   ").is_err());
        assert!(validate_curve_name(" padded").is_err());
        assert!(validate_curve_name("../etc/passwd").is_err());
        assert!(validate_curve_name("a/b").is_err());
        assert!(validate_curve_name(".hidden").is_err());
        assert!(validate_curve_name(&"x".repeat(65)).is_err());
    }
}
