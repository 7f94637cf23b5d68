//! Curve evaluation
//!
//! Maps a temperature to a fan speed by linear interpolation between the two points
//! that bracket it.
//!
//! - Below the first point: the first point's speed
//! - Above the last point: the last point's speed
//! - Exactly on a point: that point's speed
//! - Between points: linear interpolation, rounded half away from zero
//!
//! Evaluation is a pure function of `(curve, temperature)`. A NaN temperature is
//! treated as "hot" and yields the last point's speed.

use crate::data::{Curve, CurvePoint};

/// Fan speed in percent for `temperature`
pub fn evaluate(curve: &Curve, temperature: f32) -> u8 {
    let speed = interpolate(curve, temperature).round();
    // Interpolation never leaves the range spanned by two valid speeds.
    speed.clamp(0.0, f64::from(crate::constants::limits::MAX_SPEED_PERCENT)) as u8
}

/// Unrounded fan speed for `temperature`
pub fn interpolate(curve: &Curve, temperature: f32) -> f64 {
    interpolate_points(curve.points(), temperature)
}

fn interpolate_points(points: &[CurvePoint], temperature: f32) -> f64 {
    debug_assert!(points.len() >= 2, "curve with fewer than two points");
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return f64::from(crate::constants::limits::MAX_SPEED_PERCENT),
    };

    if temperature.is_nan() || temperature >= last.temperature {
        return f64::from(last.speed);
    }
    if temperature <= first.temperature {
        return f64::from(first.speed);
    }

    // First index whose temperature exceeds the input; 1..len by the checks above.
    let upper_idx = points.partition_point(|p| p.temperature <= temperature);
    let lower = &points[upper_idx - 1];
    let upper = &points[upper_idx];

    if lower.temperature == temperature {
        return f64::from(lower.speed);
    }

    let t = f64::from(temperature);
    let (t0, t1) = (f64::from(lower.temperature), f64::from(upper.temperature));
    let (s0, s1) = (f64::from(lower.speed), f64::from(upper.speed));

    s0 + (s1 - s0) * (t - t0) / (t1 - t0)
}
