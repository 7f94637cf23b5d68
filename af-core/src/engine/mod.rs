//! Fan curve engine modules
//!
//! Curve evaluation and the built-in presets.

mod curve;
mod presets;

pub use curve::{evaluate, interpolate};
pub use presets::{presets, CurvePreset};
