//! Data types, persistence, and validation modules

mod persistence;
mod types;
mod validation;

pub use persistence::{default_curves_dir, CurveStore, DeleteConfirmation};
pub(crate) use persistence::write_atomic;
pub use types::{Curve, CurvePoint, CurveRecord, Profile};
pub use validation::{
    sort_points, validate_curve, validate_curve_name, validate_curve_points, CurveWarning,
};
