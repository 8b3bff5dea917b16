#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Fitted spline coefficients and their evaluation.
pub mod coefficients;

/// Error types for the tps module.
pub mod error;

/// Dense displacement fields sampled over a pixel grid.
pub mod field;

/// Landmark correspondences driving the spline.
pub mod landmarks;

/// CSV import and export of landmark sets.
pub mod landmark_csv;

/// Radial basis kernel parameters.
pub mod params;

/// 2d and 3d points.
pub mod point;

/// Linear system assembly and solve.
pub mod solver;

/// Thin-plate spline transform with lazily solved coefficients.
pub mod transform;

pub use crate::coefficients::{Evaluator, TpsCoefficients};
pub use crate::error::TpsError;
pub use crate::field::DisplacementField;
pub use crate::landmarks::{LandmarkPair, LandmarkSet};
pub use crate::params::TpsParameters;
pub use crate::point::Point;
pub use crate::transform::{SharedTpsTransform, TpsTransform};
