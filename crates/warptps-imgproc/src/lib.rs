#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// error types for the warping operations.
pub mod error;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallelization utilities.
pub mod parallel;

/// image morphing between two landmark sets.
pub mod morph;

/// thin-plate spline image warping module.
pub mod warp;

pub use error::WarpError;
