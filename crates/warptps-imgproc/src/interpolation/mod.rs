//! Pixel interpolation used when resampling warped images.
//!
//! Sampling positions are clamped to the image bounds, so pixels mapped outside the
//! source repeat the nearest border pixel.

mod bilinear;

pub use bilinear::bilinear_interpolation;
