#![deny(missing_docs)]
//! Image types and traits for warping and morphing images

/// image representation for warping purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageDtype, ImageSize};
