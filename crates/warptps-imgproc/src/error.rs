use warptps_image::{ImageError, ImageSize};
use warptps_tps::TpsError;

/// An error type for the warping and morphing operations.
#[derive(thiserror::Error, Debug)]
pub enum WarpError {
    /// Error from fitting or evaluating the spline.
    #[error(transparent)]
    Tps(#[from] TpsError),

    /// Error from building or accessing an image.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Two images that must share a size do not.
    #[error("Image size mismatch: {0} vs {1}")]
    ImageSizeMismatch(ImageSize, ImageSize),

    /// A displacement field sampled for a different grid than the image.
    #[error("Displacement field of {0}x{1} does not cover an image of {2}")]
    FieldSizeMismatch(usize, usize, ImageSize),

    /// An invalid warping or morphing parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
