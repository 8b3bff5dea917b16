//! Thin-plate spline image warping.
//!
//! Warps use backward mapping: each output pixel `q` samples the source image at
//! `q - percent * displacement(q)` with bilinear interpolation.
//!
//! Warps and morphs operate on 8-bit images. The pixel type and channel count are
//! part of the image type, so an unsupported pixel encoding is a compile error
//! rather than a runtime one:
//!
//! ```compile_fail
//! use warptps_image::{Image, ImageSize};
//! use warptps_imgproc::warp::warp_image;
//! use warptps_tps::TpsParameters;
//!
//! let src = Image::<f32, 3>::from_size_val(ImageSize { width: 4, height: 4 }, 0.5).unwrap();
//! let _ = warp_image(&src, &[], &[], 1.0, TpsParameters::default());
//! ```
//!
//! Raw buffers whose length does not match `width * height * channels` are rejected
//! when the [`Image`](warptps_image::Image) is built.
//!
//! # Examples
//!
//! Pulling a single landmark while pinning the image corners:
//!
//! ```
//! use warptps_image::{Image, ImageSize};
//! use warptps_imgproc::warp::warp_image;
//! use warptps_tps::{Point, TpsParameters};
//!
//! let src = Image::<u8, 3>::from_size_val(ImageSize { width: 32, height: 24 }, 128).unwrap();
//!
//! let sources = [
//!     Point::Xy([0.0, 0.0]),
//!     Point::Xy([31.0, 0.0]),
//!     Point::Xy([0.0, 23.0]),
//!     Point::Xy([31.0, 23.0]),
//!     Point::Xy([16.0, 12.0]),
//! ];
//! let mut dests = sources;
//! dests[4] = Point::Xy([18.0, 11.0]);
//!
//! let warped = warp_image(&src, &sources, &dests, 1.0, TpsParameters::default()).unwrap();
//! assert_eq!(warped.size(), src.size());
//! ```

mod tps;

pub use tps::{resample, resample_with_field, warp_image, warp_tps, ResampleMode};
