use warptps_image::{Image, ImageDtype};
use warptps_tps::{DisplacementField, Evaluator, LandmarkSet, Point, TpsParameters, TpsTransform};

use crate::{error::WarpError, interpolation::bilinear_interpolation, parallel};

/// How a warp obtains the displacement of each output pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResampleMode {
    /// Sample the cached full-strength displacement field.
    #[default]
    Field,
    /// Evaluate the spline at every pixel.
    Direct,
}

fn check_same_size<T, const C: usize>(
    src: &Image<T, C>,
    dst: &Image<T, C>,
) -> Result<(), WarpError> {
    if src.size() != dst.size() {
        return Err(WarpError::ImageSizeMismatch(src.size(), dst.size()));
    }
    Ok(())
}

/// Sample `src` at the displaced position of output pixel `(x, y)`.
#[inline]
fn sample_displaced<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    x: usize,
    y: usize,
    offset: [f64; 2],
    dst_pixel: &mut [T],
) {
    let u = (x as f64 - offset[0]) as f32;
    let v = (y as f64 - offset[1]) as f32;
    let pixel = bilinear_interpolation(src, u, v);
    for (d, p) in dst_pixel.iter_mut().zip(pixel) {
        *d = T::from_f32(p);
    }
}

/// Warp an image with a precomputed displacement field.
///
/// Output pixel `q` samples `src` at `q - percent * field[q]`. A `percent` of zero
/// copies the source unchanged.
///
/// # Arguments
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image, same shape as `src`.
/// * `field` - Full-strength displacements sampled on the image grid.
/// * `percent` - Strength of the warp, extrapolating outside `[0, 1]`.
///
/// # Errors
///
/// The images must share a size and the field must cover that size.
pub fn resample_with_field<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    field: &DisplacementField,
    percent: f64,
) -> Result<(), WarpError> {
    check_same_size(src, dst)?;
    if !field.matches_size(src.width(), src.height()) {
        return Err(WarpError::FieldSizeMismatch(
            field.width(),
            field.height(),
            src.size(),
        ));
    }

    let displacements = field.as_slice();
    let cols = src.cols();

    parallel::par_iter_rows_indexed(dst, |x, y, dst_pixel| {
        let [dx, dy] = displacements[y * cols + x];
        let offset = [percent * dx as f64, percent * dy as f64];
        sample_displaced(src, x, y, offset, dst_pixel);
    });

    Ok(())
}

/// Warp an image by evaluating the spline at every output pixel.
///
/// Same mapping as [`resample_with_field`] without building a field first.
///
/// # Errors
///
/// The images must share a size and the evaluator must accept 2d points.
pub fn resample<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    evaluator: &Evaluator<'_>,
    percent: f64,
) -> Result<(), WarpError> {
    check_same_size(src, dst)?;
    if let Some(dim) = evaluator.dim().filter(|&d| d != 2) {
        return Err(warptps_tps::TpsError::DimensionMismatch {
            expected: 2,
            actual: dim,
        }
        .into());
    }

    parallel::par_iter_rows_indexed(dst, |x, y, dst_pixel| {
        let offset = evaluator.eval_xy(x as f64, y as f64, percent);
        sample_displaced(src, x, y, offset, dst_pixel);
    });

    Ok(())
}

/// Warp an image with a transform, allocating the output.
///
/// # Arguments
///
/// * `transform` - The transform to apply; solved and cached on demand.
/// * `src` - The input image.
/// * `percent` - Strength of the warp.
/// * `mode` - Whether to go through the cached displacement field.
///
/// # Errors
///
/// Fails for 3d landmarks and for degenerate landmark configurations.
pub fn warp_tps<const C: usize>(
    transform: &mut TpsTransform,
    src: &Image<u8, C>,
    percent: f64,
    mode: ResampleMode,
) -> Result<Image<u8, C>, WarpError> {
    let mut dst = Image::from_size_val(src.size(), 0u8)?;

    match mode {
        ResampleMode::Field => {
            let field = transform.field(src.width(), src.height())?;
            resample_with_field(src, &mut dst, field, percent)?;
        }
        ResampleMode::Direct => {
            let evaluator = transform.evaluator()?;
            resample(src, &mut dst, &evaluator, percent)?;
        }
    }

    Ok(dst)
}

/// Warp an image from landmark arrays in one call.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `sources` - Landmark positions in `src`.
/// * `dests` - Where each source landmark moves to at full strength.
/// * `percent` - Strength of the warp.
/// * `params` - Kernel parameters.
///
/// # Errors
///
/// Fails for mismatched landmark arrays, 3d landmarks and degenerate configurations.
pub fn warp_image<const C: usize>(
    src: &Image<u8, C>,
    sources: &[Point],
    dests: &[Point],
    percent: f64,
    params: TpsParameters,
) -> Result<Image<u8, C>, WarpError> {
    let landmarks = LandmarkSet::from_points(sources, dests)?;
    let mut transform = TpsTransform::from_landmarks(landmarks, params)?;
    warp_tps(&mut transform, src, percent, ResampleMode::Field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warptps_image::ImageSize;
    use warptps_tps::TpsError;

    fn gradient(width: usize, height: usize) -> Result<Image<u8, 3>, WarpError> {
        let data = (0..height)
            .flat_map(|y| {
                (0..width).flat_map(move |x| {
                    [
                        (x * 7 % 256) as u8,
                        (y * 11 % 256) as u8,
                        ((x + y) * 3 % 256) as u8,
                    ]
                })
            })
            .collect();
        Ok(Image::new(ImageSize { width, height }, data)?)
    }

    fn pulled_center(width: f64, height: f64) -> Result<TpsTransform, TpsError> {
        let mut transform = TpsTransform::new();
        transform.add_corners((width - 1.0, height - 1.0), (width - 1.0, height - 1.0))?;
        transform.add(
            [width / 2.0, height / 2.0].into(),
            [width / 2.0 + 3.0, height / 2.0 - 2.0].into(),
        )?;
        Ok(transform)
    }

    #[test]
    fn zero_percent_is_identity() -> Result<(), WarpError> {
        let src = gradient(24, 16)?;
        let mut transform = pulled_center(24.0, 16.0)?;
        for mode in [ResampleMode::Field, ResampleMode::Direct] {
            let warped = warp_tps(&mut transform, &src, 0.0, mode)?;
            assert_eq!(warped, src);
        }
        Ok(())
    }

    #[test]
    fn identity_transform_copies_image() -> Result<(), WarpError> {
        let src = gradient(9, 7)?;
        let mut transform = TpsTransform::new();
        let warped = warp_tps(&mut transform, &src, 1.0, ResampleMode::Field)?;
        assert_eq!(warped, src);
        Ok(())
    }

    #[test]
    fn translation_shifts_pixels() -> Result<(), WarpError> {
        let src = gradient(10, 8)?;
        let mut transform = TpsTransform::new();
        transform.add_batch(
            &[Point::Xy([0.0, 0.0]), Point::Xy([9.0, 0.0]), Point::Xy([0.0, 7.0])],
            &[Point::Xy([2.0, 1.0]), Point::Xy([11.0, 1.0]), Point::Xy([2.0, 8.0])],
        )?;
        let warped = warp_tps(&mut transform, &src, 1.0, ResampleMode::Field)?;

        // output (x, y) samples input (x - 2, y - 1)
        assert_eq!(warped.get_pixel(5, 4, 0)?, src.get_pixel(3, 3, 0)?);
        assert_eq!(warped.get_pixel(5, 4, 1)?, src.get_pixel(3, 3, 1)?);
        // positions left of the image clamp to the border
        assert_eq!(warped.get_pixel(0, 4, 0)?, src.get_pixel(0, 3, 0)?);
        Ok(())
    }

    #[test]
    fn field_and_direct_agree() -> Result<(), WarpError> {
        let src = gradient(40, 30)?;
        let mut transform = pulled_center(40.0, 30.0)?;
        for percent in [0.3, 1.0] {
            let a = warp_tps(&mut transform, &src, percent, ResampleMode::Field)?;
            let b = warp_tps(&mut transform, &src, percent, ResampleMode::Direct)?;
            for (pa, pb) in a.as_slice().iter().zip(b.as_slice()) {
                assert!((*pa as i16 - *pb as i16).abs() <= 1);
            }
        }
        Ok(())
    }

    #[test]
    fn rejects_mismatched_sizes() -> Result<(), WarpError> {
        let src = gradient(8, 8)?;
        let mut dst = gradient(8, 9)?;
        let field = DisplacementField::zeros(8, 8);
        assert!(matches!(
            resample_with_field(&src, &mut dst, &field, 1.0),
            Err(WarpError::ImageSizeMismatch(..))
        ));

        let mut dst = gradient(8, 8)?;
        let field = DisplacementField::zeros(4, 8);
        assert!(matches!(
            resample_with_field(&src, &mut dst, &field, 1.0),
            Err(WarpError::FieldSizeMismatch(4, 8, _))
        ));
        Ok(())
    }

    #[test]
    fn rejects_3d_landmarks() -> Result<(), WarpError> {
        let src = gradient(8, 8)?;
        let mut transform = TpsTransform::new();
        transform.add_point([1.0, 1.0, 1.0].into())?;
        for mode in [ResampleMode::Field, ResampleMode::Direct] {
            assert!(matches!(
                warp_tps(&mut transform, &src, 1.0, mode),
                Err(WarpError::Tps(TpsError::DimensionMismatch { .. }))
            ));
        }
        Ok(())
    }

    #[test]
    fn warp_image_rejects_uneven_landmarks() -> Result<(), WarpError> {
        let src = gradient(8, 8)?;
        let res = warp_image(&src, &[Point::Xy([1.0, 1.0])], &[], 1.0, TpsParameters::default());
        assert!(matches!(res, Err(WarpError::Tps(TpsError::LengthMismatch { .. }))));
        Ok(())
    }
}
