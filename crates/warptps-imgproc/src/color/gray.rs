use crate::parallel;
use warptps_image::{Image, ImageError};

/// Broadcast a single channel image to three identical channels.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output RGB image.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use warptps_image::{Image, ImageSize};
/// use warptps_imgproc::color::rgb_from_gray;
///
/// let gray = Image::<u8, 1>::new(
///     ImageSize {
///         width: 2,
///         height: 1,
///     },
///     vec![7, 9],
/// )
/// .unwrap();
///
/// let mut rgb = Image::<u8, 3>::from_size_val(gray.size(), 0).unwrap();
/// rgb_from_gray(&gray, &mut rgb).unwrap();
/// assert_eq!(rgb.as_slice(), &[7u8, 7, 7, 9, 9, 9]);
/// ```
pub fn rgb_from_gray<T>(src: &Image<T, 1>, dst: &mut Image<T, 3>) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = src_pixel[0];
        dst_pixel[1] = src_pixel[0];
        dst_pixel[2] = src_pixel[0];
    });

    Ok(())
}
