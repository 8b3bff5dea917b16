use rayon::prelude::*;

use warptps_image::Image;

/// Apply a function to each pixel in the image in parallel.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }

    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pixel of the destination image in parallel, passing the
/// pixel coordinates `(x, y)`.
pub fn par_iter_rows_indexed<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .enumerate()
        .for_each(|(y, dst_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .enumerate()
                .for_each(|(x, dst_pixel)| {
                    f(x, y, dst_pixel);
                });
        });
}

/// Apply a function to each pixel in the image in parallel with two values.
pub fn par_iter_rows_val_two<T1, const C1: usize, T2, const C2: usize, T3, const C3: usize>(
    src1: &Image<T1, C1>,
    src2: &Image<T2, C2>,
    dst: &mut Image<T3, C3>,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
    T3: Clone + Send + Sync,
{
    let cols = src1.cols();
    if cols == 0 {
        return;
    }

    src1.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(src2.as_slice().par_chunks_exact(C2 * cols))
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C3 * cols))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .iter()
                .zip(src2_chunk.iter())
                .zip(dst_chunk.iter_mut())
                .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                    f(src1_pixel, src2_pixel, dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use warptps_image::{ImageError, ImageSize};

    #[test]
    fn indexed_rows_see_coordinates() -> Result<(), ImageError> {
        let mut image = Image::<usize, 2>::from_size_val(
            ImageSize {
                width: 3,
                height: 2,
            },
            0,
        )?;
        par_iter_rows_indexed(&mut image, |x, y, pixel| {
            pixel[0] = x;
            pixel[1] = y;
        });
        assert_eq!(image.as_slice(), &[0usize, 0, 1, 0, 2, 0, 0, 1, 1, 1, 2, 1]);
        Ok(())
    }

    #[test]
    fn val_two_combines_images() -> Result<(), ImageError> {
        let a = Image::<u8, 1>::new([2, 1].into(), vec![1, 2])?;
        let b = Image::<u8, 1>::new([2, 1].into(), vec![10, 20])?;
        let mut out = Image::<u8, 1>::from_size_val([2, 1].into(), 0)?;
        par_iter_rows_val_two(&a, &b, &mut out, |x, y, o| *o = x + y);
        assert_eq!(out.as_slice(), &[11u8, 22]);
        Ok(())
    }

    #[test]
    fn empty_images_are_skipped() -> Result<(), ImageError> {
        let src = Image::<u8, 1>::new([0, 4].into(), vec![])?;
        let mut dst = Image::<u8, 3>::new([0, 4].into(), vec![])?;
        par_iter_rows(&src, &mut dst, |_, _| unreachable!());
        par_iter_rows_indexed(&mut dst, |_, _, _| unreachable!());
        Ok(())
    }
}
