use warptps_image::{Image, ImageDtype};
use warptps_tps::{LandmarkSet, Point, TpsError, TpsParameters, TpsTransform};

use crate::{error::WarpError, parallel, warp};

/// Number of frame intervals used when none is given.
pub const DEFAULT_NUM_FRAMES: usize = 10;

/// Morphs between two images through a pair of mirrored thin-plate spline transforms.
///
/// The forward transform pulls the first image towards the landmarks of the second
/// one; the inverse transform pulls the second image back towards the first.
#[derive(Clone, Debug, Default)]
pub struct MorphEngine {
    forward: TpsTransform,
    inverse: TpsTransform,
}

impl MorphEngine {
    /// Build the forward (`landmarks1 -> landmarks2`) and inverse transforms.
    ///
    /// Both transforms are solved in parallel.
    ///
    /// # Errors
    ///
    /// Fails for mismatched landmark arrays, invalid parameters and degenerate
    /// landmark configurations.
    pub fn new(
        landmarks1: &[Point],
        landmarks2: &[Point],
        params: TpsParameters,
    ) -> Result<Self, WarpError> {
        let landmarks = LandmarkSet::from_points(landmarks1, landmarks2)?;
        let inverse = TpsTransform::from_landmarks(landmarks.inverted(), params)?;
        let forward = TpsTransform::from_landmarks(landmarks, params)?;

        let mut engine = Self { forward, inverse };
        engine.solve()?;
        Ok(engine)
    }

    /// Wrap an existing pair of transforms.
    pub fn from_transforms(forward: TpsTransform, inverse: TpsTransform) -> Self {
        Self { forward, inverse }
    }

    /// The transform from the first image towards the second.
    pub fn forward(&self) -> &TpsTransform {
        &self.forward
    }

    /// The transform from the second image towards the first.
    pub fn inverse(&self) -> &TpsTransform {
        &self.inverse
    }

    /// Add a correspondence to both transforms, mirrored in the inverse one.
    pub fn add_landmark(&mut self, point1: Point, point2: Point) -> Result<usize, WarpError> {
        let index = self.forward.add(point1, point2)?;
        self.inverse.add(point2, point1)?;
        Ok(index)
    }

    /// Pin the corners of both images, see [`LandmarkSet::add_corners`].
    pub fn add_corners(&mut self, size1: (f64, f64), size2: (f64, f64)) -> Result<(), WarpError> {
        self.forward.add_corners(size1, size2)?;
        self.inverse.add_corners(size2, size1)?;
        Ok(())
    }

    /// Set the kernel parameters of both transforms.
    pub fn set_params(&mut self, params: TpsParameters) -> Result<(), WarpError> {
        self.forward.set_params(params)?;
        self.inverse.set_params(params)?;
        Ok(())
    }

    /// Whether the inverse transform holds the forward landmarks with source and
    /// destination swapped.
    pub fn check_inverse(&self) -> bool {
        self.forward.check_inverse(&self.inverse) && self.inverse.check_inverse(&self.forward)
    }

    /// Solve both transforms in parallel.
    pub fn solve(&mut self) -> Result<(), WarpError> {
        let (forward, inverse) = rayon::join(
            || self.forward.evaluator().map(|_| ()),
            || self.inverse.evaluator().map(|_| ()),
        );
        forward?;
        inverse?;
        Ok(())
    }

    /// Build the displacement fields of both transforms for a `width` x `height` grid.
    pub fn prepare(&mut self, width: usize, height: usize) -> Result<(), WarpError> {
        let (forward, inverse) = rayon::join(
            || self.forward.field(width, height).map(|_| ()),
            || self.inverse.field(width, height).map(|_| ()),
        );
        forward?;
        inverse?;
        Ok(())
    }

    /// Render the morph frame at blend position `t`.
    ///
    /// The first image is warped by `t` towards the second, the second one by `1 - t`
    /// back towards the first, and the two are cross-dissolved with weight `t`.
    ///
    /// # Errors
    ///
    /// The images must share a size.
    pub fn frame<const C: usize>(
        &mut self,
        image1: &Image<u8, C>,
        image2: &Image<u8, C>,
        t: f64,
    ) -> Result<Image<u8, C>, WarpError> {
        if image1.size() != image2.size() {
            return Err(WarpError::ImageSizeMismatch(image1.size(), image2.size()));
        }
        let (width, height) = (image1.width(), image1.height());
        self.prepare(width, height)?;

        let forward_field = self.forward.field(width, height)?;
        let inverse_field = self.inverse.field(width, height)?;

        let mut warped1 = Image::from_size_val(image1.size(), 0u8)?;
        let mut warped2 = Image::from_size_val(image2.size(), 0u8)?;
        warp::resample_with_field(image1, &mut warped1, forward_field, t)?;
        warp::resample_with_field(image2, &mut warped2, inverse_field, 1.0 - t)?;

        let mut blended = Image::from_size_val(image1.size(), 0u8)?;
        let (w1, w2) = ((1.0 - t) as f32, t as f32);
        parallel::par_iter_rows_val_two(&warped1, &warped2, &mut blended, |a, b, out| {
            let (a, b): (f32, f32) = ((*a).into(), (*b).into());
            *out = u8::from_f32(w1 * a + w2 * b);
        });

        Ok(blended)
    }

    /// Render `num_frames + 1` frames for `t = i / num_frames`, `i = 0..=num_frames`.
    ///
    /// # Errors
    ///
    /// The images must share a size and `num_frames` must be positive.
    pub fn morph<const C: usize>(
        &mut self,
        image1: &Image<u8, C>,
        image2: &Image<u8, C>,
        num_frames: usize,
    ) -> Result<Vec<Image<u8, C>>, WarpError> {
        if image1.size() != image2.size() {
            return Err(WarpError::ImageSizeMismatch(image1.size(), image2.size()));
        }
        if num_frames == 0 {
            return Err(WarpError::InvalidParameter(
                "num_frames must be positive".to_string(),
            ));
        }

        (0..=num_frames)
            .map(|i| {
                let t = i as f64 / num_frames as f64;
                log::debug!("morph frame {}/{} (t = {:.3})", i, num_frames, t);
                self.frame(image1, image2, t)
            })
            .collect()
    }
}

/// Morph between two images in one call.
///
/// # Arguments
///
/// * `image1` - The first image, shown at `t = 0`.
/// * `image2` - The second image, shown at `t = 1`.
/// * `landmarks1` - Landmark positions in the first image.
/// * `landmarks2` - Corresponding positions in the second image.
/// * `num_frames` - Number of frame intervals, see [`DEFAULT_NUM_FRAMES`].
/// * `params` - Kernel parameters.
///
/// # Errors
///
/// The image sizes are checked before any transform is built.
pub fn morph_images<const C: usize>(
    image1: &Image<u8, C>,
    image2: &Image<u8, C>,
    landmarks1: &[Point],
    landmarks2: &[Point],
    num_frames: usize,
    params: TpsParameters,
) -> Result<Vec<Image<u8, C>>, WarpError> {
    if image1.size() != image2.size() {
        return Err(WarpError::ImageSizeMismatch(image1.size(), image2.size()));
    }
    if landmarks1.len() != landmarks2.len() {
        return Err(TpsError::LengthMismatch {
            sources: landmarks1.len(),
            dests: landmarks2.len(),
        }
        .into());
    }

    let mut engine = MorphEngine::new(landmarks1, landmarks2, params)?;
    engine.morph(image1, image2, num_frames)
}
