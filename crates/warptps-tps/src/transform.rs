use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    coefficients::{Evaluator, TpsCoefficients},
    error::TpsError,
    field::DisplacementField,
    landmarks::{LandmarkPair, LandmarkSet},
    params::TpsParameters,
    point::Point,
    solver,
};

/// Tolerance used when comparing landmarks of two transforms.
pub const LANDMARK_TOLERANCE: f64 = 1e-6;

/// A thin-plate spline transform shared between threads.
pub type SharedTpsTransform = Arc<RwLock<TpsTransform>>;

/// A thin-plate spline transform over an owned landmark set.
///
/// Coefficients and the displacement field are computed on demand and cached. Any
/// change to the landmarks or kernel parameters marks the transform dirty and drops
/// both caches.
///
/// # Examples
///
/// ```
/// use warptps_tps::{Point, TpsTransform};
///
/// let mut transform = TpsTransform::new();
/// transform.add([100.0, 100.0].into(), [110.0, 110.0].into()).unwrap();
/// transform.add([200.0, 100.0].into(), [190.0, 105.0].into()).unwrap();
/// transform.add([150.0, 200.0].into(), [150.0, 210.0].into()).unwrap();
///
/// let d = transform.eval(&Point::Xy([100.0, 100.0]), 1.0).unwrap();
/// assert!(d.approx_eq(&Point::Xy([10.0, 10.0]), 1e-6));
/// ```
#[derive(Clone, Debug, Default)]
pub struct TpsTransform {
    landmarks: LandmarkSet,
    params: TpsParameters,
    // `None` while dirty
    coefficients: Option<TpsCoefficients>,
    field: Option<DisplacementField>,
}

impl TpsTransform {
    /// Create an empty transform with default kernel parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty transform with the given kernel parameters.
    pub fn with_params(params: TpsParameters) -> Result<Self, TpsError> {
        params.validate()?;
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    /// Create a transform over an existing landmark set.
    pub fn from_landmarks(landmarks: LandmarkSet, params: TpsParameters) -> Result<Self, TpsError> {
        params.validate()?;
        Ok(Self {
            landmarks,
            params,
            ..Self::default()
        })
    }

    /// Wrap the transform for shared access across threads.
    pub fn into_shared(self) -> SharedTpsTransform {
        Arc::new(RwLock::new(self))
    }

    fn invalidate(&mut self) {
        self.coefficients = None;
        self.field = None;
    }

    /// Whether the coefficients need to be recomputed.
    pub fn is_dirty(&self) -> bool {
        self.coefficients.is_none()
    }

    /// The landmark correspondences.
    pub fn landmarks(&self) -> &LandmarkSet {
        &self.landmarks
    }

    /// The kernel parameters.
    pub fn params(&self) -> &TpsParameters {
        &self.params
    }

    /// Number of landmarks.
    pub fn count(&self) -> usize {
        self.landmarks.count()
    }

    /// Append a landmark pair, see [`LandmarkSet::add`].
    pub fn add(&mut self, source: Point, dest: Point) -> Result<usize, TpsError> {
        let index = self.landmarks.add(source, dest)?;
        self.invalidate();
        Ok(index)
    }

    /// Append a landmark fixed in place, see [`LandmarkSet::add_point`].
    pub fn add_point(&mut self, point: Point) -> Result<usize, TpsError> {
        let index = self.landmarks.add_point(point)?;
        self.invalidate();
        Ok(index)
    }

    /// Append many landmark pairs, see [`LandmarkSet::add_batch`].
    pub fn add_batch(
        &mut self,
        sources: &[Point],
        dests: &[Point],
    ) -> Result<Vec<usize>, TpsError> {
        let indices = self.landmarks.add_batch(sources, dests)?;
        self.invalidate();
        Ok(indices)
    }

    /// Pin the image corners, see [`LandmarkSet::add_corners`].
    pub fn add_corners(
        &mut self,
        source_size: (f64, f64),
        dest_size: (f64, f64),
    ) -> Result<Vec<usize>, TpsError> {
        let indices = self.landmarks.add_corners(source_size, dest_size)?;
        self.invalidate();
        Ok(indices)
    }

    /// The landmark pair at `index`.
    pub fn landmark(&self, index: usize) -> Option<&LandmarkPair> {
        self.landmarks.get(index)
    }

    /// Replace the landmark pair at `index`, see [`LandmarkSet::set`].
    pub fn set_landmark(
        &mut self,
        index: usize,
        source: Point,
        dest: Point,
    ) -> Result<(), TpsError> {
        self.landmarks.set(index, source, dest)?;
        self.invalidate();
        Ok(())
    }

    /// Remove every landmark.
    pub fn clear(&mut self) {
        self.landmarks.clear();
        self.invalidate();
    }

    /// Replace the kernel parameters.
    pub fn set_params(&mut self, params: TpsParameters) -> Result<(), TpsError> {
        params.validate()?;
        if params != self.params {
            self.params = params;
            self.invalidate();
        }
        Ok(())
    }

    /// Set the kernel exponent.
    pub fn set_r_exponent(&mut self, r_exponent: f64) -> Result<(), TpsError> {
        self.set_params(TpsParameters {
            r_exponent,
            ..self.params
        })
    }

    /// Set the kernel multiplier.
    pub fn set_k(&mut self, k: f64) -> Result<(), TpsError> {
        self.set_params(TpsParameters { k, ..self.params })
    }

    /// Whether the landmark set is too small to fit a spline.
    fn is_underdetermined(&self) -> bool {
        let dim = self.landmarks.dim().unwrap_or(2);
        self.landmarks.count() < dim + 1
    }

    /// Solve the coefficients if dirty and return them.
    ///
    /// # Errors
    ///
    /// Fails with [`TpsError::InsufficientLandmarks`] or [`TpsError::DegenerateTransform`],
    /// see [`solver::solve`]. A failed solve leaves the transform dirty.
    pub fn solve(&mut self) -> Result<&TpsCoefficients, TpsError> {
        let coefficients = match self.coefficients.take() {
            Some(coefficients) => coefficients,
            None => solver::solve(&self.landmarks, &self.params)?,
        };
        Ok(self.coefficients.insert(coefficients))
    }

    /// The displacement function, solving first if needed.
    ///
    /// With fewer than `dim + 1` landmarks the identity is returned.
    ///
    /// # Errors
    ///
    /// Fails with [`TpsError::DegenerateTransform`] for singular landmark configurations.
    pub fn evaluator(&mut self) -> Result<Evaluator<'_>, TpsError> {
        if self.is_underdetermined() {
            return Ok(Evaluator::Identity {
                dim: self.landmarks.dim(),
            });
        }
        Ok(Evaluator::Fitted(self.solve()?))
    }

    /// The displacement function if it is available without solving.
    ///
    /// Returns `None` while the transform is dirty and has enough landmarks to fit.
    pub fn try_evaluator(&self) -> Option<Evaluator<'_>> {
        if self.is_underdetermined() {
            return Some(Evaluator::Identity {
                dim: self.landmarks.dim(),
            });
        }
        self.coefficients.as_ref().map(Evaluator::Fitted)
    }

    /// Displacement at `point` scaled by `percent`.
    pub fn eval(&mut self, point: &Point, percent: f64) -> Result<Point, TpsError> {
        self.evaluator()?.eval(point, percent)
    }

    /// Move each point by its displacement scaled by `percent`.
    pub fn transform_points(
        &mut self,
        points: &[Point],
        percent: f64,
    ) -> Result<Vec<Point>, TpsError> {
        self.evaluator()?.transform_points(points, percent)
    }

    /// The cached displacement field for a `width` x `height` grid.
    ///
    /// The field is rebuilt when the transform changed or the grid size differs from
    /// the cached one.
    ///
    /// # Errors
    ///
    /// Fails for 3d landmarks and for degenerate landmark configurations.
    pub fn field(&mut self, width: usize, height: usize) -> Result<&DisplacementField, TpsError> {
        let cached = self
            .field
            .take()
            .filter(|field| field.matches_size(width, height));

        let field = match cached {
            Some(field) => field,
            None => DisplacementField::build(&self.evaluator()?, width, height)?,
        };

        Ok(self.field.insert(field))
    }

    /// The cached displacement field, if one was built for a `width` x `height` grid.
    pub fn cached_field(&self, width: usize, height: usize) -> Option<&DisplacementField> {
        self.field
            .as_ref()
            .filter(|field| field.matches_size(width, height))
    }

    /// Whether `other` holds the same landmarks with source and destination swapped.
    pub fn check_inverse(&self, other: &TpsTransform) -> bool {
        self.count() == other.count()
            && self.landmarks.iter().zip(other.landmarks.iter()).all(|(a, b)| {
                a.source.approx_eq(&b.dest, LANDMARK_TOLERANCE)
                    && a.dest.approx_eq(&b.source, LANDMARK_TOLERANCE)
            })
    }

    /// A transform over the swapped landmark pairs with the same kernel parameters.
    pub fn inverted(&self) -> TpsTransform {
        TpsTransform {
            landmarks: self.landmarks.inverted(),
            params: self.params,
            coefficients: None,
            field: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_landmarks() -> Result<TpsTransform, TpsError> {
        let mut transform = TpsTransform::new();
        transform.add([100.0, 100.0].into(), [110.0, 110.0].into())?;
        transform.add([200.0, 100.0].into(), [190.0, 105.0].into())?;
        transform.add([150.0, 200.0].into(), [150.0, 210.0].into())?;
        Ok(transform)
    }

    #[test]
    fn identity_below_three_landmarks() -> Result<(), TpsError> {
        let mut transform = TpsTransform::new();
        assert_eq!(transform.eval(&Point::Xy([3.0, 4.0]), 1.0)?, Point::Xy([0.0, 0.0]));

        transform.add([0.0, 0.0].into(), [5.0, 5.0].into())?;
        transform.add([10.0, 0.0].into(), [15.0, 5.0].into())?;
        assert_eq!(transform.eval(&Point::Xy([3.0, 4.0]), 1.0)?, Point::Xy([0.0, 0.0]));
        assert!(matches!(
            transform.solve(),
            Err(TpsError::InsufficientLandmarks { required: 3, actual: 2 })
        ));
        Ok(())
    }

    #[test]
    fn mutations_mark_dirty() -> Result<(), TpsError> {
        let mut transform = three_landmarks()?;
        assert!(transform.is_dirty());
        transform.solve()?;
        assert!(!transform.is_dirty());
        transform.field(8, 8)?;
        assert!(transform.cached_field(8, 8).is_some());

        transform.add_point([120.0, 180.0].into())?;
        assert!(transform.is_dirty());
        assert!(transform.cached_field(8, 8).is_none());

        transform.solve()?;
        transform.set_k(2.0)?;
        assert!(transform.is_dirty());

        transform.solve()?;
        transform.set_landmark(0, [100.0, 100.0].into(), [100.0, 100.0].into())?;
        assert!(transform.is_dirty());

        transform.solve()?;
        transform.clear();
        assert!(transform.is_dirty());
        assert_eq!(transform.count(), 0);
        Ok(())
    }

    #[test]
    fn unchanged_params_keep_cache() -> Result<(), TpsError> {
        let mut transform = three_landmarks()?;
        transform.solve()?;
        transform.set_r_exponent(2.0)?;
        assert!(!transform.is_dirty());
        assert!(transform.set_r_exponent(f64::NAN).is_err());
        assert!(!transform.is_dirty());
        Ok(())
    }

    #[test]
    fn linear_in_percent() -> Result<(), TpsError> {
        let mut transform = three_landmarks()?;
        transform.add([130.0, 140.0].into(), [128.0, 150.0].into())?;
        let p = Point::Xy([160.0, 130.0]);
        let full = transform.eval(&p, 1.0)?;
        let half = transform.eval(&p, 0.5)?;
        assert!(half.approx_eq(&full.scaled(0.5), 1e-9));
        Ok(())
    }

    #[test]
    fn field_cache_follows_grid_size() -> Result<(), TpsError> {
        let mut transform = three_landmarks()?;
        let first = transform.field(10, 6)?.clone();
        assert_eq!(transform.field(10, 6)?, &first);
        assert!(transform.field(12, 6)?.matches_size(12, 6));
        assert!(transform.cached_field(10, 6).is_none());
        Ok(())
    }

    #[test]
    fn field_rejects_3d() -> Result<(), TpsError> {
        let mut transform = TpsTransform::new();
        transform.add_point([0.0, 0.0, 0.0].into())?;
        assert!(transform.field(4, 4).is_err());
        Ok(())
    }

    #[test]
    fn transform_points_hits_destinations() -> Result<(), TpsError> {
        let mut transform = three_landmarks()?;
        let sources = transform.landmarks().sources();
        let moved = transform.transform_points(&sources, 1.0)?;
        for (m, d) in moved.iter().zip(transform.landmarks().dests()) {
            assert!(m.approx_eq(&d, 1e-6));
        }
        Ok(())
    }

    #[test]
    fn inverse_check() -> Result<(), TpsError> {
        let transform = three_landmarks()?;
        let inverse = transform.inverted();
        assert!(transform.check_inverse(&inverse));
        assert!(inverse.check_inverse(&transform));
        assert!(!transform.check_inverse(&transform));
        Ok(())
    }

    #[test]
    fn shared_transform() -> Result<(), TpsError> {
        let shared = three_landmarks()?.into_shared();
        assert!(shared.read().try_evaluator().is_none());
        shared.write().solve()?;
        let guard = shared.read();
        let d = guard
            .try_evaluator()
            .map(|ev| ev.eval_xy(100.0, 100.0, 1.0))
            .unwrap_or_default();
        assert!((d[0] - 10.0).abs() < 1e-6);
        Ok(())
    }
}
