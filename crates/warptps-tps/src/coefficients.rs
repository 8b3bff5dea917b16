use crate::{error::TpsError, params::TpsParameters, point::Point};

/// Fitted thin-plate spline coefficients.
///
/// The model is solved in a normalized frame: source points are centred on their
/// centroid and divided by their RMS radius. Evaluation maps query points into the
/// same frame, so the fitted displacement is the one of the un-normalized system.
///
/// Vectors are stored padded to three components; only the first [`TpsCoefficients::dim`]
/// are meaningful.
#[derive(Clone, Debug, PartialEq)]
pub struct TpsCoefficients {
    dim: usize,
    params: TpsParameters,
    centroid: [f64; 3],
    scale: f64,
    control_points: Vec<[f64; 3]>,
    weights: Vec<[f64; 3]>,
    affine: [[f64; 3]; 4],
}

impl TpsCoefficients {
    pub(crate) fn new(
        dim: usize,
        params: TpsParameters,
        centroid: [f64; 3],
        scale: f64,
        control_points: Vec<[f64; 3]>,
        weights: Vec<[f64; 3]>,
        affine: [[f64; 3]; 4],
    ) -> Self {
        Self {
            dim,
            params,
            centroid,
            scale,
            control_points,
            weights,
            affine,
        }
    }

    /// Number of coordinates per point.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Kernel parameters the system was solved with.
    pub fn params(&self) -> &TpsParameters {
        &self.params
    }

    /// Number of control points (landmarks) in the model.
    pub fn count(&self) -> usize {
        self.control_points.len()
    }

    /// Centroid of the source points.
    pub fn centroid(&self) -> Point {
        Point::from_xyz(self.centroid, self.dim)
    }

    /// RMS distance of the source points from their centroid.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Non-affine weight of each control point, in the normalized frame.
    pub fn weights(&self) -> Vec<Point> {
        self.weights
            .iter()
            .map(|w| Point::from_xyz(*w, self.dim))
            .collect()
    }

    /// Affine rows `[constant, x, y, (z)]`, each a displacement vector, in the normalized frame.
    pub fn affine(&self) -> Vec<Point> {
        self.affine[..=self.dim]
            .iter()
            .map(|a| Point::from_xyz(*a, self.dim))
            .collect()
    }

    #[inline]
    fn normalize(&self, xyz: [f64; 3]) -> [f64; 3] {
        let inv = 1.0 / self.scale;
        [
            (xyz[0] - self.centroid[0]) * inv,
            (xyz[1] - self.centroid[1]) * inv,
            (xyz[2] - self.centroid[2]) * inv,
        ]
    }

    /// Full-strength displacement at a padded position.
    #[inline]
    fn displacement_xyz(&self, xyz: [f64; 3]) -> [f64; 3] {
        let u = self.normalize(xyz);
        let a = &self.affine;

        let mut out = [0.0; 3];
        for (j, o) in out.iter_mut().enumerate().take(self.dim) {
            *o = a[0][j] + a[1][j] * u[0] + a[2][j] * u[1] + a[3][j] * u[2];
        }

        for (c, w) in self.control_points.iter().zip(&self.weights) {
            let d = [u[0] - c[0], u[1] - c[1], u[2] - c[2]];
            let phi = self.params.kernel_sq(d[0] * d[0] + d[1] * d[1] + d[2] * d[2]);
            if phi != 0.0 {
                for (o, wj) in out.iter_mut().zip(w).take(self.dim) {
                    *o += wj * phi;
                }
            }
        }

        out
    }

    /// Evaluate the displacement at `point` scaled by `percent`.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::DimensionMismatch`] if `point` does not match the model.
    pub fn eval(&self, point: &Point, percent: f64) -> Result<Point, TpsError> {
        if point.dim() != self.dim {
            return Err(TpsError::DimensionMismatch {
                expected: self.dim,
                actual: point.dim(),
            });
        }

        let d = self.displacement_xyz(point.to_xyz());
        Ok(Point::from_xyz(
            [percent * d[0], percent * d[1], percent * d[2]],
            self.dim,
        ))
    }

    /// Evaluate the 2d displacement at `(x, y)` scaled by `percent`.
    ///
    /// A 3d model is evaluated on the `z = 0` plane.
    #[inline]
    pub fn eval_xy(&self, x: f64, y: f64, percent: f64) -> [f64; 2] {
        let d = self.displacement_xyz([x, y, 0.0]);
        [percent * d[0], percent * d[1]]
    }
}

/// Read access to a transform's displacement function.
///
/// Transforms with fewer than `dim + 1` landmarks evaluate as the identity.
#[derive(Clone, Copy, Debug)]
pub enum Evaluator<'a> {
    /// Zero displacement everywhere. `dim` is the dimension of the landmark set, if any.
    Identity {
        /// Dimension of the landmarks, `None` when there are none.
        dim: Option<usize>,
    },
    /// Displacement given by solved coefficients.
    Fitted(&'a TpsCoefficients),
}

impl Evaluator<'_> {
    /// Dimension of the points this evaluator accepts, if fixed.
    pub fn dim(&self) -> Option<usize> {
        match self {
            Evaluator::Identity { dim } => *dim,
            Evaluator::Fitted(c) => Some(c.dim()),
        }
    }

    /// Whether this evaluator always returns a zero displacement.
    pub fn is_identity(&self) -> bool {
        matches!(self, Evaluator::Identity { .. })
    }

    /// Evaluate the displacement at `point` scaled by `percent`.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::DimensionMismatch`] if `point` does not match the landmarks.
    pub fn eval(&self, point: &Point, percent: f64) -> Result<Point, TpsError> {
        match self {
            Evaluator::Identity { dim } => match dim {
                Some(dim) if *dim != point.dim() => Err(TpsError::DimensionMismatch {
                    expected: *dim,
                    actual: point.dim(),
                }),
                _ => Point::zeros(point.dim()),
            },
            Evaluator::Fitted(c) => c.eval(point, percent),
        }
    }

    /// Evaluate the 2d displacement at `(x, y)` scaled by `percent`.
    #[inline]
    pub fn eval_xy(&self, x: f64, y: f64, percent: f64) -> [f64; 2] {
        match self {
            Evaluator::Identity { .. } => [0.0, 0.0],
            Evaluator::Fitted(c) => c.eval_xy(x, y, percent),
        }
    }

    /// Move every point by its displacement scaled by `percent`.
    ///
    /// # Examples
    ///
    /// ```
    /// use warptps_tps::{Evaluator, Point};
    ///
    /// let identity = Evaluator::Identity { dim: None };
    /// let moved = identity.transform_points(&[Point::Xy([1.0, 2.0])], 1.0).unwrap();
    /// assert_eq!(moved, vec![Point::Xy([1.0, 2.0])]);
    /// ```
    pub fn transform_points(&self, points: &[Point], percent: f64) -> Result<Vec<Point>, TpsError> {
        points
            .iter()
            .map(|p| Ok(p.offset_by(&self.eval(p, percent)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation(dx: f64, dy: f64) -> TpsCoefficients {
        TpsCoefficients::new(
            2,
            TpsParameters::default(),
            [10.0, 10.0, 0.0],
            2.0,
            vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0.0; 3]; 3],
            [[dx, dy, 0.0], [0.0; 3], [0.0; 3], [0.0; 3]],
        )
    }

    #[test]
    fn eval_is_linear_in_percent() -> Result<(), TpsError> {
        let c = translation(4.0, -2.0);
        let p = Point::Xy([3.0, 7.0]);
        assert_eq!(c.eval(&p, 1.0)?, Point::Xy([4.0, -2.0]));
        assert_eq!(c.eval(&p, 0.5)?, Point::Xy([2.0, -1.0]));
        assert_eq!(c.eval(&p, 0.0)?, Point::Xy([0.0, 0.0]));
        assert_eq!(c.eval_xy(3.0, 7.0, 0.25), [1.0, -0.5]);
        Ok(())
    }

    #[test]
    fn eval_rejects_wrong_dimension() {
        let c = translation(1.0, 1.0);
        assert!(matches!(
            c.eval(&Point::Xyz([0.0; 3]), 1.0),
            Err(TpsError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn identity_evaluator() -> Result<(), TpsError> {
        let ev = Evaluator::Identity { dim: Some(2) };
        assert!(ev.is_identity());
        assert_eq!(ev.eval(&Point::Xy([5.0, 5.0]), 1.0)?, Point::Xy([0.0, 0.0]));
        assert_eq!(ev.eval_xy(5.0, 5.0, 1.0), [0.0, 0.0]);
        assert!(ev.eval(&Point::Xyz([0.0; 3]), 1.0).is_err());
        Ok(())
    }

    #[test]
    fn fitted_transform_points() -> Result<(), TpsError> {
        let c = translation(1.0, 2.0);
        let ev = Evaluator::Fitted(&c);
        assert_eq!(ev.dim(), Some(2));
        let moved = ev.transform_points(&[Point::Xy([0.0, 0.0]), Point::Xy([1.0, 1.0])], 1.0)?;
        assert_eq!(moved, vec![Point::Xy([1.0, 2.0]), Point::Xy([2.0, 3.0])]);
        Ok(())
    }
}
