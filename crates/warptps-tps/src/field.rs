use std::time::Instant;

use rayon::prelude::*;

use crate::{coefficients::Evaluator, error::TpsError};

/// Per-pixel 2d displacements of a transform at full strength.
///
/// Entries are stored row-major as `[dx, dy]`, so the displacement at a scaled strength
/// `percent` is `percent * field[(x, y)]`.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementField {
    width: usize,
    height: usize,
    data: Vec<[f32; 2]>,
}

impl DisplacementField {
    /// A field with zero displacement everywhere.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![[0.0; 2]; width * height],
        }
    }

    /// Evaluate `evaluator` at every integer pixel coordinate of a `width` x `height` grid.
    ///
    /// Rows are computed in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::DimensionMismatch`] if the evaluator expects 3d points.
    pub fn build(evaluator: &Evaluator<'_>, width: usize, height: usize) -> Result<Self, TpsError> {
        if let Some(dim) = evaluator.dim().filter(|&d| d != 2) {
            return Err(TpsError::DimensionMismatch {
                expected: 2,
                actual: dim,
            });
        }

        if evaluator.is_identity() || width == 0 || height == 0 {
            return Ok(Self::zeros(width, height));
        }

        let start = Instant::now();

        let mut data = vec![[0.0f32; 2]; width * height];
        data.par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                row.iter_mut().enumerate().for_each(|(x, d)| {
                    let [dx, dy] = evaluator.eval_xy(x as f64, y as f64, 1.0);
                    *d = [dx as f32, dy as f32];
                });
            });

        log::debug!(
            "displacement field {}x{} built in {:?}",
            width,
            height,
            start.elapsed()
        );

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width of the grid in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the grid in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the field was sampled on a `width` x `height` grid.
    pub fn matches_size(&self, width: usize, height: usize) -> bool {
        self.width == width && self.height == height
    }

    /// The full-strength displacement at pixel `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<[f32; 2]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// The displacements as a row-major slice.
    pub fn as_slice(&self) -> &[[f32; 2]] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{landmarks::LandmarkSet, params::TpsParameters, solver};

    #[test]
    fn field_matches_direct_evaluation() -> Result<(), TpsError> {
        let mut landmarks = LandmarkSet::new();
        landmarks.add_corners((15.0, 11.0), (15.0, 11.0))?;
        landmarks.add([7.0, 5.0].into(), [9.0, 4.0].into())?;
        let c = solver::solve(&landmarks, &TpsParameters::default())?;
        let ev = Evaluator::Fitted(&c);

        let field = DisplacementField::build(&ev, 16, 12)?;
        assert!(field.matches_size(16, 12));
        assert_eq!(field.as_slice().len(), 16 * 12);

        for (x, y) in [(0, 0), (7, 5), (15, 11), (3, 9)] {
            let [dx, dy] = ev.eval_xy(x as f64, y as f64, 1.0);
            let f = field.get(x, y).ok_or(TpsError::IndexOutOfBounds(x, y))?;
            assert!((f[0] as f64 - dx).abs() < 1e-4);
            assert!((f[1] as f64 - dy).abs() < 1e-4);
        }

        let pinned = field.get(7, 5).ok_or(TpsError::IndexOutOfBounds(7, 5))?;
        assert!((pinned[0] - 2.0).abs() < 1e-4);
        assert!((pinned[1] + 1.0).abs() < 1e-4);
        assert_eq!(field.get(16, 0), None);
        Ok(())
    }

    #[test]
    fn identity_and_empty_fields() -> Result<(), TpsError> {
        let ev = Evaluator::Identity { dim: None };
        let field = DisplacementField::build(&ev, 4, 3)?;
        assert_eq!(field, DisplacementField::zeros(4, 3));

        let empty = DisplacementField::build(&ev, 0, 3)?;
        assert!(empty.as_slice().is_empty());
        Ok(())
    }

    #[test]
    fn rejects_3d_evaluator() {
        let ev = Evaluator::Identity { dim: Some(3) };
        assert!(matches!(
            DisplacementField::build(&ev, 4, 4),
            Err(TpsError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }
}
