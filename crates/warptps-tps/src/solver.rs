use std::time::Instant;

use faer::{prelude::SpSolver, Mat};

use crate::{
    coefficients::TpsCoefficients, error::TpsError, landmarks::LandmarkSet,
    params::TpsParameters,
};

/// Relative pivot magnitude below which the system is treated as singular.
pub const PIVOT_TOLERANCE: f64 = 1e-10;

/// Centroid and RMS radius of a set of padded points.
fn normalization_frame(points: &[[f64; 3]]) -> ([f64; 3], f64) {
    let n = points.len() as f64;
    let mut centroid = [0.0; 3];
    for p in points {
        for (c, v) in centroid.iter_mut().zip(p) {
            *c += v / n;
        }
    }

    let mean_sq = points
        .iter()
        .map(|p| {
            (p[0] - centroid[0]).powi(2)
                + (p[1] - centroid[1]).powi(2)
                + (p[2] - centroid[2]).powi(2)
        })
        .sum::<f64>()
        / n;

    (centroid, mean_sq.sqrt())
}

/// Assemble the system matrix `L = [[K, P], [P^t, 0]]` for normalized control points.
fn assemble_system(control_points: &[[f64; 3]], dim: usize, params: &TpsParameters) -> Mat<f64> {
    let n = control_points.len();
    let size = n + dim + 1;
    let mut l = Mat::<f64>::zeros(size, size);

    // K block, symmetric with a zero diagonal
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (control_points[i], control_points[j]);
            let r2 = (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2);
            let phi = params.kernel_sq(r2);
            l.write(i, j, phi);
            l.write(j, i, phi);
        }
    }

    // P block and its transpose
    for (i, p) in control_points.iter().enumerate() {
        l.write(i, n, 1.0);
        l.write(n, i, 1.0);
        for k in 0..dim {
            l.write(i, n + 1 + k, p[k]);
            l.write(n + 1 + k, i, p[k]);
        }
    }

    l
}

/// Solve `L * W = B` through faer's partially pivoted LU decomposition.
///
/// The system is rejected when the smallest diagonal entry of `U` falls below
/// [`PIVOT_TOLERANCE`] times the largest entry of `L`.
fn solve_system(l: &Mat<f64>, b: &Mat<f64>) -> Result<Mat<f64>, TpsError> {
    let size = l.nrows();

    let mut max_abs = 0.0f64;
    for j in 0..size {
        for i in 0..size {
            max_abs = max_abs.max(l.read(i, j).abs());
        }
    }
    let tolerance = PIVOT_TOLERANCE * max_abs;

    let lu = l.partial_piv_lu();
    let u = lu.compute_u();

    let (row, pivot) = (0..size)
        .map(|i| (i, u.read(i, i).abs()))
        .fold((0, f64::INFINITY), |min, (i, v)| {
            if v.is_nan() || v < min.1 {
                (i, v)
            } else {
                min
            }
        });
    if pivot.is_nan() || pivot <= tolerance {
        return Err(TpsError::DegenerateTransform {
            row,
            pivot,
            tolerance,
        });
    }

    let w = lu.solve(b);

    for j in 0..w.ncols() {
        for i in 0..w.nrows() {
            let v = w.read(i, j);
            if !v.is_finite() {
                return Err(TpsError::DegenerateTransform {
                    row: i,
                    pivot: v,
                    tolerance,
                });
            }
        }
    }

    Ok(w)
}

/// Fit thin-plate spline coefficients to a landmark set.
///
/// The spline maps each source point onto the displacement `dest - source`.
///
/// # Arguments
///
/// * `landmarks` - The landmark correspondences, 2d or 3d.
/// * `params` - The kernel parameters.
///
/// # Errors
///
/// * [`TpsError::InsufficientLandmarks`] with fewer than `dim + 1` landmarks.
/// * [`TpsError::DegenerateTransform`] for duplicate, collinear (2d) or coplanar (3d)
///   source points, and for any other numerically singular system.
/// * [`TpsError::InvalidParameter`] for non-finite kernel parameters.
///
/// # Example
///
/// ```
/// use warptps_tps::{solver, LandmarkSet, Point, TpsParameters};
///
/// let sources = [Point::Xy([0.0, 0.0]), Point::Xy([10.0, 0.0]), Point::Xy([0.0, 10.0])];
/// let dests = [Point::Xy([1.0, 1.0]), Point::Xy([11.0, 1.0]), Point::Xy([1.0, 11.0])];
/// let landmarks = LandmarkSet::from_points(&sources, &dests).unwrap();
///
/// let coefficients = solver::solve(&landmarks, &TpsParameters::default()).unwrap();
/// let d = coefficients.eval(&Point::Xy([5.0, 5.0]), 1.0).unwrap();
/// assert!(d.approx_eq(&Point::Xy([1.0, 1.0]), 1e-9));
/// ```
pub fn solve(
    landmarks: &LandmarkSet,
    params: &TpsParameters,
) -> Result<TpsCoefficients, TpsError> {
    params.validate()?;

    let n = landmarks.count();
    let dim = landmarks.dim().unwrap_or(2);
    if n < dim + 1 {
        return Err(TpsError::InsufficientLandmarks {
            required: dim + 1,
            actual: n,
        });
    }

    let start = Instant::now();

    let sources = landmarks.iter().map(|p| p.source.to_xyz()).collect::<Vec<_>>();
    let (centroid, scale) = normalization_frame(&sources);
    if scale <= 0.0 || !scale.is_finite() {
        log::warn!("tps solve: all {} source points coincide", n);
        return Err(TpsError::DegenerateTransform {
            row: 0,
            pivot: 0.0,
            tolerance: 0.0,
        });
    }

    let control_points = sources
        .iter()
        .map(|s| {
            [
                (s[0] - centroid[0]) / scale,
                (s[1] - centroid[1]) / scale,
                (s[2] - centroid[2]) / scale,
            ]
        })
        .collect::<Vec<_>>();

    let l = assemble_system(&control_points, dim, params);

    // right hand side: landmark displacements, zero for the affine constraints
    let mut b = Mat::<f64>::zeros(n + dim + 1, dim);
    for (i, pair) in landmarks.iter().enumerate() {
        let (s, d) = (pair.source.to_xyz(), pair.dest.to_xyz());
        for j in 0..dim {
            b.write(i, j, d[j] - s[j]);
        }
    }

    let w = solve_system(&l, &b).map_err(|err| {
        log::warn!("tps solve: {} landmarks rejected: {}", n, err);
        err
    })?;

    let weights = (0..n)
        .map(|i| {
            let mut row = [0.0; 3];
            for (j, wj) in row.iter_mut().enumerate().take(dim) {
                *wj = w.read(i, j);
            }
            row
        })
        .collect::<Vec<_>>();

    let mut affine = [[0.0; 3]; 4];
    for (k, row) in affine.iter_mut().enumerate().take(dim + 1) {
        for (j, a) in row.iter_mut().enumerate().take(dim) {
            *a = w.read(n + k, j);
        }
    }

    log::debug!(
        "tps solve: {} landmarks ({}d) in {:?}",
        n,
        dim,
        start.elapsed()
    );

    Ok(TpsCoefficients::new(
        dim,
        *params,
        centroid,
        scale,
        control_points,
        weights,
        affine,
    ))
}
