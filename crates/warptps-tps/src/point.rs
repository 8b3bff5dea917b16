use serde::{Deserialize, Serialize};

use crate::error::TpsError;

/// A point (or offset vector) with two or three coordinates.
///
/// # Examples
///
/// ```
/// use warptps_tps::Point;
///
/// let p = Point::from([1.0, 2.0]);
/// assert_eq!(p.dim(), 2);
/// assert_eq!(p.coords(), &[1.0, 2.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Point {
    /// A 2d point.
    Xy([f64; 2]),
    /// A 3d point.
    Xyz([f64; 3]),
}

impl Point {
    /// Create a point from a slice of 2 or 3 coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::UnsupportedDimension`] for any other length.
    pub fn from_slice(coords: &[f64]) -> Result<Self, TpsError> {
        match *coords {
            [x, y] => Ok(Point::Xy([x, y])),
            [x, y, z] => Ok(Point::Xyz([x, y, z])),
            _ => Err(TpsError::UnsupportedDimension(coords.len())),
        }
    }

    /// The zero vector of the given dimension.
    pub fn zeros(dim: usize) -> Result<Self, TpsError> {
        match dim {
            2 => Ok(Point::Xy([0.0; 2])),
            3 => Ok(Point::Xyz([0.0; 3])),
            _ => Err(TpsError::UnsupportedDimension(dim)),
        }
    }

    /// Number of coordinates.
    pub fn dim(&self) -> usize {
        match self {
            Point::Xy(_) => 2,
            Point::Xyz(_) => 3,
        }
    }

    /// The coordinates as a slice of length [`Point::dim`].
    pub fn coords(&self) -> &[f64] {
        match self {
            Point::Xy(c) => c.as_slice(),
            Point::Xyz(c) => c.as_slice(),
        }
    }

    /// The x coordinate.
    pub fn x(&self) -> f64 {
        self.coords()[0]
    }

    /// The y coordinate.
    pub fn y(&self) -> f64 {
        self.coords()[1]
    }

    /// The coordinates padded with zeros to three components.
    pub fn to_xyz(&self) -> [f64; 3] {
        match *self {
            Point::Xy([x, y]) => [x, y, 0.0],
            Point::Xyz(c) => c,
        }
    }

    /// Build a point of dimension `dim` from the first components of `xyz`.
    pub(crate) fn from_xyz(xyz: [f64; 3], dim: usize) -> Self {
        if dim == 2 {
            Point::Xy([xyz[0], xyz[1]])
        } else {
            Point::Xyz(xyz)
        }
    }

    /// Euclidean distance to another point.
    ///
    /// Missing coordinates of a 2d point are treated as zero.
    pub fn distance(&self, other: &Point) -> f64 {
        let (a, b) = (self.to_xyz(), other.to_xyz());
        a.iter()
            .zip(b.iter())
            .map(|(u, v)| (u - v) * (u - v))
            .sum::<f64>()
            .sqrt()
    }

    /// Component-wise `self + other`, keeping the dimension of `self`.
    pub fn offset_by(&self, other: &Point) -> Point {
        let (a, b) = (self.to_xyz(), other.to_xyz());
        Point::from_xyz([a[0] + b[0], a[1] + b[1], a[2] + b[2]], self.dim())
    }

    /// Component-wise `self - other`, keeping the dimension of `self`.
    pub fn delta_from(&self, other: &Point) -> Point {
        let (a, b) = (self.to_xyz(), other.to_xyz());
        Point::from_xyz([a[0] - b[0], a[1] - b[1], a[2] - b[2]], self.dim())
    }

    /// Multiply every coordinate by `factor`.
    pub fn scaled(&self, factor: f64) -> Point {
        let a = self.to_xyz();
        Point::from_xyz([a[0] * factor, a[1] * factor, a[2] * factor], self.dim())
    }

    /// Whether both points have the same dimension and all coordinates agree within `tolerance`.
    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        self.dim() == other.dim()
            && self
                .coords()
                .iter()
                .zip(other.coords())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl From<[f64; 2]> for Point {
    fn from(c: [f64; 2]) -> Self {
        Point::Xy(c)
    }
}

impl From<[f64; 3]> for Point {
    fn from(c: [f64; 3]) -> Self {
        Point::Xyz(c)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::Xy([x, y])
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Point::Xyz([x, y, z])
    }
}
