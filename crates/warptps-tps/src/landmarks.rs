use serde::{Deserialize, Serialize};

use crate::{error::TpsError, point::Point};

/// A source to destination point correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPair {
    /// Position of the pair in its set, assigned on insertion.
    pub index: usize,
    /// Position in the source image.
    pub source: Point,
    /// Position in the destination image.
    pub dest: Point,
}

impl LandmarkPair {
    /// The offset `dest - source` the spline must reproduce at `source`.
    pub fn displacement(&self) -> Point {
        self.dest.delta_from(&self.source)
    }
}

/// Ordered collection of landmark pairs sharing one dimensionality.
///
/// The dimensionality is fixed by the first inserted pair and released again by
/// [`LandmarkSet::clear`].
///
/// # Examples
///
/// ```
/// use warptps_tps::{LandmarkSet, Point};
///
/// let mut landmarks = LandmarkSet::new();
/// let idx = landmarks.add([100.0, 100.0].into(), [110.0, 110.0].into()).unwrap();
/// assert_eq!(idx, 0);
/// assert_eq!(landmarks.count(), 1);
/// assert_eq!(landmarks.dim(), Some(2));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LandmarkPair>", into = "Vec<LandmarkPair>")]
pub struct LandmarkSet {
    pairs: Vec<LandmarkPair>,
}

impl LandmarkSet {
    /// Create an empty landmark set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from parallel source and destination arrays.
    pub fn from_points(sources: &[Point], dests: &[Point]) -> Result<Self, TpsError> {
        let mut landmarks = Self::new();
        landmarks.add_batch(sources, dests)?;
        Ok(landmarks)
    }

    /// Number of coordinates per point, or `None` while the set is empty.
    pub fn dim(&self) -> Option<usize> {
        self.pairs.first().map(|pair| pair.source.dim())
    }

    /// Number of landmark pairs.
    pub fn count(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the set holds no landmarks.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn check_pair(&self, source: &Point, dest: &Point) -> Result<(), TpsError> {
        if source.dim() != dest.dim() {
            return Err(TpsError::DimensionMismatch {
                expected: source.dim(),
                actual: dest.dim(),
            });
        }

        match self.dim() {
            Some(dim) if dim != source.dim() => Err(TpsError::DimensionMismatch {
                expected: dim,
                actual: source.dim(),
            }),
            _ => Ok(()),
        }
    }

    /// Append a landmark pair and return its index.
    ///
    /// # Errors
    ///
    /// Fails with [`TpsError::DimensionMismatch`] when `source` and `dest` differ in
    /// dimension, or differ from the pairs already in the set.
    pub fn add(&mut self, source: Point, dest: Point) -> Result<usize, TpsError> {
        self.check_pair(&source, &dest)?;

        let index = self.pairs.len();
        self.pairs.push(LandmarkPair {
            index,
            source,
            dest,
        });

        Ok(index)
    }

    /// Append a landmark that maps `point` onto itself, pinning it in place.
    pub fn add_point(&mut self, point: Point) -> Result<usize, TpsError> {
        self.add(point, point)
    }

    /// Append many pairs at once; either all pairs are added or none are.
    ///
    /// # Errors
    ///
    /// Fails with [`TpsError::LengthMismatch`] for arrays of different length and with
    /// [`TpsError::DimensionMismatch`] if any pair has inconsistent dimensionality.
    pub fn add_batch(
        &mut self,
        sources: &[Point],
        dests: &[Point],
    ) -> Result<Vec<usize>, TpsError> {
        if sources.len() != dests.len() {
            return Err(TpsError::LengthMismatch {
                sources: sources.len(),
                dests: dests.len(),
            });
        }

        // validate everything against the dimension the batch will end up with
        let dim = self.dim().or_else(|| sources.first().map(Point::dim));
        for (source, dest) in sources.iter().zip(dests) {
            for p in [source, dest] {
                if let Some(dim) = dim.filter(|&d| d != p.dim()) {
                    return Err(TpsError::DimensionMismatch {
                        expected: dim,
                        actual: p.dim(),
                    });
                }
            }
        }

        let start = self.pairs.len();
        self.pairs
            .extend(sources.iter().zip(dests).enumerate().map(|(i, (s, d))| {
                LandmarkPair {
                    index: start + i,
                    source: *s,
                    dest: *d,
                }
            }));

        Ok((start..self.pairs.len()).collect())
    }

    /// Pin the four image corners, mapping a `source_size` frame onto a `dest_size` frame.
    ///
    /// Corners are added as `(0, 0)`, `(0, h)`, `(w, h)` and `(w, 0)`, with each size
    /// given as `(width, height)`.
    ///
    /// # Errors
    ///
    /// Fails with [`TpsError::DimensionMismatch`] if the set already holds 3d landmarks.
    pub fn add_corners(
        &mut self,
        source_size: (f64, f64),
        dest_size: (f64, f64),
    ) -> Result<Vec<usize>, TpsError> {
        let corners = |(w, h): (f64, f64)| -> Vec<Point> {
            vec![
                Point::Xy([0.0, 0.0]),
                Point::Xy([0.0, h]),
                Point::Xy([w, h]),
                Point::Xy([w, 0.0]),
            ]
        };
        self.add_batch(&corners(source_size), &corners(dest_size))
    }

    /// Get the pair at `index`.
    pub fn get(&self, index: usize) -> Option<&LandmarkPair> {
        self.pairs.get(index)
    }

    /// Replace the pair at `index`, keeping its index.
    ///
    /// # Errors
    ///
    /// Fails with [`TpsError::IndexOutOfBounds`] past the end of the set and with
    /// [`TpsError::DimensionMismatch`] under the same rules as [`LandmarkSet::add`].
    pub fn set(&mut self, index: usize, source: Point, dest: Point) -> Result<(), TpsError> {
        let count = self.pairs.len();
        if index >= count {
            return Err(TpsError::IndexOutOfBounds(index, count));
        }

        // a single landmark may change dimension freely
        if count > 1 {
            self.check_pair(&source, &dest)?;
        } else if source.dim() != dest.dim() {
            return Err(TpsError::DimensionMismatch {
                expected: source.dim(),
                actual: dest.dim(),
            });
        }

        self.pairs[index] = LandmarkPair {
            index,
            source,
            dest,
        };

        Ok(())
    }

    /// Remove every landmark.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Iterate the pairs in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LandmarkPair> {
        self.pairs.iter()
    }

    /// The pairs as a slice in insertion order.
    pub fn as_slice(&self) -> &[LandmarkPair] {
        &self.pairs
    }

    /// The source points in insertion order.
    pub fn sources(&self) -> Vec<Point> {
        self.pairs.iter().map(|p| p.source).collect()
    }

    /// The destination points in insertion order.
    pub fn dests(&self) -> Vec<Point> {
        self.pairs.iter().map(|p| p.dest).collect()
    }

    /// A copy of the set with source and destination swapped in every pair.
    pub fn inverted(&self) -> LandmarkSet {
        LandmarkSet {
            pairs: self
                .pairs
                .iter()
                .map(|p| LandmarkPair {
                    index: p.index,
                    source: p.dest,
                    dest: p.source,
                })
                .collect(),
        }
    }
}

/// Rebuilds a set from serialized pairs; indices must count up from zero.
impl TryFrom<Vec<LandmarkPair>> for LandmarkSet {
    type Error = TpsError;

    fn try_from(pairs: Vec<LandmarkPair>) -> Result<Self, Self::Error> {
        if let Some((expected, pair)) = pairs
            .iter()
            .enumerate()
            .find(|(expected, pair)| pair.index != *expected)
        {
            return Err(TpsError::InvalidParameter(format!(
                "landmark index {} found where {} was expected",
                pair.index, expected
            )));
        }

        let sources = pairs.iter().map(|p| p.source).collect::<Vec<_>>();
        let dests = pairs.iter().map(|p| p.dest).collect::<Vec<_>>();
        Self::from_points(&sources, &dests)
    }
}

impl From<LandmarkSet> for Vec<LandmarkPair> {
    fn from(landmarks: LandmarkSet) -> Self {
        landmarks.pairs
    }
}

impl<'a> IntoIterator for &'a LandmarkSet {
    type Item = &'a LandmarkPair;
    type IntoIter = std::slice::Iter<'a, LandmarkPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
