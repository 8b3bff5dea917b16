/// An error type for the tps module.
#[derive(thiserror::Error, Debug)]
pub enum TpsError {
    /// Points with an unsupported number of coordinates.
    #[error("Unsupported point dimension {0}, expected 2 or 3")]
    UnsupportedDimension(usize),

    /// Mismatched point dimensionality between two inputs.
    #[error("Point dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality fixed by the existing inputs.
        expected: usize,
        /// The dimensionality of the offending input.
        actual: usize,
    },

    /// Mismatched lengths of source and destination arrays.
    #[error("Source and destination arrays differ in length ({sources} vs {dests})")]
    LengthMismatch {
        /// Number of source points.
        sources: usize,
        /// Number of destination points.
        dests: usize,
    },

    /// Fewer landmarks than required to fix the affine part.
    #[error("At least {required} landmarks are required, got {actual}")]
    InsufficientLandmarks {
        /// Minimum number of landmarks (dimension + 1).
        required: usize,
        /// Number of landmarks available.
        actual: usize,
    },

    /// The spline system is singular or numerically close to singular.
    #[error("Degenerate landmarks: pivot {pivot:e} at row {row} below {tolerance:e}")]
    DegenerateTransform {
        /// Row of the elimination where the pivot vanished.
        row: usize,
        /// Magnitude of the rejected pivot.
        pivot: f64,
        /// Absolute tolerance the pivot was compared against.
        tolerance: f64,
    },

    /// A landmark index past the end of the set.
    #[error("Landmark index {0} is out of bounds for a set of {1} landmarks")]
    IndexOutOfBounds(usize, usize),

    /// An invalid kernel or sampling parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error reading or writing landmark CSV records.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A CSV document that does not follow the landmark schema.
    #[error("Invalid landmark CSV: {0}")]
    CsvSchema(String),
}

impl TpsError {
    /// Whether the error comes from mismatched shapes or dimensionality of the inputs.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            TpsError::UnsupportedDimension(_)
                | TpsError::DimensionMismatch { .. }
                | TpsError::LengthMismatch { .. }
        )
    }
}
