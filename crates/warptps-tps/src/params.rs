use serde::{Deserialize, Serialize};

use crate::error::TpsError;

/// Parameters of the radial basis kernel.
///
/// With the default exponent of `2.0` the kernel is the classic thin-plate term
/// `k * r^2 * ln(r)`. Any other exponent gives the power kernel `k * r^p`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TpsParameters {
    /// Exponent applied to the radial distance.
    pub r_exponent: f64,
    /// Multiplier applied to the kernel.
    pub k: f64,
}

impl Default for TpsParameters {
    fn default() -> Self {
        Self {
            r_exponent: 2.0,
            k: 1.0,
        }
    }
}

impl TpsParameters {
    /// Create validated kernel parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TpsError::InvalidParameter`] if either value is not finite.
    pub fn new(r_exponent: f64, k: f64) -> Result<Self, TpsError> {
        let params = Self { r_exponent, k };
        params.validate()?;
        Ok(params)
    }

    /// Check that both values are finite.
    pub fn validate(&self) -> Result<(), TpsError> {
        if !self.r_exponent.is_finite() {
            return Err(TpsError::InvalidParameter(format!(
                "r_exponent must be finite, got {}",
                self.r_exponent
            )));
        }
        if !self.k.is_finite() {
            return Err(TpsError::InvalidParameter(format!(
                "k must be finite, got {}",
                self.k
            )));
        }
        Ok(())
    }

    /// Whether the thin-plate `r^2 ln r` kernel is in use.
    pub fn is_thin_plate(&self) -> bool {
        self.r_exponent == 2.0
    }

    /// Evaluate the kernel at radial distance `r`.
    ///
    /// `kernel(0)` is zero for every exponent.
    ///
    /// # Examples
    ///
    /// ```
    /// use warptps_tps::TpsParameters;
    ///
    /// let params = TpsParameters::default();
    /// assert_eq!(params.kernel(0.0), 0.0);
    /// assert_eq!(params.kernel(1.0), 0.0);
    /// assert!((params.kernel(std::f64::consts::E) - std::f64::consts::E.powi(2)).abs() < 1e-12);
    /// ```
    #[inline]
    pub fn kernel(&self, r: f64) -> f64 {
        if r <= 0.0 {
            return 0.0;
        }
        if self.is_thin_plate() {
            self.k * r * r * r.ln()
        } else {
            self.k * r.powf(self.r_exponent)
        }
    }

    /// Evaluate the kernel from a squared distance, skipping the square root for the
    /// thin-plate case.
    #[inline]
    pub fn kernel_sq(&self, r2: f64) -> f64 {
        if r2 <= 0.0 {
            return 0.0;
        }
        if self.is_thin_plate() {
            // r^2 ln r == 0.5 r^2 ln r^2
            0.5 * self.k * r2 * r2.ln()
        } else {
            self.k * r2.powf(0.5 * self.r_exponent)
        }
    }
}
