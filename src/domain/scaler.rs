//! Standard scaling of the continuous features.
//!
//! Only the six columns in [`NUMERIC_INDICES`] are touched; binary codes pass
//! through unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::{FeatureVector, NUMERIC_INDICES};

const NUMERIC_COUNT: usize = NUMERIC_INDICES.len();

/// Errors building a scaler from fitted parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerError {
    #[error("expected {expected} {what} values, got {actual}")]
    Length {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("scale at position {0} must be finite and non-zero")]
    InvalidScale(usize),

    #[error("mean at position {0} must be finite")]
    InvalidMean(usize),
}

/// Fitted per-feature mean and scale (`z = (x - mean) / scale`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: [f64; NUMERIC_COUNT],
    scale: [f64; NUMERIC_COUNT],
}

impl StandardScaler {
    /// Build from fitted parameters.
    ///
    /// # Errors
    /// Returns `ScalerError` on wrong lengths or a zero/non-finite scale.
    pub fn try_new(mean: &[f64], scale: &[f64]) -> Result<Self, ScalerError> {
        let mean: [f64; NUMERIC_COUNT] = mean.try_into().map_err(|_| ScalerError::Length {
            what: "mean",
            expected: NUMERIC_COUNT,
            actual: mean.len(),
        })?;
        let scale: [f64; NUMERIC_COUNT] = scale.try_into().map_err(|_| ScalerError::Length {
            what: "scale",
            expected: NUMERIC_COUNT,
            actual: scale.len(),
        })?;

        if let Some(i) = mean.iter().position(|m| !m.is_finite()) {
            return Err(ScalerError::InvalidMean(i));
        }
        if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(ScalerError::InvalidScale(i));
        }

        Ok(Self { mean, scale })
    }

    /// Standardize the six continuous values.
    #[must_use]
    pub fn transform(&self, values: &[f64; NUMERIC_COUNT]) -> [f64; NUMERIC_COUNT] {
        let mut out = [0.0; NUMERIC_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (values[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    /// Scale the continuous columns of a full feature vector.
    #[must_use]
    pub fn apply(&self, vector: &FeatureVector) -> FeatureVector {
        vector.with_numeric_part(self.transform(&vector.numeric_part()))
    }
}

/// Apply the scaler if one is loaded, otherwise pass the vector through.
#[must_use]
pub fn scale_features(vector: &FeatureVector, scaler: Option<&StandardScaler>) -> FeatureVector {
    match scaler {
        Some(s) => s.apply(vector),
        None => *vector,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatientInput;

    fn scaler() -> StandardScaler {
        StandardScaler::try_new(
            &[55.0, 2.5, 120.0, 80.0, 2.8, 8.0],
            &[12.0, 1.8, 50.0, 60.0, 0.9, 10.0],
        )
        .expect("valid parameters")
    }

    #[test]
    fn test_only_numeric_columns_change() {
        let raw = PatientInput::default().encode();
        let scaled = scaler().apply(&raw);

        for i in 0..14 {
            if NUMERIC_INDICES.contains(&i) {
                continue;
            }
            assert!((scaled[i] - raw[i]).abs() < f64::EPSILON, "index {i} changed");
        }
        // age 55 sits exactly on the mean
        assert!(scaled[0].abs() < 1e-12);
        // tumor_marker: (5 - 8) / 10
        assert!((scaled[12] + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_missing_scaler_is_identity() {
        let raw = PatientInput::default().encode();
        assert_eq!(scale_features(&raw, None), raw);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            StandardScaler::try_new(&[0.0; 5], &[1.0; 6]),
            Err(ScalerError::Length { what: "mean", .. })
        ));
        assert_eq!(
            StandardScaler::try_new(&[0.0; 6], &[1.0, 1.0, 0.0, 1.0, 1.0, 1.0]),
            Err(ScalerError::InvalidScale(2))
        );
        assert_eq!(
            StandardScaler::try_new(&[0.0, f64::NAN, 0.0, 0.0, 0.0, 0.0], &[1.0; 6]),
            Err(ScalerError::InvalidMean(1))
        );
    }
}
