//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Inputs are validated on construction so the
//! rest of the crate works with well-formed values only.

mod features;
pub mod narrative;
pub mod password;
mod prediction;
mod scaler;
mod validation;

pub use features::{
    FeatureVector, FieldRange, PatientInput, RawSelections, Sex, YesNo, FEATURE_COUNT,
    FEATURE_NAMES, NUMERIC_INDICES,
};
pub use features::{
    AGE_RANGE, ALK_PHOSPHATE_RANGE, LUNG_FUNCTION_RANGE, SGOT_RANGE, TUMOR_MARKER_RANGE,
    TUMOR_SIZE_RANGE,
};
pub use narrative::{FactorSeverity, RiskFactor};
pub use prediction::{
    ClassProbabilities, Prediction, PredictionError, RiskLabel, RiskPercentages,
};
pub use scaler::{scale_features, ScalerError, StandardScaler};
pub use validation::ValidationError;
