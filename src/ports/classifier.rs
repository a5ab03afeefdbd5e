//! Classifier port: Trait for the trained risk model.
//!
//! This trait abstracts the model artifact from the prediction service, so
//! tests can substitute a hand-built or counting classifier.

use crate::domain::{ClassProbabilities, FeatureVector, PredictionError, RiskLabel};

/// A binary classifier over the 14-feature vector.
///
/// Implementations are immutable after loading and shared across threads.
pub trait RiskClassifier: Send + Sync {
    /// Class probabilities for an already-scaled vector.
    ///
    /// # Errors
    /// Returns `PredictionError` if the model output is not a usable
    /// probability.
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, PredictionError>;

    /// Predicted class; the argmax of `predict_proba` with ties to `Low`.
    ///
    /// # Errors
    /// Propagates failures from `predict_proba`.
    fn predict(&self, features: &FeatureVector) -> Result<RiskLabel, PredictionError> {
        self.predict_proba(features).map(|probs| probs.label())
    }
}
