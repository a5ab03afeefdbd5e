//! Prediction service: scale, classify, interpret.
//!
//! Wraps a [`RiskClassifier`] with the optional scaler and maps the model's
//! output onto display-ready labels and percentages.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::adapters::ensemble::{ArtifactError, ModelArtifacts, VotingEnsemble};
use crate::domain::{scale_features, FeatureVector, PatientInput, Prediction, StandardScaler};
use crate::ports::RiskClassifier;

/// A prediction together with the input that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub input: PatientInput,
    /// Unscaled, as encoded from `input`.
    pub features: FeatureVector,
    pub prediction: Prediction,
}

/// Service running the model on encoded inputs.
///
/// Immutable after construction; share it across threads with `Arc`.
pub struct PredictionService<C: RiskClassifier> {
    classifier: Arc<C>,
    scaler: Option<StandardScaler>,
}

impl<C: RiskClassifier> Clone for PredictionService<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            scaler: self.scaler.clone(),
        }
    }
}

impl<C: RiskClassifier> PredictionService<C> {
    /// Create a new prediction service.
    pub fn new(classifier: Arc<C>, scaler: Option<StandardScaler>) -> Self {
        Self { classifier, scaler }
    }

    #[must_use]
    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Scale the continuous features and run the classifier.
    ///
    /// # Errors
    /// Returns `PulmoError::Prediction` if the model output is not a
    /// probability. The unscaled and scaled vectors are logged.
    pub fn predict(&self, features: &FeatureVector) -> crate::Result<Prediction> {
        let scaled = scale_features(features, self.scaler.as_ref());
        match self.classifier.predict_proba(&scaled) {
            Ok(probabilities) => Ok(Prediction::from_probabilities(probabilities)),
            Err(e) => {
                tracing::error!(
                    features = %features,
                    scaled = %scaled,
                    error = %e,
                    "Classifier returned no usable probability"
                );
                Err(e.into())
            }
        }
    }

    /// Predict from an untyped slice, checking its length first.
    ///
    /// # Errors
    /// Returns `PulmoError::Validation` unless the slice has exactly 14 values;
    /// the classifier is not called in that case.
    pub fn predict_raw(&self, values: &[f64]) -> crate::Result<Prediction> {
        let features = FeatureVector::from_slice(values)?;
        self.predict(&features)
    }

    /// Encode, scale and classify a validated input.
    ///
    /// # Errors
    /// Propagates failures from `predict`.
    pub fn assess(&self, input: &PatientInput) -> crate::Result<Assessment> {
        let features = input.encode();
        let prediction = self.predict(&features)?;
        Ok(Assessment {
            input: input.clone(),
            features,
            prediction,
        })
    }
}

impl PredictionService<VotingEnsemble> {
    /// Build from already loaded artifacts.
    #[must_use]
    pub fn from_artifacts(artifacts: &ModelArtifacts) -> Self {
        Self::new(Arc::clone(&artifacts.ensemble), artifacts.scaler.clone())
    }

    /// Load artifacts from `dir` and build the service.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the model cannot be loaded.
    pub fn load(dir: &Path, require_manifest: bool) -> Result<Self, ArtifactError> {
        let artifacts = ModelArtifacts::load(dir, require_manifest)?;
        Ok(Self::from_artifacts(&artifacts))
    }
}
