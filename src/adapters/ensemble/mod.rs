//! Ensemble adapter: soft-voting classifier evaluated from JSON artifacts.
//!
//! Three estimators vote with their class probabilities:
//! - Random forest: mean of the normalized leaf class weights
//! - Gradient boosting: `sigmoid(init_raw + learning_rate * sum(leaf))`
//! - Logistic regression: `sigmoid(w . x + b)`
//!
//! The ensemble probability is the weighted mean of the three. A model can
//! only be built through `from_json`, which validates the structure once, so
//! tree walks never index out of bounds. Arithmetic can still overflow on
//! extreme inputs; such a vote is reported as an error.

mod artifacts;
mod tree;

use serde::Deserialize;

use crate::domain::{ClassProbabilities, FeatureVector, PredictionError, FEATURE_COUNT};
use crate::ports::RiskClassifier;

pub use artifacts::{
    sha256_hex, ArtifactError, ArtifactManifest, ModelArtifacts, MANIFEST_FILE, MODEL_FILE,
    SCALER_FILE,
};
use tree::{DecisionTree, TreeNode};

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Bagged classification trees with two-class leaf weights.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("random_forest has no trees".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(FEATURE_COUNT, 2)
                .map_err(|e| format!("random_forest tree {i}: {e}"))?;
            let bad_leaf = tree.nodes.iter().any(|n| match n {
                TreeNode::Leaf { value } => {
                    value.iter().any(|v| *v < 0.0) || value.iter().sum::<f64>() <= 0.0
                }
                TreeNode::Split { .. } => false,
            });
            if bad_leaf {
                return Err(format!(
                    "random_forest tree {i}: leaf weights must be non-negative with a positive sum"
                ));
            }
        }
        Ok(())
    }

    /// Probability of the high-risk class.
    fn predict_high(&self, x: &FeatureVector) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| {
                let leaf = tree.evaluate(x);
                leaf[1] / (leaf[0] + leaf[1])
            })
            .sum();
        total / self.trees.len() as f64
    }
}

/// Additive regression trees on the log-odds scale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct GradientBoosting {
    init_raw: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoosting {
    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("gradient_boosting has no trees".into());
        }
        if !self.init_raw.is_finite() || !self.learning_rate.is_finite() {
            return Err("gradient_boosting: init_raw and learning_rate must be finite".into());
        }
        if self.learning_rate <= 0.0 {
            return Err("gradient_boosting: learning_rate must be positive".into());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(FEATURE_COUNT, 1)
                .map_err(|e| format!("gradient_boosting tree {i}: {e}"))?;
        }
        Ok(())
    }

    fn predict_high(&self, x: &FeatureVector) -> f64 {
        let raw: f64 = self.trees.iter().map(|t| t.evaluate(x)[0]).sum();
        sigmoid(self.init_raw + self.learning_rate * raw)
    }
}

/// Linear model on the scaled feature vector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), String> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(format!(
                "logistic_regression: expected {FEATURE_COUNT} coefficients, got {}",
                self.coefficients.len()
            ));
        }
        if self.coefficients.iter().any(|c| !c.is_finite()) || !self.intercept.is_finite() {
            return Err("logistic_regression: parameters must be finite".into());
        }
        Ok(())
    }

    fn predict_high(&self, x: &FeatureVector) -> f64 {
        let z: f64 = self
            .coefficients
            .iter()
            .zip(x.as_slice())
            .map(|(w, v)| w * v)
            .sum();
        sigmoid(z + self.intercept)
    }
}

fn default_weights() -> Vec<f64> {
    vec![1.0, 1.0, 1.0]
}

/// `voting_model.json` as written by the exporter, before validation.
#[derive(Debug, Deserialize)]
struct ExportedEnsemble {
    n_features: usize,
    #[serde(default = "default_weights")]
    weights: Vec<f64>,
    random_forest: RandomForest,
    gradient_boosting: GradientBoosting,
    logistic_regression: LogisticRegression,
}

/// Validated soft-voting ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct VotingEnsemble {
    /// Estimator weights in the order forest, boosting, logistic.
    weights: Vec<f64>,
    random_forest: RandomForest,
    gradient_boosting: GradientBoosting,
    logistic_regression: LogisticRegression,
}

impl VotingEnsemble {
    /// Parse and validate an exported model.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the JSON is malformed or the model is
    /// structurally invalid.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let exported: ExportedEnsemble =
            serde_json::from_slice(bytes).map_err(|e| ArtifactError::Parse {
                file: MODEL_FILE,
                message: e.to_string(),
            })?;
        Self::from_exported(exported).map_err(ArtifactError::InvalidModel)
    }

    fn from_exported(exported: ExportedEnsemble) -> Result<Self, String> {
        if exported.n_features != FEATURE_COUNT {
            return Err(format!(
                "model expects {} features, this build encodes {FEATURE_COUNT}",
                exported.n_features
            ));
        }
        let model = Self {
            weights: exported.weights,
            random_forest: exported.random_forest,
            gradient_boosting: exported.gradient_boosting,
            logistic_regression: exported.logistic_regression,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.weights.len() != 3 || self.weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err("weights must be three positive numbers".into());
        }
        self.random_forest.validate()?;
        self.gradient_boosting.validate()?;
        self.logistic_regression.validate()?;
        Ok(())
    }
}

impl RiskClassifier for VotingEnsemble {
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassProbabilities, PredictionError> {
        let votes = [
            self.random_forest.predict_high(features),
            self.gradient_boosting.predict_high(features),
            self.logistic_regression.predict_high(features),
        ];
        let weight_sum: f64 = self.weights.iter().sum();
        let high: f64 = votes
            .iter()
            .zip(&self.weights)
            .map(|(p, w)| p * w)
            .sum::<f64>()
            / weight_sum;

        tracing::debug!(
            forest = votes[0],
            boosting = votes[1],
            logistic = votes[2],
            ensemble = high,
            "Soft vote computed"
        );

        ClassProbabilities::from_high(high).map_err(|e| {
            tracing::warn!(
                forest = votes[0],
                boosting = votes[1],
                logistic = votes[2],
                "Soft vote is not a probability: {e}"
            );
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskLabel;

    fn leaf(value: &[f64]) -> DecisionTree {
        DecisionTree {
            nodes: vec![TreeNode::Leaf {
                value: value.to_vec(),
            }],
        }
    }

    fn constant_ensemble(forest: [f64; 2], boost_leaf: f64, intercept: f64) -> VotingEnsemble {
        VotingEnsemble {
            weights: default_weights(),
            random_forest: RandomForest {
                trees: vec![leaf(&forest)],
            },
            gradient_boosting: GradientBoosting {
                init_raw: 0.0,
                learning_rate: 1.0,
                trees: vec![leaf(&[boost_leaf])],
            },
            logistic_regression: LogisticRegression {
                coefficients: vec![0.0; FEATURE_COUNT],
                intercept,
            },
        }
    }

    fn zeros() -> FeatureVector {
        FeatureVector::from_slice(&[0.0; FEATURE_COUNT]).expect("14 values")
    }

    #[test]
    fn test_sigmoid_symmetry() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
    }

    #[test]
    fn test_soft_vote_is_weighted_mean() {
        // forest 0.75, boosting sigmoid(0)=0.5, logistic sigmoid(0)=0.5
        let model = constant_ensemble([1.0, 3.0], 0.0, 0.0);
        model.validate().expect("valid");
        let probs = model.predict_proba(&zeros()).expect("finite vote");
        assert!((probs.high - (0.75 + 0.5 + 0.5) / 3.0).abs() < 1e-12);
        assert!((probs.low + probs.high - 1.0).abs() < 1e-6);

        let weighted = VotingEnsemble {
            weights: vec![2.0, 1.0, 1.0],
            ..model
        };
        let probs = weighted.predict_proba(&zeros()).expect("finite vote");
        assert!((probs.high - (1.5 + 0.5 + 0.5) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_forest_normalizes_leaf_counts() {
        let forest = RandomForest {
            trees: vec![leaf(&[30.0, 10.0]), leaf(&[0.0, 5.0])],
        };
        assert!((forest.predict_high(&zeros()) - (0.25 + 1.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_tie_goes_to_low() {
        let model = constant_ensemble([1.0, 1.0], 0.0, 0.0);
        assert_eq!(model.predict(&zeros()), Ok(RiskLabel::Low));
    }

    #[test]
    fn test_overflowing_vote_is_an_error() {
        // Each coefficient is finite, but on this input w . x is inf - inf.
        let mut model = constant_ensemble([0.0, 1.0], 10.0, 0.0);
        model.logistic_regression.coefficients[0] = 1e308;
        model.logistic_regression.coefficients[9] = -1e308;
        model.validate().expect("finite parameters pass validation");

        let mut values = [0.0; FEATURE_COUNT];
        values[0] = 95.0;
        values[9] = 648.0;
        let x = FeatureVector::from_slice(&values).expect("14 values");

        assert!(matches!(
            model.predict_proba(&x),
            Err(PredictionError::NonFinite(_))
        ));
        assert!(model.predict(&x).is_err());
    }

    #[test]
    fn test_validation_rejects_wrong_shapes() {
        let mut model = constant_ensemble([1.0, 1.0], 0.0, 0.0);
        model.logistic_regression.coefficients.pop();
        assert!(model.validate().is_err());

        let mut model = constant_ensemble([0.0, 0.0], 0.0, 0.0);
        assert!(model.validate().is_err());

        model = constant_ensemble([1.0, 1.0], 0.0, 0.0);
        model.weights = vec![1.0, 0.0, 1.0];
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_from_json_defaults_weights() {
        let json = serde_json::json!({
            "n_features": 14,
            "random_forest": {"trees": [{"nodes": [{"value": [1.0, 1.0]}]}]},
            "gradient_boosting": {"init_raw": 0.0, "learning_rate": 0.1,
                                  "trees": [{"nodes": [{"value": [0.0]}]}]},
            "logistic_regression": {"coefficients": vec![0.0; 14], "intercept": 0.0}
        });
        let model = VotingEnsemble::from_json(json.to_string().as_bytes()).expect("valid model");
        assert_eq!(model.weights, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_from_json_rejects_feature_count() {
        let json = serde_json::json!({
            "n_features": 13,
            "random_forest": {"trees": [{"nodes": [{"value": [1.0, 1.0]}]}]},
            "gradient_boosting": {"init_raw": 0.0, "learning_rate": 0.1,
                                  "trees": [{"nodes": [{"value": [0.0]}]}]},
            "logistic_regression": {"coefficients": vec![0.0; 14], "intercept": 0.0}
        });
        assert!(matches!(
            VotingEnsemble::from_json(json.to_string().as_bytes()),
            Err(ArtifactError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_from_json_reports_garbage() {
        assert!(matches!(
            VotingEnsemble::from_json(b"not json"),
            Err(ArtifactError::Parse { .. })
        ));
    }
}
