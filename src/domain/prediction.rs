//! Prediction result types.
//!
//! Represents the output of the soft-voting ensemble.

use serde::{Deserialize, Serialize};

/// Mortality risk class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 0
    Low,
    /// Class 1
    High,
}

impl RiskLabel {
    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),  // Emerald (#10B981)
            Self::High => (244, 63, 94), // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low Risk"),
            Self::High => write!(f, "High Risk"),
        }
    }
}

/// Errors from turning model output into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("model produced a non-finite probability ({0})")]
    NonFinite(f64),
}

/// Soft-vote class probabilities. `low + high == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub low: f64,
    pub high: f64,
}

impl ClassProbabilities {
    /// Build from the probability of the high-risk class, clamped to [0, 1].
    ///
    /// # Errors
    /// Returns `PredictionError::NonFinite` for NaN or infinite input; a
    /// broken vote must never be read as either class.
    pub fn from_high(high: f64) -> Result<Self, PredictionError> {
        if !high.is_finite() {
            return Err(PredictionError::NonFinite(high));
        }
        let high = high.clamp(0.0, 1.0);
        Ok(Self {
            low: 1.0 - high,
            high,
        })
    }

    /// Class with the larger probability; ties go to `Low`.
    #[must_use]
    pub fn label(&self) -> RiskLabel {
        if self.high > self.low {
            RiskLabel::High
        } else {
            RiskLabel::Low
        }
    }

    /// Rounded percentages for display.
    #[must_use]
    pub fn percentages(&self) -> RiskPercentages {
        RiskPercentages {
            high: round_percent(self.high),
            low: round_percent(self.low),
        }
    }
}

/// Percentages rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskPercentages {
    pub high: f64,
    pub low: f64,
}

fn round_percent(p: f64) -> f64 {
    (p * 1000.0).round() / 10.0
}

/// A completed prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: RiskLabel,
    pub probabilities: ClassProbabilities,
}

impl Prediction {
    /// Label is derived from the probabilities so the two always agree.
    #[must_use]
    pub fn from_probabilities(probabilities: ClassProbabilities) -> Self {
        Self {
            label: probabilities.label(),
            probabilities,
        }
    }

    #[must_use]
    pub fn percentages(&self) -> RiskPercentages {
        self.probabilities.percentages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(high: f64) -> ClassProbabilities {
        ClassProbabilities::from_high(high).expect("finite probability")
    }

    #[test]
    fn test_label_from_probability() {
        assert_eq!(probs(0.9).label(), RiskLabel::High);
        assert_eq!(probs(0.1).label(), RiskLabel::Low);
        assert_eq!(probs(0.5).label(), RiskLabel::Low);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        for p in [0.0, 0.123, 0.5, 0.866, 1.0, 1.5, -0.2] {
            let pair = probs(p);
            assert!((pair.low + pair.high - 1.0).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&pair.high));
        }
    }

    #[test]
    fn test_percentage_rounding() {
        let pct = probs(0.86649).percentages();
        assert!((pct.high - 86.6).abs() < 1e-9);
        assert!((pct.low - 13.4).abs() < 1e-9);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(RiskLabel::Low.to_string(), "Low Risk");
        assert_eq!(RiskLabel::High.to_string(), "High Risk");
    }

    #[test]
    fn test_non_finite_vote_has_no_label() {
        for p in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ClassProbabilities::from_high(p),
                Err(PredictionError::NonFinite(_))
            ));
        }
    }

    #[test]
    fn test_prediction_label_matches_probabilities() {
        let prediction = Prediction::from_probabilities(probs(0.7));
        assert_eq!(prediction.label, RiskLabel::High);
    }
}
