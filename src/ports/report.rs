//! Report port: Trait for rendering a downloadable assessment report.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{FeatureVector, RiskLabel, RiskPercentages};

/// Errors producing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report rendering failed: {0}")]
    Rendering(String),

    #[error("Invalid report input: {0}")]
    InvalidInput(String),
}

/// Everything a report is built from.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest {
    pub username: String,
    pub label: RiskLabel,
    pub percentages: RiskPercentages,
    /// Unscaled vector as submitted.
    pub features: FeatureVector,
    pub submission_id: u64,
}

impl ReportRequest {
    /// File name without extension: `PulmoPredict_Report_<user>_<id>`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let user: String = self
            .username
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("PulmoPredict_Report_{user}_{}", self.submission_id)
    }
}

/// Renders a report document. The caller decides where the bytes go.
pub trait ReportGenerator: Send + Sync {
    /// File extension for the produced document, without the dot.
    fn extension(&self) -> &'static str;

    /// Render the report.
    ///
    /// # Errors
    /// Returns `ReportError` if the input cannot be rendered.
    fn generate(&self, request: &ReportRequest) -> Result<Vec<u8>, ReportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassProbabilities, PatientInput};

    fn request(username: &str) -> ReportRequest {
        ReportRequest {
            username: username.to_string(),
            label: RiskLabel::Low,
            percentages: ClassProbabilities::from_high(0.2)
                .expect("finite probability")
                .percentages(),
            features: PatientInput::default().encode(),
            submission_id: 3,
        }
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(request("alice").file_stem(), "PulmoPredict_Report_alice_3");
    }

    #[test]
    fn test_file_stem_strips_path_characters() {
        assert_eq!(request("../x y").file_stem(), "PulmoPredict_Report____x_y_3");
    }
}
