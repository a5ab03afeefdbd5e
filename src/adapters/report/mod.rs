//! Plain-text report adapter: Implementation of ReportGenerator.
//!
//! Renders the same sections the results screen shows (summary, risk
//! factors, recommendations) into a UTF-8 document.

use std::fmt::Write as _;

use crate::domain::{narrative, FeatureVector, PatientInput, Sex, YesNo};
use crate::ports::{ReportError, ReportGenerator, ReportRequest};

const DISCLAIMER: &str = "This report is produced by a statistical model for informational \
purposes only. It is not a diagnosis. Consult a qualified healthcare professional.";

/// Text report generator.
#[derive(Debug, Clone, Default)]
pub struct TextReportGenerator;

impl TextReportGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn yes_no(code: f64) -> YesNo {
    if code >= 0.5 {
        YesNo::Yes
    } else {
        YesNo::No
    }
}

/// Rebuild the typed input from an unscaled vector so the narrative rules
/// can run on it.
fn input_from_vector(v: &FeatureVector) -> PatientInput {
    PatientInput {
        age: v[0],
        sex: if v[1] >= 0.5 { Sex::Male } else { Sex::Female },
        smoking: yes_no(v[2]),
        persistent_cough: yes_no(v[3]),
        fatigue: yes_no(v[4]),
        cough_blood: yes_no(v[5]),
        chest_pain: yes_no(v[6]),
        weight_loss: yes_no(v[7]),
        tumor_size: v[8],
        alk_phosphate: v[9],
        sgot: v[10],
        lung_function: v[11],
        tumor_marker: v[12],
        histology: yes_no(v[13]),
    }
}

fn render(request: &ReportRequest) -> Result<String, std::fmt::Error> {
    let input = input_from_vector(&request.features);
    let mut out = String::new();

    writeln!(out, "PulmoPredict Lung Cancer Risk Report")?;
    writeln!(out, "====================================")?;
    writeln!(out, "User:        {}", request.username)?;
    writeln!(out, "Submission:  {}", request.submission_id)?;
    writeln!(
        out,
        "Generated:   {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out)?;

    writeln!(out, "Prediction: {}", request.label)?;
    writeln!(
        out,
        "  High Risk probability: {:.1}%",
        request.percentages.high
    )?;
    writeln!(
        out,
        "  Low Risk probability:  {:.1}%",
        request.percentages.low
    )?;
    writeln!(out)?;

    writeln!(out, "Input Summary")?;
    writeln!(out, "-------------")?;
    for (label, value) in narrative::patient_summary(&input) {
        writeln!(out, "  {label:<20} {value}")?;
    }
    writeln!(out)?;

    writeln!(out, "Key Risk Factors")?;
    writeln!(out, "----------------")?;
    for factor in narrative::risk_factors(&input) {
        let marker = match factor.severity {
            narrative::FactorSeverity::High => "[!]",
            narrative::FactorSeverity::Low => "[ ]",
        };
        writeln!(out, "  {marker} {}: {}", factor.title, factor.description)?;
    }
    writeln!(out, "  {}", narrative::RISK_FACTOR_NOTE)?;
    writeln!(out)?;

    writeln!(out, "Recommended Next Steps")?;
    writeln!(out, "----------------------")?;
    for (i, step) in narrative::recommendations(request.label).iter().enumerate() {
        writeln!(out, "  {}. {step}", i + 1)?;
    }
    writeln!(out)?;
    writeln!(out, "{DISCLAIMER}")?;

    Ok(out)
}

impl ReportGenerator for TextReportGenerator {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn generate(&self, request: &ReportRequest) -> Result<Vec<u8>, ReportError> {
        if request.username.trim().is_empty() {
            return Err(ReportError::InvalidInput("username is empty".into()));
        }
        let text = render(request).map_err(|e| ReportError::Rendering(e.to_string()))?;
        tracing::debug!(
            submission_id = request.submission_id,
            bytes = text.len(),
            "Rendered text report"
        );
        Ok(text.into_bytes())
    }
}
