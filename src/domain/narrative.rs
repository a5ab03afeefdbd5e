//! Human-readable interpretation of an assessment.
//!
//! Pure functions over the validated input and the predicted label; the TUI
//! and the report generator render whatever these return.

use serde::Serialize;

use super::features::{PatientInput, YesNo};
use super::prediction::RiskLabel;

/// Whether a factor raises concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FactorSeverity {
    Low,
    High,
}

/// One line of the risk factor breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactor {
    pub title: &'static str,
    pub description: String,
    pub severity: FactorSeverity,
}

impl RiskFactor {
    fn new(title: &'static str, description: impl Into<String>, severity: FactorSeverity) -> Self {
        Self {
            title,
            description: description.into(),
            severity,
        }
    }
}

/// Shown under the risk factor list.
pub const RISK_FACTOR_NOTE: &str = "These factors are based on your inputs and medical patterns. \
Consult a pulmonologist for a full evaluation.";

/// One-sentence interpretation shown above the probabilities.
#[must_use]
pub fn headline(label: RiskLabel) -> &'static str {
    match label {
        RiskLabel::High => {
            "The model indicates a high risk of mortality from lung cancer. \
             Urgent consultation with an oncologist is essential."
        }
        RiskLabel::Low => {
            "The model predicts a low mortality risk from lung cancer. \
             Maintain routine check-ups with your doctor."
        }
    }
}

/// Label/value pairs echoing the submitted form.
#[must_use]
pub fn patient_summary(input: &PatientInput) -> Vec<(&'static str, String)> {
    let histology = match input.histology {
        YesNo::Yes => "Abnormal",
        YesNo::No => "Normal",
    };
    vec![
        ("Age", format!("{}", input.age)),
        ("Sex", input.sex.to_string()),
        ("Smoking History", input.smoking.to_string()),
        ("Persistent Cough", input.persistent_cough.to_string()),
        ("Fatigue", input.fatigue.to_string()),
        ("Coughing Up Blood", input.cough_blood.to_string()),
        ("Chest Pain", input.chest_pain.to_string()),
        ("Weight Loss", input.weight_loss.to_string()),
        ("Tumor Size (cm)", format!("{}", input.tumor_size)),
        ("Alk Phosphate", format!("{}", input.alk_phosphate)),
        ("SGOT", format!("{}", input.sgot)),
        ("Lung Function", format!("{}", input.lung_function)),
        ("Tumor Marker", format!("{}", input.tumor_marker)),
        ("Histology", histology.to_string()),
    ]
}

/// Rule-based factor breakdown.
///
/// When nothing is flagged high, a closing "Overall Risk" entry says so.
#[must_use]
pub fn risk_factors(input: &PatientInput) -> Vec<RiskFactor> {
    use FactorSeverity::{High, Low};

    let mut factors = Vec::with_capacity(10);

    factors.push(if input.smoking == YesNo::Yes {
        RiskFactor::new(
            "Smoking History",
            "Smoking is the leading cause of lung cancer.",
            High,
        )
    } else {
        RiskFactor::new(
            "Smoking History",
            "No smoking history reduces your risk.",
            Low,
        )
    });

    factors.push(if input.age > 55.0 {
        RiskFactor::new("Age", "Risk increases significantly after age 55.", High)
    } else {
        RiskFactor::new(
            "Age",
            format!("Age {} is within lower-risk range.", input.age),
            Low,
        )
    });

    factors.push(if input.cough_blood == YesNo::Yes {
        RiskFactor::new(
            "Coughing Blood",
            "Hemoptysis may indicate tumor presence.",
            High,
        )
    } else {
        RiskFactor::new("Coughing Blood", "No hemoptysis reported.", Low)
    });

    factors.push(if input.chest_pain == YesNo::Yes {
        RiskFactor::new(
            "Chest Pain",
            "Persistent pain can signal tumor growth.",
            High,
        )
    } else {
        RiskFactor::new("Chest Pain", "No chest pain reported.", Low)
    });

    factors.push(if input.weight_loss == YesNo::Yes {
        RiskFactor::new(
            "Weight Loss",
            "Unexplained weight loss is a concerning symptom.",
            High,
        )
    } else {
        RiskFactor::new("Weight Loss", "No weight loss reported.", Low)
    });

    factors.push(if input.tumor_size > 3.0 {
        RiskFactor::new(
            "Tumor Size",
            format!(
                "A {:.1} cm tumor suggests advanced disease.",
                input.tumor_size
            ),
            High,
        )
    } else {
        RiskFactor::new(
            "Tumor Size",
            format!("Tumor size {:.1} cm is less concerning.", input.tumor_size),
            Low,
        )
    });

    factors.push(if input.tumor_marker > 10.0 {
        RiskFactor::new(
            "Tumor Marker",
            format!(
                "Elevated marker ({:.1} µg/L) indicates risk.",
                input.tumor_marker
            ),
            High,
        )
    } else {
        RiskFactor::new(
            "Tumor Marker",
            format!("Tumor marker {:.1} µg/L is normal.", input.tumor_marker),
            Low,
        )
    });

    factors.push(if input.lung_function < 2.0 {
        RiskFactor::new(
            "Lung Function",
            "Reduced function suggests severe disease.",
            High,
        )
    } else {
        RiskFactor::new(
            "Lung Function",
            format!("Lung function {:.1} is adequate.", input.lung_function),
            Low,
        )
    });

    factors.push(if input.histology == YesNo::Yes {
        RiskFactor::new("Histology", "Abnormal biopsy confirms malignancy.", High)
    } else {
        RiskFactor::new("Histology", "Normal histology reduces concern.", Low)
    });

    if factors.iter().all(|f| f.severity == Low) {
        factors.push(RiskFactor::new(
            "Overall Risk",
            "No major risk factors detected.",
            Low,
        ));
    }

    factors
}

/// Five next steps for the predicted label.
#[must_use]
pub fn recommendations(label: RiskLabel) -> [&'static str; 5] {
    match label {
        RiskLabel::High => [
            "Urgent CT scan to evaluate lung abnormalities.",
            "Suggested drugs: Osimertinib (for EGFR mutations), Alectinib (for ALK \
             rearrangements), and Lorlatinib (for ROS1 fusions).",
            "Blood tests for tumor markers (e.g., CEA, CYFRA 21-1).",
            "Discuss treatment options (surgery, chemo, radiation).",
            "Follow up within 1-2 weeks.",
        ],
        RiskLabel::Low => [
            "Consider annual low-dose CT screening if a smoker.",
            "Monitor symptoms like cough or fatigue.",
            "Quit smoking to reduce risk.",
            "Regular spirometry to assess lung function.",
            "Learn warning signs requiring immediate attention.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sex;

    fn low_risk_input() -> PatientInput {
        PatientInput {
            age: 30.0,
            sex: Sex::Female,
            smoking: YesNo::No,
            tumor_size: 0.2,
            tumor_marker: 2.0,
            ..PatientInput::default()
        }
    }

    #[test]
    fn test_no_major_factors_adds_overall_entry() {
        let factors = risk_factors(&low_risk_input());
        assert_eq!(factors.len(), 10);
        let last = factors.last().expect("non-empty");
        assert_eq!(last.title, "Overall Risk");
        assert_eq!(last.description, "No major risk factors detected.");
    }

    #[test]
    fn test_high_factors_flagged() {
        let input = PatientInput {
            age: 70.0,
            tumor_size: 5.0,
            tumor_marker: 15.0,
            histology: YesNo::Yes,
            ..PatientInput::default()
        };
        let factors = risk_factors(&input);
        assert_eq!(factors.len(), 9);

        let high: Vec<_> = factors
            .iter()
            .filter(|f| f.severity == FactorSeverity::High)
            .map(|f| f.title)
            .collect();
        assert_eq!(high, ["Smoking History", "Age", "Tumor Size", "Tumor Marker", "Histology"]);

        let tumor = factors.iter().find(|f| f.title == "Tumor Size").expect("present");
        assert_eq!(tumor.description, "A 5.0 cm tumor suggests advanced disease.");
    }

    #[test]
    fn test_thresholds_are_strict() {
        let input = PatientInput {
            age: 55.0,
            tumor_size: 3.0,
            tumor_marker: 10.0,
            lung_function: 2.0,
            ..low_risk_input()
        };
        assert!(risk_factors(&input)
            .iter()
            .all(|f| f.severity == FactorSeverity::Low));
    }

    #[test]
    fn test_summary_uses_display_words() {
        let summary = patient_summary(&low_risk_input());
        assert_eq!(summary.len(), 14);
        assert_eq!(summary[1], ("Sex", "Female".to_string()));
        assert_eq!(summary[2], ("Smoking History", "No".to_string()));
        assert_eq!(summary[13], ("Histology", "Normal".to_string()));
    }

    #[test]
    fn test_recommendations_differ_by_label() {
        let high = recommendations(RiskLabel::High);
        let low = recommendations(RiskLabel::Low);
        assert_eq!(high[0], "Urgent CT scan to evaluate lung abnormalities.");
        assert_eq!(low[2], "Quit smoking to reduce risk.");
        assert!(high.iter().all(|h| !low.contains(h)));
    }
}
