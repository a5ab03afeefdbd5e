//! Patient inputs and the model feature vector.
//!
//! Categorical answers are closed enums, so encoding a typed
//! [`PatientInput`] cannot fail. Only parsing raw form selections can.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Number of features the model consumes.
pub const FEATURE_COUNT: usize = 14;

/// Indices of continuous features that go through the scaler.
/// Order: age, tumor_size, alk_phosphate, sgot, lung_function, tumor_marker
pub const NUMERIC_INDICES: [usize; 6] = [0, 8, 9, 10, 11, 12];

/// Feature names in model order (training CSV column names).
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "smoking",
    "persistent_cough",
    "fatigue",
    "cough_blood",
    "chest_pain",
    "weight_loss",
    "tumor_size",
    "alk_phosphate",
    "sgot",
    "lung_function",
    "tumor_marker",
    "histology",
];

/// Biological sex as selected in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Numeric code used by the model.
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Male => 1.0,
            Self::Female => 0.0,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Self::Male),
            "Female" => Ok(Self::Female),
            other => Err(other.to_string()),
        }
    }
}

/// Answer to a yes/no symptom or history question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    No,
    Yes,
}

impl YesNo {
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::No => 0.0,
            Self::Yes => 1.0,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::No => Self::Yes,
            Self::Yes => Self::No,
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "No"),
            Self::Yes => write!(f, "Yes"),
        }
    }
}

impl FromStr for YesNo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "No" => Ok(Self::No),
            "Yes" => Ok(Self::Yes),
            other => Err(other.to_string()),
        }
    }
}

/// Allowed range for a continuous form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    fn check(&self, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() || value < self.min || value > self.max {
            return Err(ValidationError::OutOfRange {
                field: self.field,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }
}

pub const AGE_RANGE: FieldRange = FieldRange {
    field: "age",
    min: 20.0,
    max: 95.0,
};
pub const TUMOR_SIZE_RANGE: FieldRange = FieldRange {
    field: "tumor_size",
    min: 0.0,
    max: 8.0,
};
pub const ALK_PHOSPHATE_RANGE: FieldRange = FieldRange {
    field: "alk_phosphate",
    min: 40.0,
    max: 296.0,
};
pub const SGOT_RANGE: FieldRange = FieldRange {
    field: "sgot",
    min: 10.0,
    max: 648.0,
};
pub const LUNG_FUNCTION_RANGE: FieldRange = FieldRange {
    field: "lung_function",
    min: 0.5,
    max: 5.0,
};
pub const TUMOR_MARKER_RANGE: FieldRange = FieldRange {
    field: "tumor_marker",
    min: 0.0,
    max: 100.0,
};

/// Raw form selections keyed by feature name, as entered in the UI.
#[derive(Debug, Clone, Default)]
pub struct RawSelections {
    values: BTreeMap<String, String>,
}

impl RawSelections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Remove a field.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.values.remove(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn text(&self, field: &'static str) -> Result<&str, ValidationError> {
        match self.values.get(field).map(|v| v.trim()) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ValidationError::MissingField(field)),
        }
    }

    fn number(&self, range: &FieldRange) -> Result<f64, ValidationError> {
        let value: f64 = self
            .text(range.field)?
            .parse()
            .map_err(|_| ValidationError::NotANumber(range.field))?;
        range.check(value)
    }

    fn choice<T: FromStr<Err = String>>(&self, field: &'static str) -> Result<T, ValidationError> {
        self.text(field)?
            .parse()
            .map_err(|token| ValidationError::UnknownToken { field, token })
    }
}

impl fmt::Display for RawSelections {
    /// `field=value` pairs in field-name order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (field, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}={value}")?;
        }
        write!(f, "}}")
    }
}

/// Validated clinical inputs for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    /// Age in years (20-95)
    pub age: f64,
    pub sex: Sex,
    pub smoking: YesNo,
    /// Cough lasting over 3 weeks
    pub persistent_cough: YesNo,
    pub fatigue: YesNo,
    /// Hemoptysis
    pub cough_blood: YesNo,
    pub chest_pain: YesNo,
    /// Unexplained weight loss
    pub weight_loss: YesNo,
    /// Tumor size from imaging, cm (0-8)
    pub tumor_size: f64,
    /// Alkaline phosphatase, IU/L (40-296)
    pub alk_phosphate: f64,
    /// SGOT liver enzyme, U/L (10-648)
    pub sgot: f64,
    /// FEV1 from spirometry (0.5-5.0)
    pub lung_function: f64,
    /// Tumor marker such as CEA, µg/L (0-100)
    pub tumor_marker: f64,
    /// Abnormal biopsy result
    pub histology: YesNo,
}

impl Default for PatientInput {
    /// Baseline values pre-filled in the assessment form.
    fn default() -> Self {
        Self {
            age: 55.0,
            sex: Sex::Male,
            smoking: YesNo::Yes,
            persistent_cough: YesNo::No,
            fatigue: YesNo::No,
            cough_blood: YesNo::No,
            chest_pain: YesNo::No,
            weight_loss: YesNo::No,
            tumor_size: 1.0,
            alk_phosphate: 85.0,
            sgot: 45.0,
            lung_function: 2.8,
            tumor_marker: 5.0,
            histology: YesNo::No,
        }
    }
}

impl PatientInput {
    /// Parse raw UI selections.
    ///
    /// # Errors
    /// Returns `ValidationError` if a field is missing, a categorical token is
    /// unknown, or a number is unparsable or out of range.
    pub fn from_raw(raw: &RawSelections) -> Result<Self, ValidationError> {
        Ok(Self {
            age: raw.number(&AGE_RANGE)?,
            sex: raw.choice("sex")?,
            smoking: raw.choice("smoking")?,
            persistent_cough: raw.choice("persistent_cough")?,
            fatigue: raw.choice("fatigue")?,
            cough_blood: raw.choice("cough_blood")?,
            chest_pain: raw.choice("chest_pain")?,
            weight_loss: raw.choice("weight_loss")?,
            tumor_size: raw.number(&TUMOR_SIZE_RANGE)?,
            alk_phosphate: raw.number(&ALK_PHOSPHATE_RANGE)?,
            sgot: raw.number(&SGOT_RANGE)?,
            lung_function: raw.number(&LUNG_FUNCTION_RANGE)?,
            tumor_marker: raw.number(&TUMOR_MARKER_RANGE)?,
            histology: raw.choice("histology")?,
        })
    }

    /// Check continuous fields against the form ranges.
    ///
    /// # Errors
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        AGE_RANGE.check(self.age)?;
        TUMOR_SIZE_RANGE.check(self.tumor_size)?;
        ALK_PHOSPHATE_RANGE.check(self.alk_phosphate)?;
        SGOT_RANGE.check(self.sgot)?;
        LUNG_FUNCTION_RANGE.check(self.lung_function)?;
        TUMOR_MARKER_RANGE.check(self.tumor_marker)?;
        Ok(())
    }

    /// Encode into the model's feature order.
    #[must_use]
    pub fn encode(&self) -> FeatureVector {
        FeatureVector([
            self.age,
            self.sex.code(),
            self.smoking.code(),
            self.persistent_cough.code(),
            self.fatigue.code(),
            self.cough_blood.code(),
            self.chest_pain.code(),
            self.weight_loss.code(),
            self.tumor_size,
            self.alk_phosphate,
            self.sgot,
            self.lung_function,
            self.tumor_marker,
            self.histology.code(),
        ])
    }
}

/// Ordered 14-feature vector consumed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build from a slice, rejecting anything that is not exactly 14 long.
    ///
    /// # Errors
    /// Returns `ValidationError::FeatureCount` on length mismatch.
    pub fn from_slice(values: &[f64]) -> Result<Self, ValidationError> {
        let array: [f64; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| ValidationError::FeatureCount {
                    expected: FEATURE_COUNT,
                    actual: values.len(),
                })?;
        Ok(Self(array))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The six continuous features, in `NUMERIC_INDICES` order.
    #[must_use]
    pub fn numeric_part(&self) -> [f64; NUMERIC_INDICES.len()] {
        NUMERIC_INDICES.map(|i| self.0[i])
    }

    /// Copy with the continuous features replaced.
    #[must_use]
    pub fn with_numeric_part(&self, numeric: [f64; NUMERIC_INDICES.len()]) -> Self {
        let mut out = self.0;
        for (slot, value) in NUMERIC_INDICES.iter().zip(numeric) {
            out[*slot] = value;
        }
        Self(out)
    }
}

impl std::ops::Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_selections() -> RawSelections {
        let mut raw = RawSelections::new();
        raw.set("age", "70")
            .set("sex", "Male")
            .set("smoking", "Yes")
            .set("persistent_cough", "No")
            .set("fatigue", "No")
            .set("cough_blood", "No")
            .set("chest_pain", "No")
            .set("weight_loss", "No")
            .set("tumor_size", "5.0")
            .set("alk_phosphate", "85")
            .set("sgot", "45")
            .set("lung_function", "2.8")
            .set("tumor_marker", "15.0")
            .set("histology", "Yes");
        raw
    }

    #[test]
    fn test_encode_order_and_codes() {
        let input = PatientInput::from_raw(&full_selections()).expect("Should parse");
        let v = input.encode();

        assert_eq!(v.as_slice().len(), FEATURE_COUNT);
        assert_eq!(
            v.as_slice(),
            &[70.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 85.0, 45.0, 2.8, 15.0, 1.0]
        );
    }

    #[test]
    fn test_female_and_no_map_to_zero() {
        let mut raw = full_selections();
        raw.set("sex", "Female").set("smoking", "No").set("histology", "No");
        let v = PatientInput::from_raw(&raw).expect("Should parse").encode();
        assert!((v[1]).abs() < f64::EPSILON);
        assert!((v[2]).abs() < f64::EPSILON);
        assert!((v[13]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut raw = full_selections();
        raw.remove("fatigue");
        assert_eq!(raw.len(), 13);

        let err = PatientInput::from_raw(&raw).expect_err("must fail");
        assert_eq!(err, ValidationError::MissingField("fatigue"));
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let mut raw = full_selections();
        raw.set("sgot", "   ");
        let err = PatientInput::from_raw(&raw).expect_err("must fail");
        assert_eq!(err, ValidationError::MissingField("sgot"));
    }

    #[test]
    fn test_unknown_token_rejected() {
        let mut raw = full_selections();
        raw.set("sex", "Unknown");
        let err = PatientInput::from_raw(&raw).expect_err("must fail");
        assert!(matches!(err, ValidationError::UnknownToken { field: "sex", .. }));

        let mut raw = full_selections();
        raw.set("chest_pain", "yes");
        assert!(PatientInput::from_raw(&raw).is_err(), "tokens are case-sensitive");
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut raw = full_selections();
        raw.set("age", "19");
        assert!(matches!(
            PatientInput::from_raw(&raw),
            Err(ValidationError::OutOfRange { field: "age", .. })
        ));

        let mut raw = full_selections();
        raw.set("tumor_size", "abc");
        assert_eq!(
            PatientInput::from_raw(&raw),
            Err(ValidationError::NotANumber("tumor_size"))
        );
    }

    #[test]
    fn test_default_is_valid() {
        assert!(PatientInput::default().validate().is_ok());
    }

    #[test]
    fn test_from_slice_length_check() {
        assert!(FeatureVector::from_slice(&[0.0; 14]).is_ok());
        assert_eq!(
            FeatureVector::from_slice(&[0.0; 13]),
            Err(ValidationError::FeatureCount { expected: 14, actual: 13 })
        );
        assert!(FeatureVector::from_slice(&[0.0; 15]).is_err());
    }

    #[test]
    fn test_numeric_part_roundtrip() {
        let v = PatientInput::default().encode();
        let numeric = v.numeric_part();
        assert_eq!(numeric, [55.0, 1.0, 85.0, 45.0, 2.8, 5.0]);

        let replaced = v.with_numeric_part([0.0; 6]);
        for i in NUMERIC_INDICES {
            assert!(replaced[i].abs() < f64::EPSILON);
        }
        assert!((replaced[2] - v[2]).abs() < f64::EPSILON);
    }
}
