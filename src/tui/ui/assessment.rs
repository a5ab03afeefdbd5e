//! Assessment form: the 14 clinical inputs.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{
    FieldRange, PatientInput, RawSelections, Sex, YesNo, AGE_RANGE, ALK_PHOSPHATE_RANGE,
    LUNG_FUNCTION_RANGE, SGOT_RANGE, TUMOR_MARKER_RANGE, TUMOR_SIZE_RANGE,
};
use crate::tui::styles::MedicalTheme;

/// How a field is edited.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Typed number within a range
    Numeric(FieldRange),
    /// Male/Female toggle
    Sex,
    /// No/Yes toggle
    YesNo,
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    /// Key in `RawSelections`
    pub name: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl FormField {
    fn numeric(
        name: &'static str,
        label: &'static str,
        hint: &'static str,
        range: FieldRange,
    ) -> Self {
        Self {
            name,
            label,
            hint,
            kind: FieldKind::Numeric(range),
            value: String::new(),
        }
    }

    fn yes_no(name: &'static str, label: &'static str, hint: &'static str) -> Self {
        Self {
            name,
            label,
            hint,
            kind: FieldKind::YesNo,
            value: String::new(),
        }
    }

    fn is_choice(&self) -> bool {
        !matches!(self.kind, FieldKind::Numeric(_))
    }
}

/// Assessment form state
pub struct AssessmentFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for AssessmentFormState {
    fn default() -> Self {
        let mut state = Self {
            fields: vec![
                FormField::numeric("age", "Age", "years (20-95)", AGE_RANGE),
                FormField {
                    name: "sex",
                    label: "Sex",
                    hint: "Male / Female",
                    kind: FieldKind::Sex,
                    value: String::new(),
                },
                FormField::yes_no("smoking", "Smoking History", "regular smoking"),
                FormField::yes_no("persistent_cough", "Persistent Cough", "over 3 weeks"),
                FormField::yes_no("fatigue", "Fatigue", "unusual tiredness"),
                FormField::yes_no("cough_blood", "Coughing Up Blood", "recently"),
                FormField::yes_no("chest_pain", "Chest Pain", "persistent"),
                FormField::yes_no("weight_loss", "Unexplained Weight Loss", "without trying"),
                FormField::yes_no("histology", "Abnormal Histology", "biopsy, if known"),
                FormField::numeric(
                    "tumor_size",
                    "Tumor Size (cm)",
                    "imaging (0-8)",
                    TUMOR_SIZE_RANGE,
                ),
                FormField::numeric(
                    "alk_phosphate",
                    "Alkaline Phosphatase (IU/L)",
                    "40-296",
                    ALK_PHOSPHATE_RANGE,
                ),
                FormField::numeric("sgot", "SGOT (U/L)", "10-648", SGOT_RANGE),
                FormField::numeric(
                    "lung_function",
                    "Lung Function (% FEV1)",
                    "spirometry (0.5-5.0)",
                    LUNG_FUNCTION_RANGE,
                ),
                FormField::numeric(
                    "tumor_marker",
                    "Tumor Marker (µg/L)",
                    "e.g. CEA (0-100)",
                    TUMOR_MARKER_RANGE,
                ),
            ],
            selected_field: 0,
            error_message: None,
        };
        state.fill_from(&PatientInput::default());
        state
    }
}

impl AssessmentFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    #[must_use]
    pub fn selected_is_choice(&self) -> bool {
        self.fields[self.selected_field].is_choice()
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() && (c.is_ascii_digit() || c == '.' || c == '-') {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.pop();
        }
    }

    /// Clear the current numeric field
    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if !field.is_choice() {
            field.value.clear();
        }
    }

    /// Flip the current choice field
    pub fn toggle(&mut self) {
        let field = &mut self.fields[self.selected_field];
        field.value = match field.kind {
            FieldKind::Sex => field
                .value
                .parse::<Sex>()
                .map_or(Sex::Male, Sex::toggled)
                .to_string(),
            FieldKind::YesNo => field
                .value
                .parse::<YesNo>()
                .map_or(YesNo::Yes, YesNo::toggled)
                .to_string(),
            FieldKind::Numeric(_) => return,
        };
        self.error_message = None;
    }

    /// Collect the current values as raw selections.
    #[must_use]
    pub fn to_raw(&self) -> RawSelections {
        let mut raw = RawSelections::new();
        for field in &self.fields {
            raw.set(field.name, field.value.as_str());
        }
        raw
    }

    /// Put the form back to its default values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Load a high-risk sample profile for demonstration
    pub fn load_sample_data(&mut self) {
        self.fill_from(&PatientInput {
            age: 70.0,
            sex: Sex::Male,
            smoking: YesNo::Yes,
            persistent_cough: YesNo::Yes,
            fatigue: YesNo::Yes,
            cough_blood: YesNo::Yes,
            chest_pain: YesNo::Yes,
            weight_loss: YesNo::Yes,
            tumor_size: 5.0,
            alk_phosphate: 150.0,
            sgot: 80.0,
            lung_function: 1.5,
            tumor_marker: 25.0,
            histology: YesNo::Yes,
        });
    }

    fn fill_from(&mut self, input: &PatientInput) {
        for field in &mut self.fields {
            field.value = match field.name {
                "age" => input.age.to_string(),
                "sex" => input.sex.to_string(),
                "smoking" => input.smoking.to_string(),
                "persistent_cough" => input.persistent_cough.to_string(),
                "fatigue" => input.fatigue.to_string(),
                "cough_blood" => input.cough_blood.to_string(),
                "chest_pain" => input.chest_pain.to_string(),
                "weight_loss" => input.weight_loss.to_string(),
                "histology" => input.histology.to_string(),
                "tumor_size" => input.tumor_size.to_string(),
                "alk_phosphate" => input.alk_phosphate.to_string(),
                "sgot" => input.sgot.to_string(),
                "lung_function" => input.lung_function.to_string(),
                "tumor_marker" => input.tumor_marker.to_string(),
                _ => continue,
            };
        }
        self.error_message = None;
    }
}

/// Render the assessment form
pub fn render_assessment_form(f: &mut Frame, area: Rect, state: &AssessmentFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    let intro = Paragraph::new(Line::from(vec![
        Span::styled(" Enter Your Health Details", MedicalTheme::subtitle()),
        Span::styled(
            " │ all fields are used for the prediction",
            MedicalTheme::text_secondary(),
        ),
    ]));
    f.render_widget(intro, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(chunks[1]);

    let mid = (state.fields.len() + 1) / 2;
    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if field.value.is_empty() {
            Span::styled(field.hint, MedicalTheme::text_muted())
        } else if field.is_choice() {
            Span::styled(format!("◀ {} ▶", field.value), MedicalTheme::text())
        } else {
            Span::styled(field.value.as_str(), MedicalTheme::text())
        };

        let mut spans = vec![Span::raw(" "), value_display];
        if is_selected && !field.is_choice() {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }
        if !field.value.is_empty() {
            spans.push(Span::styled(
                format!("  {}", field.hint),
                MedicalTheme::text_muted(),
            ));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FEATURE_COUNT;

    #[test]
    fn test_defaults_form_a_valid_input() {
        let form = AssessmentFormState::default();
        assert_eq!(form.fields.len(), FEATURE_COUNT);

        let input = PatientInput::from_raw(&form.to_raw()).expect("defaults are valid");
        assert_eq!(input, PatientInput::default());
    }

    #[test]
    fn test_toggle_only_changes_choice_fields() {
        let mut form = AssessmentFormState::default();
        form.selected_field = 1;
        assert!(form.selected_is_choice());
        form.toggle();
        assert_eq!(form.fields[1].value, "Female");

        form.selected_field = 0;
        form.toggle();
        assert_eq!(form.fields[0].value, "55");
    }

    #[test]
    fn test_numeric_editing() {
        let mut form = AssessmentFormState::default();
        form.clear_field();
        form.input_char('6');
        form.input_char('x');
        form.input_char('2');
        assert_eq!(form.fields[0].value, "62");
        form.delete_char();
        assert_eq!(form.fields[0].value, "6");
    }

    #[test]
    fn test_cleared_field_is_reported_missing() {
        let mut form = AssessmentFormState::default();
        form.clear_field();
        assert!(PatientInput::from_raw(&form.to_raw()).is_err());
    }

    #[test]
    fn test_sample_data_is_valid() {
        let mut form = AssessmentFormState::default();
        form.load_sample_data();
        let input = PatientInput::from_raw(&form.to_raw()).expect("sample is valid");
        assert_eq!(input.histology, YesNo::Yes);
        assert!((input.tumor_size - 5.0).abs() < f64::EPSILON);
    }
}
