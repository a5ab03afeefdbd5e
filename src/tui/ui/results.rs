//! Results view: label, probabilities and the three detail tabs.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::application::Assessment;
use crate::domain::narrative::{self, FactorSeverity};
use crate::domain::RiskLabel;
use crate::tui::styles::MedicalTheme;

/// Detail tab on the results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultsTab {
    #[default]
    Summary,
    RiskFactors,
    Recommendations,
}

impl ResultsTab {
    const ALL: [Self; 3] = [Self::Summary, Self::RiskFactors, Self::Recommendations];

    fn title(self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::RiskFactors => "Risk Factors",
            Self::Recommendations => "Recommendations",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Render the committed assessment.
pub fn render_results(
    f: &mut Frame,
    area: Rect,
    assessment: &Assessment,
    submission_id: u64,
    tab: ResultsTab,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Label + headline
            Constraint::Length(3), // High gauge
            Constraint::Length(3), // Low gauge
            Constraint::Length(2), // Tabs
            Constraint::Min(0),    // Tab body
        ])
        .margin(1)
        .split(area);

    render_verdict(f, chunks[0], assessment.prediction.label, submission_id);

    let pct = assessment.prediction.percentages();
    render_gauge(
        f,
        chunks[1],
        " High Risk ",
        pct.high,
        MedicalTheme::risk_label(RiskLabel::High),
    );
    render_gauge(
        f,
        chunks[2],
        " Low Risk ",
        pct.low,
        MedicalTheme::risk_label(RiskLabel::Low),
    );

    let tabs = Tabs::new(ResultsTab::ALL.iter().map(|t| t.title()))
        .select(tab.index())
        .style(MedicalTheme::text_secondary())
        .highlight_style(MedicalTheme::selected())
        .divider(" │ ");
    f.render_widget(tabs, chunks[3]);

    let body = match tab {
        ResultsTab::Summary => summary_lines(assessment),
        ResultsTab::RiskFactors => factor_lines(assessment),
        ResultsTab::Recommendations => recommendation_lines(assessment.prediction.label),
    };
    let body = Paragraph::new(body).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(body, chunks[4]);
}

fn render_verdict(f: &mut Frame, area: Rect, label: RiskLabel, submission_id: u64) {
    let style = MedicalTheme::risk_label(label);
    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(
            label.to_string(),
            style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            narrative::headline(label),
            MedicalTheme::text_secondary(),
        )),
        Line::from(Span::styled(
            format!("Submission #{submission_id}"),
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(style),
    );
    f.render_widget(verdict, area);
}

fn render_gauge(
    f: &mut Frame,
    area: Rect,
    title: &str,
    percent: f64,
    style: ratatui::style::Style,
) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    title.to_string(),
                    MedicalTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(style)
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{percent:.1}%"));
    f.render_widget(gauge, area);
}

fn summary_lines(assessment: &Assessment) -> Vec<Line<'static>> {
    narrative::patient_summary(&assessment.input)
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!(" {label:<20}"), MedicalTheme::text_secondary()),
                Span::styled(value, MedicalTheme::text()),
            ])
        })
        .collect()
}

fn factor_lines(assessment: &Assessment) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = narrative::risk_factors(&assessment.input)
        .into_iter()
        .map(|factor| {
            let marker = match factor.severity {
                FactorSeverity::High => " ! ",
                FactorSeverity::Low => " ✓ ",
            };
            let style = MedicalTheme::severity(factor.severity);
            Line::from(vec![
                Span::styled(marker, style),
                Span::styled(
                    format!("{}: ", factor.title),
                    style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(factor.description, MedicalTheme::text()),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" {}", narrative::RISK_FACTOR_NOTE),
        MedicalTheme::text_muted(),
    )));
    lines
}

fn recommendation_lines(label: RiskLabel) -> Vec<Line<'static>> {
    narrative::recommendations(label)
        .iter()
        .enumerate()
        .map(|(i, step)| {
            Line::from(vec![
                Span::styled(format!(" {}. ", i + 1), MedicalTheme::key_hint()),
                Span::styled(*step, MedicalTheme::text()),
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycling_wraps() {
        assert_eq!(ResultsTab::Summary.next(), ResultsTab::RiskFactors);
        assert_eq!(ResultsTab::Recommendations.next(), ResultsTab::Summary);
        assert_eq!(ResultsTab::Summary.prev(), ResultsTab::Recommendations);
    }
}
