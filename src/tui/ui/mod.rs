//! UI module: View components for the TUI.

pub mod assessment;
pub mod auth;
pub mod results;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::{MedicalTheme, APP_NAME};

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: This tool provides risk estimates, not a diagnosis.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Consult a healthcare professional for medical advice.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// One-line page header: app name, page title and the signed-in user.
pub fn render_header(f: &mut Frame, area: Rect, page_title: &str, user: Option<&str>) {
    let mut spans = vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(format!(" {APP_NAME} "), MedicalTheme::header()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(page_title.to_string(), MedicalTheme::text_secondary()),
    ];
    if let Some(user) = user {
        spans.push(Span::styled(" │ ", MedicalTheme::text_muted()));
        spans.push(Span::styled(
            format!("Welcome, {user}"),
            MedicalTheme::focused(),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, area);
}

/// Footer with either a status line or key hints.
pub fn render_footer(f: &mut Frame, area: Rect, status: Option<&Status>, hints: &[(&str, &str)]) {
    let content = match status {
        Some(status) => Line::from(vec![Span::styled(status.text.clone(), status.style())]),
        None => Line::from(
            hints
                .iter()
                .flat_map(|(key, desc)| {
                    [
                        Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                        Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, area);
}

/// Kind of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Transient message shown in a footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    fn style(&self) -> ratatui::style::Style {
        match self.kind {
            StatusKind::Info => MedicalTheme::info(),
            StatusKind::Success => MedicalTheme::success(),
            StatusKind::Error => MedicalTheme::danger(),
        }
    }
}
