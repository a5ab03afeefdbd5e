//! Login and signup forms.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::tui::styles::MedicalTheme;

/// Which credential form is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    fn field_count(self) -> usize {
        match self {
            Self::Login => 2,
            Self::Signup => 3,
        }
    }
}

/// Credential buffers. Password buffers are wiped on clear and drop.
pub struct AuthFormState {
    mode: AuthMode,
    pub username: String,
    pub password: String,
    pub confirm: String,
    pub selected_field: usize,
}

impl AuthFormState {
    #[must_use]
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            username: String::new(),
            password: String::new(),
            confirm: String::new(),
            selected_field: 0,
        }
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.mode.field_count();
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.mode.field_count() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    fn current_mut(&mut self) -> &mut String {
        match self.selected_field {
            0 => &mut self.username,
            1 => &mut self.password,
            _ => &mut self.confirm,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if !c.is_control() {
            self.current_mut().push(c);
        }
    }

    pub fn delete_char(&mut self) {
        self.current_mut().pop();
    }

    /// Wipe both password buffers, keeping the username.
    pub fn clear_passwords(&mut self) {
        self.password.zeroize();
        self.confirm.zeroize();
        if self.selected_field > 0 {
            self.selected_field = 1;
        }
    }

    /// Wipe everything.
    pub fn clear(&mut self) {
        self.username.clear();
        self.clear_passwords();
        self.selected_field = 0;
    }
}

impl Drop for AuthFormState {
    fn drop(&mut self) {
        self.password.zeroize();
        self.confirm.zeroize();
    }
}

/// Render the login or signup form centered in `area`.
pub fn render_auth_form(f: &mut Frame, area: Rect, state: &AuthFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(area);

    const LABELS: [&str; 3] = ["Username", "Password", "Confirm Password"];
    let title = match state.mode {
        AuthMode::Login => "Login to PulmoPredict",
        AuthMode::Signup => "Create an Account",
    };
    let labels = &LABELS[..state.mode.field_count()];

    let constraints: Vec<Constraint> = std::iter::once(Constraint::Length(2))
        .chain(labels.iter().map(|_| Constraint::Length(3)))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(columns[1]);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(title, MedicalTheme::title()))),
        rows[0],
    );

    for (i, label) in labels.iter().enumerate() {
        let value = match i {
            0 => state.username.clone(),
            1 => "•".repeat(state.password.chars().count()),
            _ => "•".repeat(state.confirm.chars().count()),
        };
        render_input(f, rows[i + 1], label, &value, i == state.selected_field);
    }
}

fn render_input(f: &mut Frame, area: Rect, label: &str, value: &str, is_selected: bool) {
    let (border_style, title_style) = if is_selected {
        (MedicalTheme::border_focused(), MedicalTheme::focused())
    } else {
        (MedicalTheme::border(), MedicalTheme::text_secondary())
    };

    let block = Block::default()
        .title(Span::styled(format!(" {label} "), title_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    let content = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(value.to_string(), MedicalTheme::text()),
        if is_selected {
            Span::styled("▌", MedicalTheme::cursor())
        } else {
            Span::raw("")
        },
    ]))
    .block(block);

    f.render_widget(content, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_cycling_depends_on_mode() {
        let mut login = AuthFormState::new(AuthMode::Login);
        login.next_field();
        login.next_field();
        assert_eq!(login.selected_field, 0);

        let mut signup = AuthFormState::new(AuthMode::Signup);
        signup.prev_field();
        assert_eq!(signup.selected_field, 2);
    }

    #[test]
    fn test_typing_goes_to_selected_field() {
        let mut form = AuthFormState::new(AuthMode::Signup);
        "bob".chars().for_each(|c| form.input_char(c));
        form.next_field();
        "pw1".chars().for_each(|c| form.input_char(c));
        form.next_field();
        "pw2".chars().for_each(|c| form.input_char(c));
        form.delete_char();

        assert_eq!(form.username, "bob");
        assert_eq!(form.password, "pw1");
        assert_eq!(form.confirm, "pw");
    }

    #[test]
    fn test_clear_passwords_keeps_username() {
        let mut form = AuthFormState::new(AuthMode::Login);
        form.username.push_str("alice");
        form.password.push_str("secret1");
        form.selected_field = 1;

        form.clear_passwords();
        assert_eq!(form.username, "alice");
        assert!(form.password.is_empty());
        assert_eq!(form.selected_field, 1);
    }
}
