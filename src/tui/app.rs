//! Main TUI application state machine.
//!
//! Handles:
//! - Page navigation through the session context
//! - Input event handling
//! - Background submissions committed through the tracker
//! - Report export

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::adapters::ensemble::VotingEnsemble;
use crate::adapters::report::TextReportGenerator;
use crate::adapters::sqlite::SqliteAccountStore;
use crate::application::{
    AccountService, CommitOutcome, Page, PredictionService, SessionContext, SignupOutcome,
    SubmissionTicket,
};
use crate::config::AppConfig;
use crate::ports::{AccountStore, ReportGenerator, ReportRequest};
use crate::PulmoError;

use super::styles::MedicalTheme;
use super::ui::{
    assessment::{render_assessment_form, AssessmentFormState},
    auth::{render_auth_form, AuthFormState, AuthMode},
    render_disclaimer, render_footer, render_header,
    results::{render_results, ResultsTab},
    Status,
};
use super::worker::{SubmissionWorker, SubmissionWorkerHandle, WorkerPoll};

type Predictor = PredictionService<VotingEnsemble>;

/// Main application state
pub struct App {
    config: AppConfig,

    /// Logged-in user, current page and submission tracker
    session: SessionContext,

    accounts: AccountService<SqliteAccountStore>,

    /// Loaded model; `None` until artifacts load successfully
    predictor: Option<Arc<Predictor>>,

    reports: TextReportGenerator,

    login_form: AuthFormState,
    signup_form: AuthFormState,
    assessment_form: AssessmentFormState,
    results_tab: ResultsTab,

    /// Message for the footer, cleared on the next key press
    status: Option<Status>,

    /// In-flight submissions, oldest first
    pending: Vec<(SubmissionTicket, SubmissionWorkerHandle)>,

    should_quit: bool,
}

impl App {
    /// Create the application from configuration.
    ///
    /// The model is loaded eagerly. A load failure is fatal only when a
    /// manifest is required; otherwise loading is retried on each
    /// submission.
    ///
    /// # Errors
    /// Returns error if the model cannot be loaded while a manifest is required.
    pub fn new(config: AppConfig) -> Result<Self> {
        let store = Arc::new(SqliteAccountStore::new(&config.db_path));
        match store.create_if_missing().and_then(|()| store.count()) {
            Ok(accounts) => {
                tracing::info!(db_path = ?config.db_path, accounts, "Account store ready");
            }
            // Surfaces again on first login or signup.
            Err(e) => tracing::warn!("Could not prepare account table: {e}"),
        }
        let accounts = AccountService::new(store);

        let predictor = match Predictor::load(&config.model_dir, config.require_manifest) {
            Ok(service) => {
                tracing::info!(
                    model_dir = ?config.model_dir,
                    scaled = service.has_scaler(),
                    "Prediction model loaded"
                );
                Some(Arc::new(service))
            }
            Err(e) if config.require_manifest => {
                bail!("Failed to load model from {:?}: {e}", config.model_dir)
            }
            Err(e) => {
                tracing::warn!("Prediction model unavailable at startup: {e}");
                None
            }
        };

        Ok(Self::with_dependencies(config, accounts, predictor))
    }

    /// Create application with injected dependencies.
    pub fn with_dependencies(
        config: AppConfig,
        accounts: AccountService<SqliteAccountStore>,
        predictor: Option<Arc<Predictor>>,
    ) -> Self {
        Self {
            config,
            session: SessionContext::new(),
            accounts,
            predictor,
            reports: TextReportGenerator::new(),
            login_form: AuthFormState::new(AuthMode::Login),
            signup_form: AuthFormState::new(AuthMode::Signup),
            assessment_form: AssessmentFormState::default(),
            results_tab: ResultsTab::default(),
            status: None,
            pending: Vec::new(),
            should_quit: false,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_workers();

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(0),    // Page
                Constraint::Length(2), // Footer
                Constraint::Length(3), // Disclaimer
            ])
            .split(f.area());

        let page = self.session.page();
        render_header(f, chunks[0], page.title(), self.session.user());

        match page {
            Page::Login => render_auth_form(f, chunks[1], &self.login_form),
            Page::Signup => render_auth_form(f, chunks[1], &self.signup_form),
            Page::Assessment => render_assessment_form(f, chunks[1], &self.assessment_form),
            Page::Results => match self.session.result() {
                Some(assessment) => render_results(
                    f,
                    chunks[1],
                    assessment,
                    self.session.tracker().current_id(),
                    self.results_tab,
                ),
                None => render_placeholder(f, chunks[1], "No result to show."),
            },
        }

        let status = self.footer_status();
        render_footer(f, chunks[2], status.as_ref(), key_hints(page));
        render_disclaimer(f, chunks[3]);
    }

    fn footer_status(&self) -> Option<Status> {
        if let Some(status) = &self.status {
            return Some(status.clone());
        }
        if self.session.page() == Page::Assessment {
            if let Some(message) = &self.assessment_form.error_message {
                return Some(Status::error(message.clone()));
            }
            if self.session.tracker().is_running() {
                return Some(Status::info(format!(
                    "Running assessment #{}...",
                    self.session.tracker().current_id()
                )));
            }
        }
        None
    }

    /// Commit every finished worker through the session.
    fn poll_workers(&mut self) {
        let mut i = 0;
        while i < self.pending.len() {
            let outcome = match self.pending[i].1.try_recv() {
                WorkerPoll::Pending => {
                    i += 1;
                    continue;
                }
                WorkerPoll::Done(done) => {
                    debug_assert_eq!(done.submission_id, self.pending[i].0.id());
                    done.outcome
                }
                WorkerPoll::Lost => Err(PulmoError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "submission worker exited without a result",
                ))),
            };

            let (ticket, _worker) = self.pending.remove(i);
            let committed = self.session.finish_submission(ticket, outcome);
            self.on_commit(committed);
        }
    }

    fn on_commit(&mut self, outcome: CommitOutcome) {
        match outcome {
            CommitOutcome::Committed { id } => {
                self.results_tab = ResultsTab::Summary;
                self.status = Some(Status::success(format!("Assessment #{id} complete.")));
            }
            CommitOutcome::Superseded { id, current } => {
                self.status = Some(Status::info(format!(
                    "Result #{id} discarded; submission #{current} is newer."
                )));
            }
            CommitOutcome::Failed { message, .. } => {
                self.assessment_form.error_message = Some(message);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        self.status = None;

        match self.session.page() {
            Page::Login => self.handle_login_key(key, modifiers),
            Page::Signup => self.handle_signup_key(key),
            Page::Assessment => self.handle_assessment_key(key),
            Page::Results => self.handle_results_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Char('n') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.login_form.clear();
                self.session.navigate(Page::Signup);
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Up => self.login_form.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.login_form.next_field(),
            KeyCode::Char(c) => self.login_form.input_char(c),
            KeyCode::Backspace => self.login_form.delete_char(),
            KeyCode::Enter => self.submit_login(),
            _ => {}
        }
    }

    fn handle_signup_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.signup_form.clear();
                self.session.navigate(Page::Login);
            }
            KeyCode::Up => self.signup_form.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.signup_form.next_field(),
            KeyCode::Char(c) => self.signup_form.input_char(c),
            KeyCode::Backspace => self.signup_form.delete_char(),
            KeyCode::Enter => self.submit_signup(),
            _ => {}
        }
    }

    fn handle_assessment_key(&mut self, key: KeyCode) {
        let on_choice = self.assessment_form.selected_is_choice();
        match key {
            KeyCode::Up => self.assessment_form.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.assessment_form.next_field(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if on_choice => {
                self.assessment_form.toggle();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => self.assessment_form.load_sample_data(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset_assessment(),
            KeyCode::Char('v') | KeyCode::Char('V') => {
                if !self.session.navigate(Page::Results) {
                    self.status = Some(Status::info("No completed assessment yet."));
                }
            }
            KeyCode::Char('l') | KeyCode::Char('L') => self.logout(),
            KeyCode::Char(c) => self.assessment_form.input_char(c),
            KeyCode::Backspace => self.assessment_form.delete_char(),
            KeyCode::Delete => self.assessment_form.clear_field(),
            KeyCode::Enter => self.submit_assessment(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Right | KeyCode::Tab => self.results_tab = self.results_tab.next(),
            KeyCode::Left | KeyCode::BackTab => self.results_tab = self.results_tab.prev(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export_report(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.session.navigate(Page::Assessment);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset_assessment(),
            KeyCode::Char('l') | KeyCode::Char('L') => self.logout(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        let result = self
            .accounts
            .login(&self.login_form.username, &self.login_form.password);
        match result {
            Ok(true) => {
                let username = self.login_form.username.trim().to_string();
                self.login_form.clear();
                self.assessment_form.reset();
                self.status = Some(Status::success(format!("Welcome, {username}!")));
                self.session.login(username);
            }
            Ok(false) => {
                self.login_form.clear_passwords();
                self.status = Some(Status::error("Incorrect username or password."));
            }
            Err(e) => {
                self.login_form.clear_passwords();
                self.status = Some(Status::error(e.user_message()));
            }
        }
    }

    fn submit_signup(&mut self) {
        let form = &self.signup_form;
        let result = self
            .accounts
            .signup(&form.username, &form.password, &form.confirm);
        match result {
            Ok(SignupOutcome::Created) => {
                self.signup_form.clear();
                self.session.navigate(Page::Login);
                self.status = Some(Status::success(SignupOutcome::Created.message()));
            }
            Ok(outcome) => {
                self.signup_form.clear_passwords();
                self.status = Some(Status::error(outcome.message()));
            }
            Err(e) => {
                self.signup_form.clear_passwords();
                self.status = Some(Status::error(e.user_message()));
            }
        }
    }

    /// Validate the form, take a ticket and hand the work to a worker thread.
    fn submit_assessment(&mut self) {
        let raw = self.assessment_form.to_raw();
        let (ticket, input) = match self.session.begin_submission(&raw) {
            Ok(started) => started,
            Err(e) => {
                self.assessment_form.error_message = Some(e.user_message());
                return;
            }
        };
        self.assessment_form.error_message = None;

        match self.predictor() {
            Ok(predictor) => {
                let worker = SubmissionWorker::spawn(predictor, ticket.id(), input);
                self.pending.push((ticket, worker));
            }
            Err(e) => {
                let committed = self.session.finish_submission(ticket, Err(e));
                self.on_commit(committed);
            }
        }
    }

    /// The loaded model, loading it now if startup could not.
    fn predictor(&mut self) -> crate::Result<Arc<Predictor>> {
        if let Some(predictor) = &self.predictor {
            return Ok(Arc::clone(predictor));
        }
        let service = Arc::new(Predictor::load(
            &self.config.model_dir,
            self.config.require_manifest,
        )?);
        tracing::info!(model_dir = ?self.config.model_dir, "Prediction model loaded");
        self.predictor = Some(Arc::clone(&service));
        Ok(service)
    }

    fn reset_assessment(&mut self) {
        self.pending.clear();
        self.session.reset_assessment();
        self.assessment_form.reset();
        self.results_tab = ResultsTab::default();
        self.status = Some(Status::success("Assessment reset. Enter new data."));
    }

    fn logout(&mut self) {
        self.pending.clear();
        self.session.logout();
        self.assessment_form.reset();
        self.results_tab = ResultsTab::default();
        tracing::info!("User logged out");
    }

    fn export_report(&mut self) {
        let (Some(user), Some(assessment)) = (self.session.user(), self.session.result()) else {
            return;
        };
        let request = ReportRequest {
            username: user.to_string(),
            label: assessment.prediction.label,
            percentages: assessment.prediction.percentages(),
            features: assessment.features,
            submission_id: self.session.tracker().current_id(),
        };

        self.status = Some(match self.write_report(&request) {
            Ok(path) => Status::success(format!("Report saved to {}", path.display())),
            Err(e) => {
                tracing::error!(
                    submission_id = request.submission_id,
                    features = %request.features,
                    "Report export failed: {e}"
                );
                Status::error(e.user_message())
            }
        });
    }

    fn write_report(&self, request: &ReportRequest) -> crate::Result<PathBuf> {
        let bytes = self.reports.generate(request)?;
        fs::create_dir_all(&self.config.report_dir)?;
        let path = self.config.report_dir.join(format!(
            "{}.{}",
            request.file_stem(),
            self.reports.extension()
        ));
        fs::write(&path, bytes)?;
        tracing::info!(submission_id = request.submission_id, path = ?path, "Report exported");
        Ok(path)
    }
}

fn key_hints(page: Page) -> &'static [(&'static str, &'static str)] {
    match page {
        Page::Login => &[
            ("Enter", "Login"),
            ("Tab", "Next field"),
            ("Ctrl+N", "Create account"),
            ("Esc", "Quit"),
        ],
        Page::Signup => &[
            ("Enter", "Sign up"),
            ("Tab", "Next field"),
            ("Esc", "Back to login"),
        ],
        Page::Assessment => &[
            ("↑↓", "Navigate"),
            ("Space", "Toggle"),
            ("Enter", "Run Assessment"),
            ("S", "Sample"),
            ("V", "Results"),
            ("R", "Reset"),
            ("L", "Logout"),
        ],
        Page::Results => &[
            ("←→", "Tabs"),
            ("E", "Export report"),
            ("N", "Edit inputs"),
            ("R", "Reset"),
            ("L", "Logout"),
            ("Q", "Quit"),
        ],
    }
}

fn render_placeholder(f: &mut Frame, area: Rect, message: &str) {
    let p = Paragraph::new(Span::styled(
        message.to_string(),
        MedicalTheme::text_muted(),
    ))
    .alignment(Alignment::Center);
    f.render_widget(p, area);
}
