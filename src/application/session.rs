//! Per-session state: who is logged in, which page is shown, and the
//! submission tracker.

use crate::application::{
    Assessment, CommitOutcome, PredictionService, SubmissionTicket, SubmissionTracker,
};
use crate::domain::{PatientInput, RawSelections};
use crate::ports::RiskClassifier;

/// Top-level pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Signup,
    Assessment,
    Results,
}

impl Page {
    /// Get the page title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Signup => "Sign Up",
            Self::Assessment => "Risk Assessment",
            Self::Results => "Results",
        }
    }
}

/// State for one interactive session.
#[derive(Debug)]
pub struct SessionContext {
    user: Option<String>,
    page: Page,
    tracker: SubmissionTracker,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            user: None,
            page: Page::Login,
            tracker: SubmissionTracker::new(),
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn page(&self) -> Page {
        self.page
    }

    #[must_use]
    pub fn tracker(&self) -> &SubmissionTracker {
        &self.tracker
    }

    /// Committed result of the newest submission.
    #[must_use]
    pub fn result(&self) -> Option<&Assessment> {
        self.tracker.result()
    }

    /// Mark `username` as logged in and open the assessment form.
    pub fn login(&mut self, username: impl Into<String>) {
        self.user = Some(username.into());
        self.page = Page::Assessment;
    }

    /// Forget the user and any results.
    pub fn logout(&mut self) {
        self.user = None;
        self.tracker.reset();
        self.page = Page::Login;
    }

    /// Discard any results and start over on the assessment form.
    pub fn reset_assessment(&mut self) {
        self.tracker.reset();
        if self.user.is_some() {
            self.page = Page::Assessment;
        }
        tracing::info!("Assessment reset");
    }

    /// Switch pages if allowed; returns whether the page changed.
    ///
    /// `Assessment` needs a logged-in user. `Results` also needs a committed
    /// result. `Login` and `Signup` are only reachable while logged out.
    pub fn navigate(&mut self, page: Page) -> bool {
        let allowed = match page {
            Page::Login | Page::Signup => self.user.is_none(),
            Page::Assessment => self.user.is_some(),
            Page::Results => self.user.is_some() && self.tracker.result().is_some(),
        };
        if allowed {
            self.page = page;
        }
        allowed
    }

    /// Validate the form and start a submission.
    ///
    /// Validation happens before the tracker is touched, so a rejected form
    /// leaves the id counter and any shown result as they were.
    ///
    /// # Errors
    /// Returns `PulmoError::Validation` if the form is incomplete or invalid.
    pub fn begin_submission(
        &mut self,
        raw: &RawSelections,
    ) -> crate::Result<(SubmissionTicket, PatientInput)> {
        let input = PatientInput::from_raw(raw).map_err(|e| {
            tracing::warn!(
                fields = raw.len(),
                selections = %raw,
                "Submission rejected: {e}"
            );
            e
        })?;
        Ok((self.tracker.begin(input.encode()), input))
    }

    /// Commit a finished submission; a fresh result opens the results page.
    pub fn finish_submission(
        &mut self,
        ticket: SubmissionTicket,
        outcome: crate::Result<Assessment>,
    ) -> CommitOutcome {
        let committed = self.tracker.commit(ticket, outcome);
        if matches!(committed, CommitOutcome::Committed { .. }) {
            self.page = Page::Results;
        }
        committed
    }

    /// Run a submission end to end with `run` as the unit of work.
    ///
    /// # Errors
    /// Returns `PulmoError::Validation` if the form is rejected; failures
    /// inside `run` are reported through `CommitOutcome::Failed`.
    pub fn submit_with<F>(&mut self, raw: &RawSelections, run: F) -> crate::Result<CommitOutcome>
    where
        F: FnOnce(&PatientInput) -> crate::Result<Assessment>,
    {
        let (ticket, input) = self.begin_submission(raw)?;
        let outcome = run(&input);
        Ok(self.finish_submission(ticket, outcome))
    }

    /// Run a submission synchronously against `service`.
    ///
    /// # Errors
    /// Returns `PulmoError::Validation` if the form is rejected.
    pub fn submit<C: RiskClassifier>(
        &mut self,
        raw: &RawSelections,
        service: &PredictionService<C>,
    ) -> crate::Result<CommitOutcome> {
        self.submit_with(raw, |input| service.assess(input))
    }
}
