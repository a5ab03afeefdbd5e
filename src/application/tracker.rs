//! Submission tracking: only the newest submission may publish a result.
//!
//! Every submission takes a ticket carrying a monotonically increasing id.
//! When the computation finishes, the ticket is committed; if another
//! submission started in between, the result is discarded as superseded.

use crate::application::Assessment;
use crate::domain::FeatureVector;
use crate::PulmoError;

/// Where the newest submission stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Running(u64),
    Complete(u64),
    Failed(u64),
}

/// Proof that a submission was started. Consumed by `commit`.
///
/// Carries the encoded features so a failure can be logged with its input.
#[derive(Debug)]
#[must_use = "a submission ticket must be committed"]
pub struct SubmissionTicket {
    id: u64,
    epoch: u64,
    features: FeatureVector,
}

impl SubmissionTicket {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// What happened to a committed result.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Result stored and visible.
    Committed { id: u64 },
    /// A newer submission exists; the result was dropped.
    Superseded { id: u64, current: u64 },
    /// The computation failed; no partial result is kept.
    Failed { id: u64, message: String },
}

/// Tracks the current submission id and its result.
#[derive(Debug)]
pub struct SubmissionTracker {
    counter: u64,
    // Bumped by `reset` so tickets issued before it never match a reused id.
    epoch: u64,
    state: SubmissionState,
    result: Option<Assessment>,
    last_error: Option<String>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: 0,
            epoch: 0,
            state: SubmissionState::Idle,
            result: None,
            last_error: None,
        }
    }

    /// Start a submission: advance the counter and clear the stored result.
    pub fn begin(&mut self, features: FeatureVector) -> SubmissionTicket {
        self.counter += 1;
        self.state = SubmissionState::Running(self.counter);
        self.result = None;
        self.last_error = None;
        tracing::debug!(
            submission_id = self.counter,
            features = %features,
            "Submission started"
        );
        SubmissionTicket {
            id: self.counter,
            epoch: self.epoch,
            features,
        }
    }

    /// Publish the outcome of a submission if it is still the newest one.
    pub fn commit(
        &mut self,
        ticket: SubmissionTicket,
        outcome: Result<Assessment, PulmoError>,
    ) -> CommitOutcome {
        let current = if ticket.epoch == self.epoch { self.counter } else { 0 };
        let is_current =
            ticket.epoch == self.epoch && self.state == SubmissionState::Running(ticket.id);

        if !is_current {
            tracing::info!(
                submission_id = ticket.id,
                current,
                "Discarding superseded submission result"
            );
            return CommitOutcome::Superseded {
                id: ticket.id,
                current,
            };
        }

        match outcome {
            Ok(assessment) => {
                tracing::info!(
                    submission_id = ticket.id,
                    label = %assessment.prediction.label,
                    p_high = assessment.prediction.probabilities.high,
                    "Submission committed"
                );
                self.state = SubmissionState::Complete(ticket.id);
                self.result = Some(assessment);
                CommitOutcome::Committed { id: ticket.id }
            }
            Err(e) => {
                tracing::error!(
                    submission_id = ticket.id,
                    features = %ticket.features,
                    error = %e,
                    "Submission failed"
                );
                let message = e.user_message();
                self.state = SubmissionState::Failed(ticket.id);
                self.result = None;
                self.last_error = Some(message.clone());
                CommitOutcome::Failed {
                    id: ticket.id,
                    message,
                }
            }
        }
    }

    /// Back to `Idle` with the counter at zero.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.epoch += 1;
        self.state = SubmissionState::Idle;
        self.result = None;
        self.last_error = None;
    }

    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    #[must_use]
    pub fn current_id(&self) -> u64 {
        self.counter
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, SubmissionState::Running(_))
    }

    /// The committed result of the newest submission, if any.
    #[must_use]
    pub fn result(&self) -> Option<&Assessment> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sanitize::tests::capture_logs;
    use crate::domain::{ClassProbabilities, PatientInput, Prediction, ValidationError};
    use std::io;

    fn features() -> FeatureVector {
        PatientInput::default().encode()
    }

    fn assessment(high: f64) -> Assessment {
        let input = PatientInput::default();
        Assessment {
            features: input.encode(),
            input,
            prediction: Prediction::from_probabilities(
                ClassProbabilities::from_high(high).expect("finite probability"),
            ),
        }
    }

    #[test]
    fn test_ids_strictly_increase_and_reset() {
        let mut tracker = SubmissionTracker::new();
        assert_eq!(tracker.state(), SubmissionState::Idle);

        let mut last = 0;
        for _ in 0..5 {
            let ticket = tracker.begin(features());
            assert!(ticket.id() > last);
            last = ticket.id();
            let _ = tracker.commit(ticket, Ok(assessment(0.3)));
        }
        assert_eq!(tracker.current_id(), 5);

        tracker.reset();
        assert_eq!(tracker.current_id(), 0);
        assert_eq!(tracker.state(), SubmissionState::Idle);
        assert!(tracker.result().is_none());
        assert_eq!(tracker.begin(features()).id(), 1);
    }

    #[test]
    fn test_commit_current_stores_result() {
        let mut tracker = SubmissionTracker::new();
        let ticket = tracker.begin(features());
        assert_eq!(tracker.state(), SubmissionState::Running(1));

        assert_eq!(
            tracker.commit(ticket, Ok(assessment(0.8))),
            CommitOutcome::Committed { id: 1 }
        );
        assert_eq!(tracker.state(), SubmissionState::Complete(1));
        assert!(tracker.result().is_some());
    }

    #[test]
    fn test_second_finishing_first_wins() {
        let mut tracker = SubmissionTracker::new();
        let first = tracker.begin(features());
        let second = tracker.begin(features());

        assert_eq!(
            tracker.commit(second, Ok(assessment(0.9))),
            CommitOutcome::Committed { id: 2 }
        );
        assert_eq!(
            tracker.commit(first, Ok(assessment(0.1))),
            CommitOutcome::Superseded { id: 1, current: 2 }
        );

        let shown = tracker.result().expect("second result visible");
        assert!((shown.prediction.probabilities.high - 0.9).abs() < 1e-12);
        assert_eq!(tracker.state(), SubmissionState::Complete(2));
    }

    #[test]
    fn test_stale_result_while_newer_runs() {
        let mut tracker = SubmissionTracker::new();
        let first = tracker.begin(features());
        let _second = tracker.begin(features());

        assert!(matches!(
            tracker.commit(first, Ok(assessment(0.9))),
            CommitOutcome::Superseded { .. }
        ));
        assert!(tracker.result().is_none());
        assert_eq!(tracker.state(), SubmissionState::Running(2));
    }

    #[test]
    fn test_failure_keeps_no_result() {
        let mut tracker = SubmissionTracker::new();
        let ticket = tracker.begin(features());
        let err = PulmoError::Validation(ValidationError::FeatureCount {
            expected: 14,
            actual: 13,
        });

        assert!(matches!(
            tracker.commit(ticket, Err(err)),
            CommitOutcome::Failed { id: 1, .. }
        ));
        assert_eq!(tracker.state(), SubmissionState::Failed(1));
        assert!(tracker.result().is_none());
        assert!(tracker.last_error().is_some());
    }

    #[test]
    fn test_failure_log_names_id_and_features() {
        let mut tracker = SubmissionTracker::new();
        let _ = tracker.begin(features());
        let ticket = tracker.begin(features());
        let expected = features().to_string();

        let logs = capture_logs(|| {
            let err = PulmoError::Io(io::Error::new(io::ErrorKind::Other, "worker lost"));
            let _ = tracker.commit(ticket, Err(err));
        });

        let line = logs
            .lines()
            .find(|l| l.contains("Submission failed"))
            .expect("failure is logged");
        assert!(line.contains("submission_id=2"));
        assert!(line.contains(&expected));
        assert!(line.contains("worker lost"));
    }

    #[test]
    fn test_stale_failure_does_not_overwrite() {
        let mut tracker = SubmissionTracker::new();
        let first = tracker.begin(features());
        let second = tracker.begin(features());
        let _ = tracker.commit(second, Ok(assessment(0.7)));

        let err = PulmoError::Validation(ValidationError::MissingField("age"));
        assert!(matches!(
            tracker.commit(first, Err(err)),
            CommitOutcome::Superseded { .. }
        ));
        assert_eq!(tracker.state(), SubmissionState::Complete(2));
        assert!(tracker.result().is_some());
    }

    #[test]
    fn test_ticket_from_before_reset_is_stale() {
        let mut tracker = SubmissionTracker::new();
        let old = tracker.begin(features());
        tracker.reset();
        let _fresh = tracker.begin(features());
        assert_eq!(old.id(), 1);

        assert!(matches!(
            tracker.commit(old, Ok(assessment(0.9))),
            CommitOutcome::Superseded { .. }
        ));
        assert!(tracker.result().is_none());
    }
}
