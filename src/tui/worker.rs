//! Background submission worker.
//!
//! Runs the prediction off the UI thread so the main loop keeps drawing.
//! Every message carries the submission id it belongs to; the app commits
//! it through the tracker, which drops anything stale.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::{Assessment, PredictionService};
use crate::domain::PatientInput;
use crate::ports::RiskClassifier;

/// Final message from a worker.
#[derive(Debug)]
pub struct SubmissionDone {
    pub submission_id: u64,
    pub outcome: crate::Result<Assessment>,
}

/// Poll result for a running worker.
#[derive(Debug)]
pub enum WorkerPoll {
    Pending,
    Done(SubmissionDone),
    /// The worker thread went away without reporting.
    Lost,
}

/// Handle to a running submission worker.
pub struct SubmissionWorkerHandle {
    submission_id: u64,
    done_rx: Receiver<SubmissionDone>,
    _handle: JoinHandle<()>,
}

impl SubmissionWorkerHandle {
    #[must_use]
    pub fn submission_id(&self) -> u64 {
        self.submission_id
    }

    /// Non-blocking check for the result.
    #[must_use]
    pub fn try_recv(&self) -> WorkerPoll {
        match self.done_rx.try_recv() {
            Ok(done) => WorkerPoll::Done(done),
            Err(TryRecvError::Empty) => WorkerPoll::Pending,
            Err(TryRecvError::Disconnected) => WorkerPoll::Lost,
        }
    }
}

/// Spawns one thread per submission.
pub struct SubmissionWorker;

impl SubmissionWorker {
    /// Run `service.assess(input)` in the background.
    pub fn spawn<C>(
        service: Arc<PredictionService<C>>,
        submission_id: u64,
        input: PatientInput,
    ) -> SubmissionWorkerHandle
    where
        C: RiskClassifier + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            tracing::debug!(submission_id, "Worker started");
            let outcome = service.assess(&input);
            // The receiver is gone if the app quit or dropped this handle.
            let _ = tx.send(SubmissionDone {
                submission_id,
                outcome,
            });
        });

        SubmissionWorkerHandle {
            submission_id,
            done_rx: rx,
            _handle: handle,
        }
    }
}
