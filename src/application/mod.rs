//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod accounts;
mod prediction;
mod session;
mod tracker;

pub use accounts::{AccountService, SignupOutcome};
pub use prediction::{Assessment, PredictionService};
pub use session::{Page, SessionContext};
pub use tracker::{CommitOutcome, SubmissionState, SubmissionTicket, SubmissionTracker};
