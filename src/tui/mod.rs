//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - Login and signup forms
//! - The 14-field assessment form
//! - Results with summary, risk factors and recommendations

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::MedicalTheme;
pub use worker::{SubmissionDone, SubmissionWorker, SubmissionWorkerHandle, WorkerPoll};
