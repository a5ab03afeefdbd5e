//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifacts, account
//! storage, report rendering).

mod account_store;
mod classifier;
mod report;

pub use account_store::{AccountStore, InsertOutcome};
pub use classifier::RiskClassifier;
pub use report::{ReportError, ReportGenerator, ReportRequest};
