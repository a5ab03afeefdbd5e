//! # PulmoPredict
//!
//! Lung cancer mortality risk assessment backed by a soft-voting ensemble.
//!
//! This crate provides:
//! - Typed encoding of clinical inputs into a fixed 14-feature vector
//! - Standard scaling and ensemble inference (random forest, gradient
//!   boosting, logistic regression) from exported JSON artifacts
//! - Submission tracking that keeps stale results off the screen
//! - Local accounts with Argon2id password hashes
//! - Terminal UI for local-only deployment
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (features, predictions, narratives)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (ensemble artifacts, SQLite, reports)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{FeatureVector, PatientInput, Prediction, RiskLabel};

/// Result type for PulmoPredict operations
pub type Result<T> = std::result::Result<T, PulmoError>;

/// Main error type for PulmoPredict
#[derive(Debug, thiserror::Error)]
pub enum PulmoError {
    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Prediction model unavailable: {0}")]
    ModelUnavailable(#[from] adapters::ArtifactError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] domain::PredictionError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Password processing failed: {0}")]
    Password(#[from] domain::password::PasswordError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ports::ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PulmoError {
    /// Message safe to show on screen.
    ///
    /// Storage failures are logged with detail at the boundary; the user only
    /// sees a generic retry message for them.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::ModelUnavailable(_) => "Unable to load prediction model.".to_string(),
            Self::Prediction(_) => {
                "The model could not score this input. Please check the values.".to_string()
            }
            Self::Storage(_) | Self::Password(_) => {
                "An error occurred. Please try again.".to_string()
            }
            Self::Report(e) => format!("Report could not be generated: {e}"),
            Self::Io(_) => "An internal error occurred. Please try again.".to_string(),
        }
    }
}
