//! Input validation errors.
//!
//! Raised before any state changes; the caller re-prompts the user.

/// Malformed or incomplete user input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}: field is required")]
    MissingField(&'static str),

    #[error("{field}: unknown option {token:?}")]
    UnknownToken { field: &'static str, token: String },

    #[error("{0}: invalid number")]
    NotANumber(&'static str),

    #[error("{field}: value must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Please fill in all fields.")]
    IncompleteCredentials,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Password must be at least {0} characters.")]
    PasswordTooShort(usize),
}
