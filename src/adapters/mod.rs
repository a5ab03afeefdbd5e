//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `ensemble`: JSON model artifacts and soft-voting inference
//! - `sqlite`: SQLite for local account storage
//! - `report`: Plain-text assessment reports
//! - `sanitize`: Credential filtering for logs

pub mod ensemble;
pub mod report;
pub mod sanitize;
pub mod sqlite;

// Re-export error types for lib.rs
pub use ensemble::ArtifactError;
pub use sqlite::StorageError;
