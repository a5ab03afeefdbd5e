//! Account store port: Trait for persistent user credentials.
//!
//! This trait abstracts the storage backend (SQLite) from the account service.

/// Result of inserting a new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    /// The username is taken; nothing was written.
    AlreadyExists,
}

/// Trait for account storage.
///
/// Usernames are unique; the store enforces this, not the caller.
pub trait AccountStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create the accounts table if it does not exist yet.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn create_if_missing(&self) -> Result<(), Self::Error>;

    /// Insert a username with its password hash.
    ///
    /// # Errors
    /// Returns error if storage operation fails for any reason other than a
    /// duplicate username.
    fn insert(&self, username: &str, password_hash: &str) -> Result<InsertOutcome, Self::Error>;

    /// Fetch the stored password hash for a username.
    ///
    /// # Returns
    /// `None` if the user does not exist.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn lookup(&self, username: &str) -> Result<Option<String>, Self::Error>;
}
