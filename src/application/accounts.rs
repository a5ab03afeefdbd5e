//! Account service: signup and login against an [`AccountStore`].

use std::sync::Arc;

use crate::adapters::StorageError;
use crate::domain::password::{self, MIN_PASSWORD_LEN};
use crate::domain::ValidationError;
use crate::ports::{AccountStore, InsertOutcome};
use crate::PulmoError;

/// Result of a signup attempt that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Created,
    /// "Username already exists."
    AlreadyExists,
}

impl SignupOutcome {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Created => "Account created successfully. Please log in.",
            Self::AlreadyExists => "Username already exists.",
        }
    }
}

/// Service for local account management.
pub struct AccountService<S>
where
    S: AccountStore,
{
    store: Arc<S>,
}

impl<S> AccountService<S>
where
    S: AccountStore,
    S::Error: Into<StorageError>,
{
    /// Create a new account service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn storage_err(e: S::Error) -> PulmoError {
        let e: StorageError = e.into();
        tracing::error!("Account storage failure: {e}");
        PulmoError::Storage(e)
    }

    /// Register a new user.
    ///
    /// # Errors
    /// Returns `PulmoError::Validation` for missing fields, mismatched or short
    /// passwords, and `PulmoError::Storage` if the database fails.
    pub fn signup(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> crate::Result<SignupOutcome> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() || confirm.is_empty() {
            return Err(ValidationError::IncompleteCredentials.into());
        }
        if password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN).into());
        }

        self.store.create_if_missing().map_err(Self::storage_err)?;
        let hash = password::hash_password(password)?;

        let outcome = match self.store.insert(username, &hash).map_err(Self::storage_err)? {
            InsertOutcome::Created => SignupOutcome::Created,
            InsertOutcome::AlreadyExists => SignupOutcome::AlreadyExists,
        };
        if outcome == SignupOutcome::Created {
            tracing::info!("New account created");
        }
        Ok(outcome)
    }

    /// Check credentials.
    ///
    /// Unknown users, wrong passwords and unreadable stored hashes all yield
    /// `Ok(false)`.
    ///
    /// # Errors
    /// Returns `PulmoError::Validation` if a field is empty and
    /// `PulmoError::Storage` if the database fails.
    pub fn login(&self, username: &str, password: &str) -> crate::Result<bool> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::IncompleteCredentials.into());
        }

        self.store.create_if_missing().map_err(Self::storage_err)?;
        let Some(stored) = self.store.lookup(username).map_err(Self::storage_err)? else {
            tracing::info!("Login failed: unknown user");
            return Ok(false);
        };

        match password::verify_password(password, &stored) {
            Ok(true) => {
                tracing::info!("Login succeeded");
                Ok(true)
            }
            Ok(false) => {
                tracing::info!("Login failed: wrong password");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Login failed: {e}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteAccountStore;

    fn service() -> (
        tempfile::TempDir,
        Arc<SqliteAccountStore>,
        AccountService<SqliteAccountStore>,
    ) {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let store = Arc::new(SqliteAccountStore::new(dir.path().join("usersdata.db")));
        let service = AccountService::new(Arc::clone(&store));
        (dir, store, service)
    }

    fn validation(result: crate::Result<SignupOutcome>) -> ValidationError {
        match result {
            Err(PulmoError::Validation(e)) => e,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_signup_then_login() {
        let (_dir, _store, service) = service();
        assert_eq!(
            service.signup("alice", "secret1", "secret1").expect("Should sign up"),
            SignupOutcome::Created
        );
        assert!(service.login("alice", "secret1").expect("Should log in"));
        assert!(!service.login("alice", "secret2").expect("Should run"));
        assert!(!service.login("nobody", "secret1").expect("Should run"));
    }

    #[test]
    fn test_duplicate_signup_rejected() {
        let (_dir, store, service) = service();
        service.signup("alice", "secret1", "secret1").expect("Should sign up");

        let second = service.signup("alice", "other-pass", "other-pass").expect("Should run");
        assert_eq!(second, SignupOutcome::AlreadyExists);
        assert_eq!(second.message(), "Username already exists.");
        assert_eq!(store.count().expect("Should count"), 1);

        // original password still works
        assert!(service.login("alice", "secret1").expect("Should log in"));
    }

    #[test]
    fn test_signup_validation_messages() {
        let (_dir, store, service) = service();

        let e = validation(service.signup("", "secret1", "secret1"));
        assert_eq!(e.to_string(), "Please fill in all fields.");

        let e = validation(service.signup("bob", "secret1", "secret2"));
        assert_eq!(e.to_string(), "Passwords do not match.");

        let e = validation(service.signup("bob", "abc", "abc"));
        assert_eq!(e.to_string(), "Password must be at least 6 characters.");

        store.create_if_missing().expect("Should create table");
        assert_eq!(store.count().expect("Should count"), 0);
    }

    #[test]
    fn test_password_is_not_stored_in_clear() {
        let (_dir, store, service) = service();
        service.signup("carol", "plaintext", "plaintext").expect("Should sign up");

        let stored = store.lookup("carol").expect("Should query").expect("Should exist");
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("plaintext"));
    }

    #[test]
    fn test_corrupt_hash_is_login_failure() {
        let (_dir, store, service) = service();
        store.create_if_missing().expect("Should create table");
        store.insert("dave", "not-a-hash").expect("Should insert");
        assert!(!service.login("dave", "anything").expect("Should run"));
    }

    #[test]
    fn test_login_requires_fields() {
        let (_dir, _store, service) = service();
        assert!(matches!(
            service.login("", "x"),
            Err(PulmoError::Validation(ValidationError::IncompleteCredentials))
        ));
    }
}
