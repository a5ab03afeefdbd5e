//! SQLite adapter: Implementation of AccountStore.
//!
//! Provides local persistence for user accounts. Only Argon2id PHC strings
//! are stored, never plaintext passwords.
//!
//! # Connections
//!
//! Each operation opens its own connection and drops it on return, so no
//! handle is shared between threads and there is nothing to lock.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::ports::{AccountStore, InsertOutcome};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// SQLite account store adapter.
#[derive(Debug, Clone)]
pub struct SqliteAccountStore {
    path: PathBuf,
}

impl SqliteAccountStore {
    /// Create a store backed by the database file at `path`.
    ///
    /// The file is created on first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Number of stored accounts.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn count(&self) -> Result<usize, StorageError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM userstable", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl AccountStore for SqliteAccountStore {
    type Error = StorageError;

    fn create_if_missing(&self) -> Result<(), Self::Error> {
        let conn = self.connect()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS userstable (
                username TEXT PRIMARY KEY,
                password TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn insert(&self, username: &str, password_hash: &str) -> Result<InsertOutcome, Self::Error> {
        let conn = self.connect()?;
        match conn.execute(
            "INSERT INTO userstable (username, password) VALUES (?1, ?2)",
            params![username, password_hash],
        ) {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                tracing::info!("Signup rejected: username already exists");
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn lookup(&self, username: &str) -> Result<Option<String>, Self::Error> {
        let conn = self.connect()?;
        let hash = conn
            .query_row(
                "SELECT password FROM userstable WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SqliteAccountStore) {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let store = SqliteAccountStore::new(dir.path().join("usersdata.db"));
        store.create_if_missing().expect("Should create table");
        (dir, store)
    }

    #[test]
    fn test_insert_and_lookup() {
        let (_dir, store) = temp_store();

        assert!(store.lookup("alice").expect("Should query").is_none());
        assert_eq!(
            store.insert("alice", "$argon2id$hash").expect("Should insert"),
            InsertOutcome::Created
        );
        assert_eq!(
            store.lookup("alice").expect("Should query").as_deref(),
            Some("$argon2id$hash")
        );
    }

    #[test]
    fn test_duplicate_username_keeps_single_row() {
        let (_dir, store) = temp_store();

        store.insert("alice", "first").expect("Should insert");
        assert_eq!(
            store.insert("alice", "second").expect("Should not error"),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(store.count().expect("Should count"), 1);
        assert_eq!(store.lookup("alice").expect("Should query").as_deref(), Some("first"));
    }

    #[test]
    fn test_create_if_missing_is_idempotent() {
        let (_dir, store) = temp_store();
        store.insert("bob", "hash").expect("Should insert");
        store.create_if_missing().expect("Should not fail twice");
        assert_eq!(store.count().expect("Should count"), 1);
    }

    #[test]
    fn test_unopenable_path_is_error() {
        let dir = tempfile::tempdir().expect("Should create tempdir");
        let store = SqliteAccountStore::new(dir.path().join("missing").join("db.sqlite"));
        assert!(store.create_if_missing().is_err());
    }
}
