//! Runtime configuration sourced from the environment.
//!
//! Read once at startup; nothing else in the crate touches `std::env` for
//! deployment settings.

use std::path::PathBuf;

const DB_PATH_ENV: &str = "PULMO_DB_PATH";
const MODEL_DIR_ENV: &str = "PULMO_MODEL_DIR";
const REPORT_DIR_ENV: &str = "PULMO_REPORT_DIR";
const LOG_MODE_ENV: &str = "PULMO_LOG_MODE";
const LOG_FILE_ENV: &str = "PULMO_LOG_FILE";
const REQUIRE_MANIFEST_ENV: &str = "PULMO_REQUIRE_MANIFEST";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when attached to a terminal, stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite file holding user accounts.
    pub db_path: PathBuf,
    /// Directory with `voting_model.json`, `scaler.json` and optional `manifest.json`.
    pub model_dir: PathBuf,
    /// Directory exported reports are written to.
    pub report_dir: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    /// Refuse to load artifacts without a checksum manifest.
    pub require_manifest: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("usersdata.db"),
            model_dir: PathBuf::from("models"),
            report_dir: PathBuf::from("reports"),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("pulmopredict.log"),
            require_manifest: false,
        }
    }
}

impl AppConfig {
    /// Build the configuration from `PULMO_*` environment variables,
    /// falling back to defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            db_path: lookup(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            model_dir: lookup(MODEL_DIR_ENV).map_or(defaults.model_dir, PathBuf::from),
            report_dir: lookup(REPORT_DIR_ENV).map_or(defaults.report_dir, PathBuf::from),
            log_mode: lookup(LOG_MODE_ENV).map_or(defaults.log_mode, |v| LogMode::parse(&v)),
            log_file: lookup(LOG_FILE_ENV).map_or(defaults.log_file, PathBuf::from),
            require_manifest: lookup(REQUIRE_MANIFEST_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.require_manifest),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.db_path, PathBuf::from("usersdata.db"));
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.log_mode, LogMode::Auto);
        assert!(!config.require_manifest);
    }

    #[test]
    fn test_overrides_from_environment() {
        let vars: HashMap<&str, &str> = [
            (DB_PATH_ENV, "/tmp/accounts.db"),
            (MODEL_DIR_ENV, "/opt/models"),
            (LOG_MODE_ENV, "STDOUT"),
            (REQUIRE_MANIFEST_ENV, "yes"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.db_path, PathBuf::from("/tmp/accounts.db"));
        assert_eq!(config.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(config.log_mode, LogMode::Stdout);
        assert!(config.require_manifest);
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
