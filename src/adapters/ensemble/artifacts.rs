//! Loading and integrity checking of the model directory.
//!
//! Layout:
//! - `voting_model.json`: the ensemble (required)
//! - `scaler.json`: fitted mean/scale for the continuous features (optional)
//! - `manifest.json`: SHA-256 digests binding the files above (optional
//!   unless `require_manifest` is set)

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::VotingEnsemble;
use crate::domain::{ScalerError, StandardScaler};

pub const MODEL_FILE: &str = "voting_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors loading model artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0:?}")]
    Missing(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid {file}: {message}")]
    Parse { file: &'static str, message: String },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid scaler: {0}")]
    InvalidScaler(#[from] ScalerError),

    #[error("manifest rejected: {0}")]
    Manifest(String),

    #[error("file hash mismatch for {0}")]
    HashMismatch(String),
}

/// `manifest.json` contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Build a manifest over the given files inside `dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError` if any file cannot be read.
    pub fn for_files(dir: &Path, names: &[&str]) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in names {
            let bytes = read_file(&dir.join(name))?;
            files.insert((*name).to_string(), sha256_hex(&bytes));
        }
        Ok(Self { version: 1, files })
    }
}

#[derive(Debug, Deserialize)]
struct ScalerFile {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Lowercase hex SHA-256.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ArtifactError::Missing(path.to_path_buf()),
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Everything inference needs, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub ensemble: Arc<VotingEnsemble>,
    /// `None` when `scaler.json` is absent; features then go in unscaled.
    pub scaler: Option<StandardScaler>,
    /// Short digest of the model file, for logs.
    pub fingerprint: String,
}

impl ModelArtifacts {
    /// Load and verify the artifacts in `dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the model is missing or invalid, the scaler
    /// is present but corrupt, or the manifest does not match.
    pub fn load(dir: &Path, require_manifest: bool) -> Result<Self, ArtifactError> {
        let verified = verify_manifest(dir, require_manifest)?;

        let model_bytes = read_file(&dir.join(MODEL_FILE))?;
        let ensemble = VotingEnsemble::from_json(&model_bytes)?;
        let fingerprint = sha256_hex(&model_bytes)[..12].to_string();

        let scaler_path = dir.join(SCALER_FILE);
        let scaler = match read_file(&scaler_path) {
            Ok(bytes) => {
                let parsed: ScalerFile =
                    serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Parse {
                        file: SCALER_FILE,
                        message: e.to_string(),
                    })?;
                Some(StandardScaler::try_new(&parsed.mean, &parsed.scale)?)
            }
            Err(ArtifactError::Missing(_)) => {
                tracing::warn!(
                    "No scaler found at {:?}; features will be passed to the model unscaled",
                    scaler_path
                );
                None
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            fingerprint = %fingerprint,
            forest_trees = ensemble.random_forest.trees.len(),
            boosting_trees = ensemble.gradient_boosting.trees.len(),
            scaled = scaler.is_some(),
            manifest = verified,
            "Loaded model artifacts from {:?}",
            dir
        );

        Ok(Self {
            ensemble: Arc::new(ensemble),
            scaler,
            fingerprint,
        })
    }
}

/// Check `manifest.json` against the files on disk.
///
/// Returns whether a manifest was verified.
fn verify_manifest(dir: &Path, require_manifest: bool) -> Result<bool, ArtifactError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let content = match read_file(&manifest_path) {
        Ok(bytes) => bytes,
        Err(ArtifactError::Missing(_)) if !require_manifest => {
            tracing::warn!(
                "No {} in {:?}; loading artifacts unverified",
                MANIFEST_FILE,
                dir
            );
            return Ok(false);
        }
        Err(ArtifactError::Missing(_)) => {
            tracing::error!("{} required but missing in {:?}", MANIFEST_FILE, dir);
            return Err(ArtifactError::Manifest(format!("{MANIFEST_FILE} is required")));
        }
        Err(e) => return Err(e),
    };

    let manifest: ArtifactManifest =
        serde_json::from_slice(&content).map_err(|e| ArtifactError::Parse {
            file: MANIFEST_FILE,
            message: e.to_string(),
        })?;
    if manifest.version != 1 {
        return Err(ArtifactError::Manifest(format!(
            "unsupported manifest version: {}",
            manifest.version
        )));
    }
    if !manifest.files.contains_key(MODEL_FILE) {
        return Err(ArtifactError::Manifest(format!("{MODEL_FILE} is not bound")));
    }
    if dir.join(SCALER_FILE).exists() && !manifest.files.contains_key(SCALER_FILE) {
        return Err(ArtifactError::Manifest(format!("{SCALER_FILE} is not bound")));
    }

    for (rel, expected_hex) in &manifest.files {
        if rel.contains("..") || Path::new(rel).is_absolute() {
            return Err(ArtifactError::Manifest(format!("invalid path {rel:?}")));
        }
        let bytes = read_file(&dir.join(rel))?;
        if !constant_time_eq_str(&sha256_hex(&bytes), &expected_hex.to_ascii_lowercase()) {
            return Err(ArtifactError::HashMismatch(rel.clone()));
        }
    }

    tracing::info!("Artifact hashes verified against {}", MANIFEST_FILE);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_JSON: &str = r#"{
        "n_features": 14,
        "random_forest": {"trees": [{"nodes": [{"value": [1.0, 1.0]}]}]},
        "gradient_boosting": {"init_raw": 0.0, "learning_rate": 0.1,
                              "trees": [{"nodes": [{"value": [0.0]}]}]},
        "logistic_regression": {"coefficients": [0,0,0,0,0,0,0,0,0,0,0,0,0,0], "intercept": 0.0}
    }"#;

    const SCALER_JSON: &str =
        r#"{"mean": [55, 2.5, 120, 80, 2.8, 8], "scale": [12, 1.8, 50, 60, 0.9, 10]}"#;

    fn write_artifacts(dir: &Path, with_scaler: bool) {
        fs::write(dir.join(MODEL_FILE), MODEL_JSON).expect("write model");
        if with_scaler {
            fs::write(dir.join(SCALER_FILE), SCALER_JSON).expect("write scaler");
        }
    }

    fn write_manifest(dir: &Path, names: &[&str]) {
        let manifest = ArtifactManifest::for_files(dir, names).expect("hash files");
        let bytes = serde_json::to_vec(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), bytes).expect("write manifest");
    }

    #[test]
    fn test_load_without_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), true);

        let artifacts = ModelArtifacts::load(dir.path(), false).expect("load");
        assert!(artifacts.scaler.is_some());
        assert_eq!(artifacts.fingerprint.len(), 12);
    }

    #[test]
    fn test_missing_scaler_degrades() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), false);

        let artifacts = ModelArtifacts::load(dir.path(), false).expect("load");
        assert!(artifacts.scaler.is_none());
    }

    #[test]
    fn test_missing_model_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            ModelArtifacts::load(dir.path(), false),
            Err(ArtifactError::Missing(_))
        ));
    }

    #[test]
    fn test_corrupt_scaler_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), false);
        fs::write(
            dir.path().join(SCALER_FILE),
            r#"{"mean": [1, 2], "scale": [1, 2]}"#,
        )
        .expect("write scaler");

        assert!(matches!(
            ModelArtifacts::load(dir.path(), false),
            Err(ArtifactError::InvalidScaler(_))
        ));
    }

    #[test]
    fn test_manifest_verified() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), true);
        write_manifest(dir.path(), &[MODEL_FILE, SCALER_FILE]);

        assert!(ModelArtifacts::load(dir.path(), true).is_ok());
    }

    #[test]
    fn test_tampered_model_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), true);
        write_manifest(dir.path(), &[MODEL_FILE, SCALER_FILE]);
        fs::write(
            dir.path().join(MODEL_FILE),
            MODEL_JSON.replace("0.1", "0.2"),
        )
        .expect("tamper");

        assert!(matches!(
            ModelArtifacts::load(dir.path(), false),
            Err(ArtifactError::HashMismatch(name)) if name == MODEL_FILE
        ));
    }

    #[test]
    fn test_unbound_scaler_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), true);
        write_manifest(dir.path(), &[MODEL_FILE]);

        assert!(matches!(
            ModelArtifacts::load(dir.path(), false),
            Err(ArtifactError::Manifest(_))
        ));
    }

    #[test]
    fn test_required_manifest_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_artifacts(dir.path(), true);

        assert!(matches!(
            ModelArtifacts::load(dir.path(), true),
            Err(ArtifactError::Manifest(_))
        ));
    }
}
