//! Manifest utility for PulmoPredict model artifacts.
//!
//! Writes `manifest.json` with SHA-256 digests of `voting_model.json` and,
//! when present, `scaler.json`. The model is parsed and validated first so a
//! broken export is never hashed.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_model -- <model_dir>          # write manifest
//! cargo run --bin hash_model -- <model_dir> --check  # verify existing manifest
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};

use pulmopredict::adapters::ensemble::{
    ArtifactManifest, ModelArtifacts, VotingEnsemble, MANIFEST_FILE, MODEL_FILE, SCALER_FILE,
};

fn usage() -> String {
    "Usage: hash_model <model_dir> [--check]".to_string()
}

fn parse_args() -> anyhow::Result<(PathBuf, bool)> {
    let mut model_dir: Option<PathBuf> = None;
    let mut check = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--check" => check = true,
            "-h" | "--help" => bail!(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => bail!(usage()),
        }
    }

    let model_dir = model_dir.with_context(usage)?;
    Ok((model_dir, check))
}

fn main() -> anyhow::Result<()> {
    let (model_dir, check) = parse_args()?;
    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .context("Model path has no parent directory")?
            .to_path_buf()
    } else {
        model_dir
    };

    if check {
        let artifacts = ModelArtifacts::load(&model_dir, true)
            .with_context(|| format!("Verification failed for {model_dir:?}"))?;
        println!("Manifest OK (model fingerprint {})", artifacts.fingerprint);
        return Ok(());
    }

    let model_bytes = fs::read(model_dir.join(MODEL_FILE))
        .with_context(|| format!("No {MODEL_FILE} in {model_dir:?}"))?;
    VotingEnsemble::from_json(&model_bytes).context("Refusing to hash an invalid model")?;

    let mut names = vec![MODEL_FILE];
    if model_dir.join(SCALER_FILE).exists() {
        names.push(SCALER_FILE);
    } else {
        eprintln!("warning: no {SCALER_FILE}; the model will run on unscaled features");
    }

    let manifest = ArtifactManifest::for_files(&model_dir, &names)?;
    let manifest_path = model_dir.join(MANIFEST_FILE);
    let mut bytes = serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;
    bytes.push(b'\n');
    fs::write(&manifest_path, &bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    for (name, digest) in &manifest.files {
        println!("{digest}  {name}");
    }
    println!("Wrote manifest: {manifest_path:?}");
    Ok(())
}
