//! Model artifact persistence
//!
//! A trained model is stored as one JSON document:
//!
//! ```json
//! { "format": "esrb-predictor-model", "formatVersion": 1, "checksum": "<sha256>", "model": { ... } }
//! ```
//!
//! The checksum covers the serialized `model` value, so a truncated or
//! hand-edited file is rejected before it can replace a working model.

use super::TrainedModel;
use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

pub const ARTIFACT_FORMAT: &str = "esrb-predictor-model";
pub const ARTIFACT_VERSION: u32 = 1;

/// Default artifact file name
pub const DEFAULT_MODEL_FILE: &str = "Model.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactRef<'a> {
    format: &'a str,
    format_version: u32,
    checksum: String,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Artifact {
    format: String,
    format_version: u32,
    checksum: String,
    model: TrainedModel,
}

/// Write `model` to `path` through a temp file and rename
pub fn save_atomic(model: &TrainedModel, path: &Path) -> Result<()> {
    let body = serde_json::to_vec(model)
        .map_err(|e| PredictorError::Artifact(format!("failed to serialize model: {}", e)))?;
    let checksum = compute_checksum(&body);
    let document = serde_json::to_vec_pretty(&ArtifactRef {
        format: ARTIFACT_FORMAT,
        format_version: ARTIFACT_VERSION,
        checksum: checksum.clone(),
        model,
    })
    .map_err(|e| PredictorError::Artifact(format!("failed to serialize artifact: {}", e)))?;

    let temp_path = path.with_extension("tmp");
    let persisted = write_synced(&temp_path, &document)
        .map_err(|e| PredictorError::io(&temp_path, e))
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| PredictorError::io(path, e)));
    if let Err(e) = persisted {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    info!(
        path = %path.display(),
        size = document.len(),
        checksum = %checksum,
        "Model artifact written"
    );
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Read and verify an artifact
pub fn load_verified(path: &Path) -> Result<TrainedModel> {
    let bytes = fs::read(path).map_err(|e| PredictorError::io(path, e))?;
    let artifact: Artifact = serde_json::from_slice(&bytes)
        .map_err(|e| PredictorError::Artifact(format!("{}: {}", path.display(), e)))?;

    if artifact.format != ARTIFACT_FORMAT {
        return Err(PredictorError::Artifact(format!(
            "unexpected format '{}', expected '{}'",
            artifact.format, ARTIFACT_FORMAT
        )));
    }
    if artifact.format_version != ARTIFACT_VERSION {
        return Err(PredictorError::Artifact(format!(
            "unsupported format version {}",
            artifact.format_version
        )));
    }

    let body = serde_json::to_vec(&artifact.model)
        .map_err(|e| PredictorError::Artifact(format!("failed to re-serialize model: {}", e)))?;
    let computed = compute_checksum(&body);
    if computed != artifact.checksum {
        return Err(PredictorError::Artifact(format!(
            "checksum mismatch: expected {}, got {}",
            artifact.checksum, computed
        )));
    }

    artifact.model.validate()?;

    debug!(path = %path.display(), checksum = %computed, "Model artifact verified");
    Ok(artifact.model)
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
