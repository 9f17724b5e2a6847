//! Marker record written after localization, so consumers can see which local copies exist
//! without probing each file.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const MARKER_FILE_NAME: &str = ".localized.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMarker {
    /// RFC 3339, UTC.
    pub generated_at: String,
    /// File names inside the asset directory.
    pub assets: Vec<String>,
}

impl AssetMarker {
    pub fn new(assets: Vec<String>) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            assets,
        }
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.assets.iter().any(|a| a == file_name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("failed to serialize marker: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write marker {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn marker_path(assets_dir: &Path) -> PathBuf {
    assets_dir.join(MARKER_FILE_NAME)
}

/// Writes the marker into `assets_dir`, replacing any earlier one.
pub async fn write_marker(assets_dir: &Path, assets: Vec<String>) -> Result<AssetMarker, MarkerError> {
    let marker = AssetMarker::new(assets);
    let path = marker_path(assets_dir);
    let json = serde_json::to_string_pretty(&marker)?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| MarkerError::Write {
            path: path.clone(),
            source: e,
        })?;
    info!(path = %path.display(), assets = marker.assets.len(), "Wrote asset marker");
    Ok(marker)
}

/// Reads the marker from `assets_dir`. Missing or unreadable markers read as `None`.
pub fn read_marker(assets_dir: &Path) -> Option<AssetMarker> {
    let path = marker_path(assets_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = ?e, path = %path.display(), "No asset marker");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(marker) => Some(marker),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Ignoring malformed asset marker");
            None
        }
    }
}
