//! High-level pipeline: download → favicons → marker.
//!
//! This module orchestrates asset localization for one build:
//!   - Builds the fixed [`AssetSpec`](crate::contract::AssetSpec) list from the config
//!   - Downloads every remote asset concurrently and joins on all of them
//!   - Derives the favicon set once the profile image is on disk
//!   - Writes the marker listing every asset that is now local
//!
//! # Error Handling
//! A failed download is logged and recorded in the report; it never stops the run. A failed
//! favicon derivation is recorded as [`FaviconOutcome::Failed`] for the caller to surface, after
//! the marker has been written. Only an I/O failure on the asset directory or the marker itself
//! is returned as [`PipelineError`].

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::SiteConfig;
use crate::contract::{AssetFetcher, AssetKind, DownloadResult};
use crate::download::{asset_specs, download_all};
use crate::favicon::{generate_favicons, FaviconSet};
use crate::marker::{write_marker, AssetMarker, MarkerError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to create asset directory {path}: {source}")]
    AssetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Marker(#[from] MarkerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaviconOutcome {
    Generated(FaviconSet),
    /// No usable profile image on disk.
    Skipped,
    Failed(String),
}

#[derive(Debug)]
pub struct LocalizationReport {
    pub downloads: Vec<DownloadResult>,
    pub favicons: FaviconOutcome,
    pub marker: AssetMarker,
}

impl LocalizationReport {
    pub fn failed_count(&self) -> usize {
        self.downloads.iter().filter(|d| d.is_failed()).count()
    }
}

/// Runs asset localization for `config`.
pub async fn localize<F>(config: &SiteConfig, fetcher: &F) -> Result<LocalizationReport, PipelineError>
where
    F: AssetFetcher + ?Sized,
{
    let assets_dir = config.build.assets_dir();
    info!(assets_dir = %assets_dir.display(), "[LOCALIZE] Starting asset localization");

    tokio::fs::create_dir_all(&assets_dir)
        .await
        .map_err(|e| PipelineError::AssetDir {
            path: assets_dir.clone(),
            source: e,
        })?;

    // Step 1: download everything remote, concurrently.
    let specs = asset_specs(config);
    let downloads = download_all(specs, fetcher, config.build.concurrency).await;

    // Step 2: favicons, strictly after the profile image download has settled.
    let favicons = derive_favicons(config, &downloads).await;

    // Step 3: marker, written once after the join.
    let present: Vec<String> = AssetKind::ALL
        .iter()
        .map(|kind| kind.file_name())
        .filter(|name| assets_dir.join(name).is_file())
        .map(str::to_string)
        .collect();
    let marker = write_marker(&assets_dir, present).await?;

    let report = LocalizationReport {
        downloads,
        favicons,
        marker,
    };
    info!(
        failed = report.failed_count(),
        local_assets = report.marker.assets.len(),
        "[LOCALIZE] Asset localization finished"
    );
    Ok(report)
}

async fn derive_favicons(config: &SiteConfig, downloads: &[DownloadResult]) -> FaviconOutcome {
    let profile_failed = downloads
        .iter()
        .any(|d| d.spec.kind == AssetKind::ProfileImage && d.is_failed());
    let source = config.build.assets_dir().join(AssetKind::ProfileImage.file_name());

    if profile_failed || !source.is_file() {
        warn!(source = %source.display(), "[LOCALIZE] No profile image available, skipping favicons");
        return FaviconOutcome::Skipped;
    }

    let public_dir = config.build.public_dir.clone();
    let joined = tokio::task::spawn_blocking(move || generate_favicons(&source, &public_dir)).await;
    match joined {
        Ok(Ok(set)) => FaviconOutcome::Generated(set),
        Ok(Err(e)) => {
            error!(error = %e, "[LOCALIZE][ERROR] Favicon generation failed");
            FaviconOutcome::Failed(e.to_string())
        }
        Err(e) => {
            error!(error = %e, "[LOCALIZE][ERROR] Favicon task did not complete");
            FaviconOutcome::Failed(format!("favicon task did not complete: {e}"))
        }
    }
}
