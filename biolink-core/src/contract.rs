//! # contract: shared types and the network seam
//!
//! Plain data describing what the localization pipeline works on ([`AssetSpec`]) and what it
//! produced ([`DownloadResult`]), plus the [`AssetFetcher`] trait every network access goes
//! through.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so tests get a `MockAssetFetcher` (exported under the
//!   default `test-export-mocks` feature for use from integration tests).
//! - The production implementation is [`crate::download::HttpFetcher`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::SiteConfig;

/// The fixed set of assets mirrored into the public asset directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    ProfileImage,
    ContactName,
    ContactStreet,
    ContactCity,
    ContactCountry,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::ProfileImage,
        AssetKind::ContactName,
        AssetKind::ContactStreet,
        AssetKind::ContactCity,
        AssetKind::ContactCountry,
    ];

    /// File name inside the asset directory.
    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::ProfileImage => "profile-image.jpg",
            AssetKind::ContactName => "contact-name.svg",
            AssetKind::ContactStreet => "contact-street.svg",
            AssetKind::ContactCity => "contact-city.svg",
            AssetKind::ContactCountry => "contact-country.svg",
        }
    }

    /// Path the page references the local copy by.
    pub fn web_path(self) -> String {
        format!("/assets/{}", self.file_name())
    }

    /// The configured value (remote URL or local path) for this asset, if any.
    pub fn configured_value(self, config: &SiteConfig) -> Option<&str> {
        let value = match self {
            AssetKind::ProfileImage => &config.profile.image,
            AssetKind::ContactName => &config.contact.name_svg,
            AssetKind::ContactStreet => &config.contact.street_svg,
            AssetKind::ContactCity => &config.contact.city_svg,
            AssetKind::ContactCountry => &config.contact.country_svg,
        };
        value.as_deref()
    }
}

/// One asset to localize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    pub kind: AssetKind,
    /// Present only when a remote origin is configured.
    pub source_url: Option<String>,
    /// Always `<assets_dir>/<kind.file_name()>`.
    pub local_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The asset now exists at `local_path`.
    Downloaded { bytes: u64 },
    /// Nothing remote to fetch for this spec.
    Skipped,
    /// The asset is absent at `local_path`; dependents fall back.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub spec: AssetSpec,
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Failed { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a network URL: {0}")]
    UnsupportedScheme(String),
}

/// Network access used by the pipeline and the card generator.
///
/// Implementations must never leave a partial file at `dest`: either the full body is there
/// when `fetch_to_file` returns `Ok`, or nothing new is.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Stream the body at `url` into `dest`, returning the number of bytes written.
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;

    /// Fetch the body at `url` into memory.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
