//! Asset path resolution for the page.
//!
//! The page prefers the mirrored copy of an asset over its remote origin. Where availability
//! matters, it is checked on disk and reported as [`Availability`] instead of being assumed.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::{CvConfig, SiteConfig};
use crate::contract::AssetKind;
use crate::download::is_remote_url;

/// True when `value` already points into the site's asset directory.
pub fn is_local_asset_path(value: &str) -> bool {
    value.starts_with("/assets/") || value.starts_with("./assets/")
}

/// Picks the path the page should reference for a configured asset value.
///
/// A local asset path is returned unchanged. Anything else (unset, blank, remote) resolves to
/// `local_fallback`, on the assumption that localization has mirrored it there.
pub fn resolve_asset_path(configured: Option<&str>, local_fallback: &str) -> String {
    match configured.map(str::trim) {
        Some(value) if is_local_asset_path(value) => value.to_string(),
        _ => local_fallback.to_string(),
    }
}

pub fn profile_image_path(config: &SiteConfig) -> String {
    let kind = AssetKind::ProfileImage;
    resolve_asset_path(kind.configured_value(config), &kind.web_path())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSvgPaths {
    pub name: String,
    pub street: String,
    pub city: String,
    pub country: String,
}

pub fn contact_svg_paths(config: &SiteConfig) -> ContactSvgPaths {
    let resolve = |kind: AssetKind| resolve_asset_path(kind.configured_value(config), &kind.web_path());
    ContactSvgPaths {
        name: resolve(AssetKind::ContactName),
        street: resolve(AssetKind::ContactStreet),
        city: resolve(AssetKind::ContactCity),
        country: resolve(AssetKind::ContactCountry),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Availability {
    /// A file exists under the public directory for this web path.
    Local(String),
    /// No local copy, but a remote origin is configured.
    Remote(String),
    Missing,
}

impl Availability {
    pub fn href(&self) -> Option<&str> {
        match self {
            Availability::Local(path) | Availability::Remote(path) => Some(path),
            Availability::Missing => None,
        }
    }
}

/// Maps a web path such as `/assets/x.svg` onto `public_dir`.
pub fn public_file(public_dir: &Path, web_path: &str) -> std::path::PathBuf {
    public_dir.join(web_path.trim_start_matches("./").trim_start_matches('/'))
}

/// Checks whether `web_path` exists under `public_dir`.
pub fn check_availability(public_dir: &Path, web_path: &str) -> Availability {
    let file = public_file(public_dir, web_path);
    if file.is_file() {
        Availability::Local(web_path.to_string())
    } else {
        debug!(path = %file.display(), "Local asset not found");
        Availability::Missing
    }
}

/// Resolved path for `kind`, verified on disk.
///
/// Falls back to the configured remote URL when the local copy is missing, for example after a
/// failed download.
pub fn resolved_asset(config: &SiteConfig, kind: AssetKind) -> Availability {
    let configured = kind.configured_value(config);
    let path = resolve_asset_path(configured, &kind.web_path());
    match check_availability(&config.build.public_dir, &path) {
        Availability::Missing => match configured.filter(|v| is_remote_url(v)) {
            Some(url) => Availability::Remote(url.trim().to_string()),
            None => Availability::Missing,
        },
        found => found,
    }
}

/// Where the CV download button points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CvLink {
    pub href: String,
    pub file_name: String,
    pub label: String,
    /// Remote links open in a new browsing context.
    pub external: bool,
}

/// Resolves the CV link. `None` means there is nothing to offer and the button stays hidden.
pub fn resolve_cv_link(cv: &CvConfig, public_dir: &Path) -> Option<CvLink> {
    let label = format!("Download {}", cv.display_name);
    if let Some(url) = cv.url.as_deref().filter(|u| is_remote_url(u)) {
        return Some(CvLink {
            href: url.trim().to_string(),
            file_name: cv.file_name.clone(),
            label,
            external: true,
        });
    }
    let href = format!("/{}", cv.file_name.trim_start_matches('/'));
    match check_availability(public_dir, &href) {
        Availability::Local(href) => Some(CvLink {
            href,
            file_name: cv.file_name.clone(),
            label,
            external: false,
        }),
        _ => None,
    }
}
