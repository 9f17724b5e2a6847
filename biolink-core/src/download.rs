use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::config::SiteConfig;
use crate::contract::{AssetFetcher, AssetKind, AssetSpec, DownloadOutcome, DownloadResult, FetchError};

/// True when `value` names something to fetch over the network.
pub fn is_remote_url(value: &str) -> bool {
    let value = value.trim_start();
    value.starts_with("https://") || value.starts_with("http://")
}

/// Builds the fixed asset specs from configuration.
///
/// A spec carries a `source_url` only when its configured value is a network URL; local paths
/// and unset values produce specs that the download step skips.
pub fn asset_specs(config: &SiteConfig) -> Vec<AssetSpec> {
    let assets_dir = config.build.assets_dir();
    AssetKind::ALL
        .iter()
        .map(|&kind| AssetSpec {
            kind,
            source_url: kind
                .configured_value(config)
                .filter(|v| is_remote_url(v))
                .map(|v| v.trim().to_string()),
            local_path: assets_dir.join(kind.file_name()),
        })
        .collect()
}

/// `dest` with `.part` appended: where bodies are streamed before the final rename.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// reqwest-backed [`AssetFetcher`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// The timeout bounds each whole request, body included.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("biolink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        if !is_remote_url(url) {
            return Err(FetchError::UnsupportedScheme(url.to_string()));
        }
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status = %status, "Remote asset returned non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        info!(url = %url, dest = %dest.display(), "Downloading asset");
        let mut response = self.get_checked(url).await?;

        let part = part_path(dest);
        let written = match stream_body(&mut response, &part).await {
            Ok(written) => written,
            Err(e) => {
                remove_if_exists(&part).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&part, dest).await {
            error!(error = ?e, part = %part.display(), dest = %dest.display(), "Failed to move downloaded asset into place");
            remove_if_exists(&part).await;
            return Err(e.into());
        }

        info!(url = %url, dest = %dest.display(), bytes = written, "Downloaded asset");
        Ok(written)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "Fetching bytes");
        let response = self.get_checked(url).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn stream_body(response: &mut reqwest::Response, path: &Path) -> Result<u64, FetchError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed incomplete file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = ?e, path = %path.display(), "Failed to remove incomplete file"),
    }
}

/// Fetches every spec concurrently, at most `concurrency` at a time, and waits for all of them.
///
/// Results come back in the order of `specs`. A failed spec never aborts the others, and leaves
/// no file at its `local_path`.
pub async fn download_all<F>(specs: Vec<AssetSpec>, fetcher: &F, concurrency: usize) -> Vec<DownloadResult>
where
    F: AssetFetcher + ?Sized,
{
    let limit = concurrency.max(1);
    info!(specs = specs.len(), concurrency = limit, "Starting asset downloads");

    let mut results: Vec<(usize, DownloadResult)> = stream::iter(specs.into_iter().enumerate())
        .map(|(index, spec)| async move { (index, download_one(spec, fetcher).await) })
        .buffer_unordered(limit)
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);

    let results: Vec<DownloadResult> = results.into_iter().map(|(_, result)| result).collect();
    let failed = results.iter().filter(|r| r.is_failed()).count();
    info!(total = results.len(), failed, "Asset downloads finished");
    results
}

async fn download_one<F>(spec: AssetSpec, fetcher: &F) -> DownloadResult
where
    F: AssetFetcher + ?Sized,
{
    let Some(url) = spec.source_url.clone() else {
        debug!(asset = ?spec.kind, "No remote source configured, skipping");
        return DownloadResult {
            spec,
            outcome: DownloadOutcome::Skipped,
        };
    };

    if let Some(parent) = spec.local_path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            error!(error = ?e, path = %parent.display(), "Failed to create asset directory");
            let reason = format!("failed to create {}: {e}", parent.display());
            return DownloadResult {
                spec,
                outcome: DownloadOutcome::Failed { reason },
            };
        }
    }

    let outcome = match fetcher.fetch_to_file(&url, &spec.local_path).await {
        Ok(bytes) => DownloadOutcome::Downloaded { bytes },
        Err(e) => {
            error!(error = %e, url = %url, asset = ?spec.kind, "Asset download failed, page will fall back");
            // A stale copy from an earlier build would hide the failure from the page.
            remove_if_exists(&spec.local_path).await;
            DownloadOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };
    DownloadResult { spec, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::contract::MockAssetFetcher;

    #[test]
    fn recognizes_network_schemes_only() {
        assert!(is_remote_url("https://example.com/a.jpg"));
        assert!(is_remote_url("http://example.com/a.svg"));
        assert!(!is_remote_url("/assets/profile-image.jpg"));
        assert!(!is_remote_url("ftp://example.com/a"));
        assert!(!is_remote_url(""));
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("public/assets/contact-name.svg")),
            PathBuf::from("public/assets/contact-name.svg.part")
        );
    }

    #[test]
    fn specs_only_carry_remote_sources() {
        let mut config = SiteConfig::default();
        config.build.public_dir = PathBuf::from("site");
        config.profile.image = Some("https://cdn.example/me.png".into());
        config.contact.name_svg = Some("/assets/contact-name.svg".into());
        config.contact.city_svg = Some("http://cdn.example/city.svg".into());

        let specs = asset_specs(&config);
        assert_eq!(specs.len(), 5);
        assert_eq!(specs[0].kind, AssetKind::ProfileImage);
        assert_eq!(specs[0].source_url.as_deref(), Some("https://cdn.example/me.png"));
        assert_eq!(specs[0].local_path, PathBuf::from("site/assets/profile-image.jpg"));
        assert_eq!(specs[1].source_url, None);
        assert_eq!(specs[2].source_url, None);
        assert_eq!(specs[3].source_url.as_deref(), Some("http://cdn.example/city.svg"));
        assert_eq!(specs[4].local_path, PathBuf::from("site/assets/contact-country.svg"));
    }

    #[tokio::test]
    async fn unwritable_asset_directory_fails_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("assets");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut fetcher = MockAssetFetcher::new();
        fetcher.expect_fetch_to_file().times(0);

        let spec = AssetSpec {
            kind: AssetKind::ContactName,
            source_url: Some("https://cdn.example/name.svg".into()),
            local_path: blocker.join("contact-name.svg"),
        };
        let results = download_all(vec![spec], &fetcher, 1).await;

        match &results[0].outcome {
            DownloadOutcome::Failed { reason } => {
                assert!(reason.starts_with("failed to create"), "got: {reason}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(results[0].spec.local_path, blocker.join("contact-name.svg"));
    }
}
