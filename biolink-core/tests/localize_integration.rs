use std::io::Cursor;
use std::path::{Path, PathBuf};

use biolink_core::config::SiteConfig;
use biolink_core::contract::{AssetKind, DownloadOutcome, FetchError, MockAssetFetcher};
use biolink_core::favicon::FAVICON_SIZES;
use biolink_core::marker::read_marker;
use biolink_core::pipeline::{localize, FaviconOutcome};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tempfile::tempdir;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 255]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

fn config_in(public_dir: &Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.build.public_dir = public_dir.to_path_buf();
    config.profile.image = Some("https://cdn.example/profile.png".into());
    config.contact.name_svg = Some("https://cdn.example/name.svg".into());
    config.contact.street_svg = Some("https://cdn.example/street.svg".into());
    config.contact.city_svg = Some("/assets/contact-city.svg".into());
    config
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}

/// Mock that serves a PNG for the profile image, an SVG for the name and fails the street SVG.
fn mixed_fetcher(profile: Vec<u8>) -> MockAssetFetcher {
    let mut fetcher = MockAssetFetcher::new();
    fetcher
        .expect_fetch_to_file()
        .withf(|url, _| url.ends_with("profile.png"))
        .times(1)
        .returning(move |_, dest| {
            std::fs::write(dest, &profile).expect("write profile");
            Ok(profile.len() as u64)
        });
    fetcher
        .expect_fetch_to_file()
        .withf(|url, _| url.ends_with("name.svg"))
        .times(1)
        .returning(|_, dest| {
            std::fs::write(dest, b"<svg/>").expect("write svg");
            Ok(6)
        });
    fetcher
        .expect_fetch_to_file()
        .withf(|url, _| url.ends_with("street.svg"))
        .times(1)
        .returning(|url, _| {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        });
    fetcher
}

#[tokio::test]
async fn test_localize_downloads_derives_favicons_and_writes_marker() {
    let public = tempdir().unwrap();
    let config = config_in(public.path());
    let fetcher = mixed_fetcher(png_bytes(300, 300));

    let report = localize(&config, &fetcher).await.expect("localize should succeed");

    assert_eq!(report.downloads.len(), 5);
    assert_eq!(report.failed_count(), 1);
    let by_kind = |kind| {
        report
            .downloads
            .iter()
            .find(|d| d.spec.kind == kind)
            .expect("result for every kind")
    };
    assert!(matches!(by_kind(AssetKind::ProfileImage).outcome, DownloadOutcome::Downloaded { .. }));
    assert!(matches!(by_kind(AssetKind::ContactStreet).outcome, DownloadOutcome::Failed { .. }));
    assert_eq!(by_kind(AssetKind::ContactCity).outcome, DownloadOutcome::Skipped);
    assert_eq!(by_kind(AssetKind::ContactCountry).outcome, DownloadOutcome::Skipped);

    let set = match &report.favicons {
        FaviconOutcome::Generated(set) => set,
        other => panic!("expected favicons, got {other:?}"),
    };
    assert_eq!(set.files().count(), 10);

    // Exactly the ten favicon files land in the public root.
    let root_files = files_in(public.path());
    assert_eq!(root_files.len(), 10, "public root: {root_files:?}");
    for size in FAVICON_SIZES {
        let path = public.path().join(format!("favicon-{size}x{size}.png"));
        let img = image::open(&path).expect("favicon decodes");
        assert_eq!((img.width(), img.height()), (size, size));
    }
    let ico = image::open(public.path().join("favicon.ico")).expect("ico decodes");
    assert_eq!((ico.width(), ico.height()), (32, 32));
    let apple = image::open(public.path().join("apple-touch-icon.png")).expect("apple icon decodes");
    assert_eq!((apple.width(), apple.height()), (180, 180));

    // The failed asset left nothing behind; the marker lists what is local.
    let assets = public.path().join("assets");
    assert!(!assets.join("contact-street.svg").exists());
    assert!(!assets.join("contact-street.svg.part").exists());
    let marker = read_marker(&assets).expect("marker written");
    assert_eq!(marker, report.marker);
    assert_eq!(marker.assets, vec!["profile-image.jpg", "contact-name.svg"]);
    assert!(!marker.generated_at.is_empty());
}

#[tokio::test]
async fn test_failed_download_removes_stale_copy() {
    let public = tempdir().unwrap();
    let assets = public.path().join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("contact-street.svg"), b"<svg>old</svg>").unwrap();

    let config = config_in(public.path());
    let fetcher = mixed_fetcher(png_bytes(64, 64));

    let report = localize(&config, &fetcher).await.expect("localize should succeed");
    assert_eq!(report.failed_count(), 1);
    assert!(!assets.join("contact-street.svg").exists());
    assert!(!report.marker.contains("contact-street.svg"));
}

#[tokio::test]
async fn test_favicons_skipped_when_profile_download_fails() {
    let public = tempdir().unwrap();
    let mut config = SiteConfig::default();
    config.build.public_dir = public.path().to_path_buf();
    config.profile.image = Some("https://cdn.example/profile.png".into());

    let mut fetcher = MockAssetFetcher::new();
    fetcher.expect_fetch_to_file().times(1).returning(|url, _| {
        Err(FetchError::Status {
            url: url.to_string(),
            status: 500,
        })
    });

    let report = localize(&config, &fetcher).await.expect("localize should succeed");
    assert_eq!(report.favicons, FaviconOutcome::Skipped);
    assert!(files_in(public.path()).is_empty());
    assert!(report.marker.assets.is_empty());
}

#[tokio::test]
async fn test_favicon_failure_is_reported_and_keeps_assets() {
    let public = tempdir().unwrap();
    let config = config_in(public.path());
    let fetcher = mixed_fetcher(b"definitely not an image".to_vec());

    let report = localize(&config, &fetcher).await.expect("localize should succeed");
    assert!(matches!(report.favicons, FaviconOutcome::Failed(_)));

    let assets = public.path().join("assets");
    assert!(assets.join("profile-image.jpg").is_file());
    assert!(assets.join("contact-name.svg").is_file());
    assert_eq!(report.marker.assets, vec!["profile-image.jpg", "contact-name.svg"]);
}

#[tokio::test]
async fn test_local_only_config_fetches_nothing() {
    let public = tempdir().unwrap();
    let assets = public.path().join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("profile-image.jpg"), png_bytes(48, 48)).unwrap();

    let mut config = SiteConfig::default();
    config.build.public_dir = public.path().to_path_buf();
    config.profile.image = Some("/assets/profile-image.jpg".into());

    let mut fetcher = MockAssetFetcher::new();
    fetcher.expect_fetch_to_file().never();

    let report = localize(&config, &fetcher).await.expect("localize should succeed");
    assert!(report
        .downloads
        .iter()
        .all(|d| d.outcome == DownloadOutcome::Skipped));
    assert!(matches!(report.favicons, FaviconOutcome::Generated(_)));
    assert_eq!(report.marker.assets, vec!["profile-image.jpg"]);
}
