use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{debug, info};

/// Square PNG sizes derived from the profile photo.
pub const FAVICON_SIZES: [u32; 8] = [16, 32, 48, 64, 96, 128, 192, 256];
pub const ICO_SIZE: u32 = 32;
pub const APPLE_TOUCH_SIZE: u32 = 180;
pub const ICO_FILE_NAME: &str = "favicon.ico";
pub const APPLE_TOUCH_FILE_NAME: &str = "apple-touch-icon.png";

#[derive(Debug, thiserror::Error)]
pub enum FaviconError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode source image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("source image {0} has no pixels")]
    EmptySource(PathBuf),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaviconFormat {
    Png,
    Ico,
}

impl FaviconFormat {
    fn image_format(self) -> ImageFormat {
        match self {
            FaviconFormat::Png => ImageFormat::Png,
            FaviconFormat::Ico => ImageFormat::Ico,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaviconTarget {
    pub size: u32,
    pub path: PathBuf,
    pub format: FaviconFormat,
}

/// Everything written by one [`generate_favicons`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaviconSet {
    pub pngs: Vec<FaviconTarget>,
    pub ico: FaviconTarget,
    pub apple_touch: FaviconTarget,
}

impl FaviconSet {
    pub fn files(&self) -> impl Iterator<Item = &FaviconTarget> {
        self.pngs.iter().chain([&self.ico, &self.apple_touch])
    }
}

pub fn png_file_name(size: u32) -> String {
    format!("favicon-{size}x{size}.png")
}

/// The ten outputs under `public_dir`, PNG sizes first.
pub fn favicon_targets(public_dir: &Path) -> Vec<FaviconTarget> {
    let mut targets: Vec<FaviconTarget> = FAVICON_SIZES
        .iter()
        .map(|&size| FaviconTarget {
            size,
            path: public_dir.join(png_file_name(size)),
            format: FaviconFormat::Png,
        })
        .collect();
    targets.push(FaviconTarget {
        size: ICO_SIZE,
        path: public_dir.join(ICO_FILE_NAME),
        format: FaviconFormat::Ico,
    });
    targets.push(FaviconTarget {
        size: APPLE_TOUCH_SIZE,
        path: public_dir.join(APPLE_TOUCH_FILE_NAME),
        format: FaviconFormat::Png,
    });
    targets
}

/// Derive the favicon set from `source` into `public_dir`.
///
/// The source format is sniffed from its content, so a PNG saved under a `.jpg` name still
/// decodes. Each target is a cover-fit resize: the image fills the square and the excess is
/// cropped. The first failing target fails the batch; files written before it stay in place.
pub fn generate_favicons(source: &Path, public_dir: &Path) -> Result<FaviconSet, FaviconError> {
    let img = decode(source)?;
    fs::create_dir_all(public_dir).map_err(|e| FaviconError::CreateDir {
        path: public_dir.to_path_buf(),
        source: e,
    })?;

    let mut targets = favicon_targets(public_dir);
    for target in &targets {
        let icon = cover_fit(&img, target.size);
        icon.save_with_format(&target.path, target.format.image_format())
            .map_err(|e| FaviconError::Write {
                path: target.path.clone(),
                source: e,
            })?;
        debug!(path = %target.path.display(), size = target.size, "Wrote favicon");
    }

    let apple_touch = targets.pop().ok_or_else(|| FaviconError::EmptySource(source.to_path_buf()))?;
    let ico = targets.pop().ok_or_else(|| FaviconError::EmptySource(source.to_path_buf()))?;
    info!(source = %source.display(), count = targets.len() + 2, "Generated favicon set");
    Ok(FaviconSet {
        pngs: targets,
        ico,
        apple_touch,
    })
}

fn decode(source: &Path) -> Result<DynamicImage, FaviconError> {
    let reader = ImageReader::open(source)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| FaviconError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
    let img = reader.decode().map_err(|e| FaviconError::Decode {
        path: source.to_path_buf(),
        source: e,
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(FaviconError::EmptySource(source.to_path_buf()));
    }
    Ok(img)
}

fn cover_fit(img: &DynamicImage, size: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(img.resize_to_fill(size, size, FilterType::Lanczos3).to_rgba8())
}
