//! Site configuration: the single explicit value passed into the pipeline and the card generator.
//!
//! Built once at process start (see `biolink::load_config`). Nothing in the core crate reads the
//! process environment on its own; [`SiteConfig::from_lookup`] takes the lookup as a closure.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const DEFAULT_PROFILE_NAME: &str = "Your Name";
pub const DEFAULT_CV_FILE_NAME: &str = "cv.pdf";
pub const DEFAULT_CV_DISPLAY_NAME: &str = "CV";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One outbound link on the page. Order in the configured list is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    /// Preferred first name, used as the card's primary name when set.
    pub first_name: Option<String>,
    pub bio: String,
    pub email: String,
    pub website: String,
    /// Remote URL or local `/assets/...` path of the profile photo.
    pub image: Option<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            first_name: None,
            bio: String::new(),
            email: String::new(),
            website: String::new(),
            image: None,
        }
    }
}

/// The four contact-detail images shown on the legal pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactAssets {
    pub name_svg: Option<String>,
    pub street_svg: Option<String>,
    pub city_svg: Option<String>,
    pub country_svg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvConfig {
    pub url: Option<String>,
    pub file_name: String,
    pub display_name: String,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            url: None,
            file_name: DEFAULT_CV_FILE_NAME.to_string(),
            display_name: DEFAULT_CV_DISPLAY_NAME.to_string(),
        }
    }
}

/// Build-time settings for the localization pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub public_dir: PathBuf,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BuildConfig {
    /// Directory the mirrored assets and the marker live in.
    pub fn assets_dir(&self) -> PathBuf {
        self.public_dir.join("assets")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    pub profile: ProfileConfig,
    pub contact: ContactAssets,
    pub links: Vec<LinkEntry>,
    pub cv: CvConfig,
    pub build: BuildConfig,
}

/// Content keys read by [`SiteConfig::from_lookup`].
pub mod keys {
    pub const PROFILE_NAME: &str = "PROFILE_NAME";
    pub const FIRSTNAME: &str = "FIRSTNAME";
    pub const PROFILE_BIO: &str = "PROFILE_BIO";
    pub const PROFILE_IMAGE: &str = "PROFILE_IMAGE";
    pub const CONTACT_NAME_SVG: &str = "CONTACT_NAME_SVG";
    pub const CONTACT_STREET_SVG: &str = "CONTACT_STREET_SVG";
    pub const CONTACT_CITY_SVG: &str = "CONTACT_CITY_SVG";
    pub const CONTACT_COUNTRY_SVG: &str = "CONTACT_COUNTRY_SVG";
    pub const CONTACT_EMAIL: &str = "CONTACT_EMAIL";
    pub const WEBSITE_URL: &str = "WEBSITE_URL";
    pub const LINKS: &str = "LINKS";
    pub const CV_PDF_URL: &str = "CV_PDF_URL";
}

impl SiteConfig {
    /// Builds the content part of the config from a key lookup.
    ///
    /// Blank values count as unset. Build settings and CV file naming keep their defaults; the
    /// caller overrides them afterwards.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let profile = ProfileConfig {
            name: get(keys::PROFILE_NAME).unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
            first_name: get(keys::FIRSTNAME),
            bio: get(keys::PROFILE_BIO).unwrap_or_default(),
            email: get(keys::CONTACT_EMAIL).unwrap_or_default(),
            website: get(keys::WEBSITE_URL).unwrap_or_default(),
            image: get(keys::PROFILE_IMAGE),
        };

        let contact = ContactAssets {
            name_svg: get(keys::CONTACT_NAME_SVG),
            street_svg: get(keys::CONTACT_STREET_SVG),
            city_svg: get(keys::CONTACT_CITY_SVG),
            country_svg: get(keys::CONTACT_COUNTRY_SVG),
        };

        let links = get(keys::LINKS)
            .map(|raw| parse_links(&raw))
            .unwrap_or_default();

        let cv = CvConfig {
            url: get(keys::CV_PDF_URL),
            ..CvConfig::default()
        };

        SiteConfig {
            profile,
            contact,
            links,
            cv,
            build: BuildConfig::default(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            name = %self.profile.name,
            links_count = self.links.len(),
            has_profile_image = self.profile.image.is_some(),
            public_dir = %self.build.public_dir.display(),
            "Loaded SiteConfig"
        );
        debug!(?self, "SiteConfig loaded (full debug)");
    }
}

/// Parses the serialized link list. Malformed input yields an empty list.
pub fn parse_links(raw: &str) -> Vec<LinkEntry> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<LinkEntry>>(raw) {
        Ok(links) => {
            debug!(count = links.len(), "Parsed link list");
            links
        }
        Err(e) => {
            warn!(error = %e, "Link list is not valid JSON, treating it as empty");
            Vec::new()
        }
    }
}

/// `null` reads as an empty string, so one unset field skips its entry instead of the whole list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
