use serde::Serialize;

use crate::assets::{contact_svg_paths, resolve_cv_link, resolved_asset, Availability, ContactSvgPaths, CvLink};
use crate::bio::split_bio;
use crate::config::{LinkEntry, SiteConfig};
use crate::contract::AssetKind;
use crate::marker::read_marker;
use crate::vcard;

/// Everything the page templates need, resolved against the public directory.
#[derive(Debug, Clone, Serialize)]
pub struct PageModel {
    pub name: String,
    pub bio_lines: Vec<String>,
    pub profile_image: Availability,
    pub contact: ContactSvgPaths,
    pub links: Vec<LinkEntry>,
    pub cv: Option<CvLink>,
    pub vcard_file_name: String,
    /// Timestamp of the last localization run, if its marker is present.
    pub assets_localized_at: Option<String>,
}

impl PageModel {
    pub fn from_config(config: &SiteConfig) -> Self {
        let bio_lines = if config.profile.bio.trim().is_empty() {
            Vec::new()
        } else {
            split_bio(&config.profile.bio)
        };
        PageModel {
            name: config.profile.name.clone(),
            bio_lines,
            profile_image: resolved_asset(config, AssetKind::ProfileImage),
            contact: contact_svg_paths(config),
            links: config
                .links
                .iter()
                .filter(|l| !l.url.trim().is_empty())
                .cloned()
                .collect(),
            cv: resolve_cv_link(&config.cv, &config.build.public_dir),
            vcard_file_name: vcard::file_name(&config.profile.name),
            assets_localized_at: read_marker(&config.build.assets_dir()).map(|m| m.generated_at),
        }
    }
}
