use crate::assets::{resolved_asset, Availability};
use crate::config::{keys, SiteConfig};
use crate::contract::AssetKind;

const HEADER: &str = "# Auto-generated during build - DO NOT EDIT\n# Remote assets point at their local copies\n\n";

/// Renders the production env file: content values carried over, asset values rewritten to
/// local copies where they exist on disk.
///
/// Assets that are neither local nor remote are left out.
pub fn render_localized_env(config: &SiteConfig) -> String {
    let mut out = String::from(HEADER);
    let profile = &config.profile;

    push_quoted(&mut out, keys::PROFILE_NAME, &profile.name);
    if let Some(first) = &profile.first_name {
        push_quoted(&mut out, keys::FIRSTNAME, first);
    }
    push_quoted(&mut out, keys::PROFILE_BIO, &profile.bio);

    for (key, kind) in [
        (keys::PROFILE_IMAGE, AssetKind::ProfileImage),
        (keys::CONTACT_NAME_SVG, AssetKind::ContactName),
        (keys::CONTACT_STREET_SVG, AssetKind::ContactStreet),
        (keys::CONTACT_CITY_SVG, AssetKind::ContactCity),
        (keys::CONTACT_COUNTRY_SVG, AssetKind::ContactCountry),
    ] {
        match resolved_asset(config, kind) {
            Availability::Local(path) | Availability::Remote(path) => push_quoted(&mut out, key, &path),
            Availability::Missing => {}
        }
    }

    push_quoted(&mut out, keys::CONTACT_EMAIL, &profile.email);
    push_quoted(&mut out, keys::WEBSITE_URL, &profile.website);
    if let Some(cv_url) = &config.cv.url {
        push_quoted(&mut out, keys::CV_PDF_URL, cv_url);
    }

    // The list came from JSON, so serializing it back cannot fail.
    let links = serde_json::to_string(&config.links).unwrap_or_else(|_| "[]".to_string());
    out.push_str(&format!("{}='{}'\n", keys::LINKS, links.replace('\'', "\\u0027")));
    out
}

fn push_quoted(out: &mut String, key: &str, value: &str) {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    out.push_str(&format!("{key}=\"{escaped}\"\n"));
}
