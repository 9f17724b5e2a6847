//! # vcard: contact card generation
//!
//! Turns the profile and link list into a vCard 3.0 document offered as a download.
//!
//! - [`build_card`] is pure: it lays out the ordered fields from an input and an already loaded
//!   photo.
//! - [`generate_contact_card`] loads the photo first (the only await point) and never fails: an
//!   unreachable image degrades to a `PHOTO;VALUE=uri` reference.
//! - [`ContactCard::render`] produces CRLF-terminated lines, escapes text values and folds
//!   lines longer than 75 octets.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use tracing::{debug, info, warn};
use url::Url;

use crate::assets::public_file;
use crate::config::{LinkEntry, SiteConfig};
use crate::contract::AssetFetcher;
use crate::download::is_remote_url;

pub const MIME_TYPE: &str = "text/vcard;charset=utf-8";
const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageType {
    /// Infers the type from the file extension of a path or URL. Unknown extensions are JPEG.
    pub fn from_location(location: &str) -> Self {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();
        let ext = match file.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return ImageType::Jpeg,
        };
        match ext.as_str() {
            "png" => ImageType::Png,
            "gif" => ImageType::Gif,
            "webp" => ImageType::Webp,
            _ => ImageType::Jpeg,
        }
    }

    /// Sniffs the type from the image bytes, falling back to the location's extension.
    ///
    /// Localized copies always carry a `.jpg` name, so the bytes are the reliable source.
    pub fn detect(data: &[u8], location: &str) -> Self {
        match image::guess_format(data) {
            Ok(ImageFormat::Png) => ImageType::Png,
            Ok(ImageFormat::Jpeg) => ImageType::Jpeg,
            Ok(ImageFormat::Gif) => ImageType::Gif,
            Ok(ImageFormat::WebP) => ImageType::Webp,
            _ => ImageType::from_location(location),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::Jpeg => "JPEG",
            ImageType::Png => "PNG",
            ImageType::Gif => "GIF",
            ImageType::Webp => "WEBP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Photo {
    Embedded { image_type: ImageType, data: Vec<u8> },
    Reference(String),
}

/// One typed field of the card, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardField {
    FullName(String),
    Name(String),
    Nickname(String),
    Email(String),
    Url(String),
    Photo(Photo),
    Note(String),
    LabeledUrl { label: String, url: String },
}

impl CardField {
    fn to_line(&self) -> String {
        match self {
            CardField::FullName(name) => format!("FN:{}", escape_text(name)),
            CardField::Name(name) => format!("N:{};;;", escape_text(name)),
            CardField::Nickname(name) => format!("NICKNAME:{}", escape_text(name)),
            CardField::Email(email) => format!("EMAIL:{email}"),
            CardField::Url(url) => format!("URL:{url}"),
            CardField::Photo(Photo::Embedded { image_type, data }) => format!(
                "PHOTO;ENCODING=b;TYPE={}:{}",
                image_type.as_str(),
                STANDARD.encode(data)
            ),
            CardField::Photo(Photo::Reference(location)) => format!("PHOTO;VALUE=uri:{location}"),
            CardField::Note(note) => format!("NOTE:{}", escape_text(note)),
            CardField::LabeledUrl { label, url } if label.trim().is_empty() => format!("URL:{url}"),
            CardField::LabeledUrl { label, url } => format!("URL;TYPE={}:{url}", param_value(label)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCard {
    pub fields: Vec<CardField>,
}

impl ContactCard {
    /// The full document, `BEGIN:VCARD` through `END:VCARD`.
    pub fn render(&self) -> String {
        let mut out = String::from("BEGIN:VCARD\r\nVERSION:3.0\r\n");
        for field in &self.fields {
            out.push_str(&fold_line(&field.to_line()));
            out.push_str("\r\n");
        }
        out.push_str("END:VCARD\r\n");
        out
    }

    pub fn has_embedded_photo(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f, CardField::Photo(Photo::Embedded { .. })))
    }
}

/// Download file name for a profile name: `<name>.vcf`, or `contact.vcf` when blank.
pub fn file_name(profile_name: &str) -> String {
    let stem = profile_name
        .trim()
        .replace(['/', '\\', ':'], "_");
    if stem.is_empty() {
        "contact.vcf".to_string()
    } else {
        format!("{stem}.vcf")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactCardInput {
    pub name: String,
    pub first_name: Option<String>,
    pub bio: String,
    pub email: String,
    pub website: String,
    pub profile_image: Option<String>,
    pub links: Vec<LinkEntry>,
}

impl From<&SiteConfig> for ContactCardInput {
    fn from(config: &SiteConfig) -> Self {
        Self {
            name: config.profile.name.clone(),
            first_name: config.profile.first_name.clone(),
            bio: config.profile.bio.clone(),
            email: config.profile.email.clone(),
            website: config.profile.website.clone(),
            profile_image: config.profile.image.clone(),
            links: config.links.clone(),
        }
    }
}

/// Lays out the card fields. Pure; the photo has already been loaded (or not).
pub fn build_card(input: &ContactCardInput, photo: Option<Photo>) -> ContactCard {
    let name = input.name.trim();
    let first_name = input
        .first_name
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());
    let main_name = first_name.unwrap_or(name);

    let mut fields = vec![
        CardField::FullName(main_name.to_string()),
        CardField::Name(main_name.to_string()),
    ];
    if let Some(first) = first_name {
        if !name.is_empty() && name != first {
            fields.push(CardField::Nickname(name.to_string()));
        }
    }
    if let Some(email) = non_blank(&input.email) {
        fields.push(CardField::Email(email.to_string()));
    }
    if let Some(website) = non_blank(&input.website) {
        fields.push(CardField::Url(website.to_string()));
    }
    if let Some(photo) = photo {
        fields.push(CardField::Photo(photo));
    }
    if let Some(bio) = non_blank(&input.bio) {
        fields.push(CardField::Note(bio.to_string()));
    }
    for link in &input.links {
        match non_blank(&link.url) {
            Some(url) => fields.push(CardField::LabeledUrl {
                label: link.title.clone(),
                url: url.to_string(),
            }),
            None => debug!(title = %link.title, "Skipping link without URL"),
        }
    }

    ContactCard { fields }
}

/// Builds the card, embedding the profile photo when it can be loaded.
///
/// Remote images go through `fetcher`; local `/assets/...` paths are read from `public_dir`.
/// Any failure to load the image falls back to a URI reference.
pub async fn generate_contact_card<F>(
    input: &ContactCardInput,
    fetcher: &F,
    public_dir: Option<&Path>,
) -> ContactCard
where
    F: AssetFetcher + ?Sized,
{
    let photo = match input.profile_image.as_deref().and_then(non_blank) {
        Some(location) => Some(load_photo(location, &input.website, fetcher, public_dir).await),
        None => None,
    };
    let card = build_card(input, photo);
    info!(
        fields = card.fields.len(),
        embedded_photo = card.has_embedded_photo(),
        "Generated contact card"
    );
    card
}

async fn load_photo<F>(location: &str, website: &str, fetcher: &F, public_dir: Option<&Path>) -> Photo
where
    F: AssetFetcher + ?Sized,
{
    let loaded: Result<Vec<u8>, String> = if is_remote_url(location) {
        fetcher.fetch_bytes(location).await.map_err(|e| e.to_string())
    } else {
        match public_dir {
            Some(dir) => {
                let file = public_file(dir, location);
                tokio::fs::read(&file)
                    .await
                    .map_err(|e| format!("{}: {e}", file.display()))
            }
            None => Err("no public directory to read a local image from".to_string()),
        }
    };

    match loaded {
        Ok(data) if !data.is_empty() => Photo::Embedded {
            image_type: ImageType::detect(&data, location),
            data,
        },
        Ok(_) => {
            warn!(location = %location, "Profile image is empty, referencing it instead");
            Photo::Reference(photo_reference(location, website))
        }
        Err(reason) => {
            warn!(location = %location, reason = %reason, "Could not load profile image, referencing it instead");
            Photo::Reference(photo_reference(location, website))
        }
    }
}

/// The location as given, made absolute against the website when it is a relative path.
fn photo_reference(location: &str, website: &str) -> String {
    if is_remote_url(location) {
        return location.to_string();
    }
    Url::parse(website.trim())
        .and_then(|base| base.join(location))
        .map(String::from)
        .unwrap_or_else(|_| location.to_string())
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Escapes a vCard 3.0 text value.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Parameter values with separators are quoted; quotes and line breaks are dropped.
fn param_value(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    if cleaned.contains([';', ':', ',']) {
        format!("\"{cleaned}\"")
    } else {
        cleaned
    }
}

/// Folds a content line at 75 octets without splitting a UTF-8 sequence.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut octets = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if octets + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            // The leading space counts towards the continuation line.
            octets = 1;
        }
        out.push(c);
        octets += width;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> ContactCardInput {
        ContactCardInput {
            name: name.to_string(),
            ..ContactCardInput::default()
        }
    }

    fn lines(card: &ContactCard) -> Vec<String> {
        card.render().lines().map(str::to_string).collect()
    }

    #[test]
    fn name_only_card_has_no_optional_fields() {
        let card = build_card(&input("Jane Doe"), None);
        assert_eq!(
            lines(&card),
            vec!["BEGIN:VCARD", "VERSION:3.0", "FN:Jane Doe", "N:Jane Doe;;;", "END:VCARD"]
        );
    }

    #[test]
    fn distinct_first_name_moves_full_name_to_nickname() {
        let mut with_override = input("Jane Doe");
        with_override.first_name = Some("Jane".into());
        let rendered = lines(&build_card(&with_override, None));
        assert!(rendered.contains(&"FN:Jane".to_string()));
        assert!(rendered.contains(&"N:Jane;;;".to_string()));
        assert!(rendered.contains(&"NICKNAME:Jane Doe".to_string()));

        let mut same = input("Jane");
        same.first_name = Some("Jane".into());
        let rendered = build_card(&same, None).render();
        assert!(!rendered.contains("NICKNAME"));
    }

    #[test]
    fn links_without_url_are_skipped() {
        let mut with_links = input("Jane");
        with_links.links = vec![
            LinkEntry {
                title: "GitHub".into(),
                url: "https://github.com/x".into(),
                icon: None,
            },
            LinkEntry {
                title: String::new(),
                url: String::new(),
                icon: None,
            },
        ];
        let rendered = lines(&build_card(&with_links, None));
        let url_lines: Vec<_> = rendered.iter().filter(|l| l.starts_with("URL")).collect();
        assert_eq!(url_lines, vec!["URL;TYPE=GitHub:https://github.com/x"]);
    }

    #[test]
    fn optional_fields_follow_names_in_order() {
        let full = ContactCardInput {
            name: "Jane Doe".into(),
            first_name: Some("Jane".into()),
            bio: "Maker. Tinkerer".into(),
            email: "jane@example.com".into(),
            website: "https://jane.example".into(),
            profile_image: None,
            links: vec![LinkEntry {
                title: "Blog".into(),
                url: "https://blog.example".into(),
                icon: Some("rss".into()),
            }],
        };
        let photo = Photo::Embedded {
            image_type: ImageType::Png,
            data: vec![1, 2, 3],
        };
        assert_eq!(
            lines(&build_card(&full, Some(photo))),
            vec![
                "BEGIN:VCARD",
                "VERSION:3.0",
                "FN:Jane",
                "N:Jane;;;",
                "NICKNAME:Jane Doe",
                "EMAIL:jane@example.com",
                "URL:https://jane.example",
                "PHOTO;ENCODING=b;TYPE=PNG:AQID",
                "NOTE:Maker. Tinkerer",
                "URL;TYPE=Blog:https://blog.example",
                "END:VCARD",
            ]
        );
    }

    #[test]
    fn text_values_are_escaped() {
        let mut tricky = input("Doe, Jane");
        tricky.bio = "line one\nline; two".into();
        let rendered = lines(&build_card(&tricky, None));
        assert!(rendered.contains(&"FN:Doe\\, Jane".to_string()));
        assert!(rendered.contains(&"NOTE:line one\\nline\\; two".to_string()));
    }

    #[test]
    fn labels_with_separators_are_quoted() {
        assert_eq!(param_value("Mastodon: main"), "\"Mastodon: main\"");
        assert_eq!(param_value("Git\"Hub"), "GitHub");
    }

    #[test]
    fn long_lines_fold_on_char_boundaries() {
        let photo = Photo::Embedded {
            image_type: ImageType::Jpeg,
            data: vec![0xAB; 300],
        };
        let rendered = build_card(&input("Jane"), Some(photo)).render();
        for physical in rendered.split("\r\n") {
            assert!(physical.len() <= MAX_LINE_OCTETS, "line too long: {physical}");
        }
        let unfolded = rendered.replace("\r\n ", "");
        let photo_line = unfolded
            .lines()
            .find(|l| l.starts_with("PHOTO"))
            .expect("photo line");
        let encoded = photo_line.trim_start_matches("PHOTO;ENCODING=b;TYPE=JPEG:");
        assert_eq!(STANDARD.decode(encoded).unwrap(), vec![0xAB; 300]);

        let folded = fold_line(&"é".repeat(60));
        assert!(folded.split("\r\n").all(|l| l.len() <= MAX_LINE_OCTETS));
        assert_eq!(folded.replace("\r\n ", ""), "é".repeat(60));
    }

    #[test]
    fn image_type_comes_from_extension() {
        assert_eq!(ImageType::from_location("/assets/me.PNG"), ImageType::Png);
        assert_eq!(ImageType::from_location("https://cdn.example/a.gif?v=2"), ImageType::Gif);
        assert_eq!(ImageType::from_location("https://cdn.example/a.webp#x"), ImageType::Webp);
        assert_eq!(ImageType::from_location("https://cdn.example/a.jpeg"), ImageType::Jpeg);
        assert_eq!(ImageType::from_location("https://cdn.example/avatar"), ImageType::Jpeg);
        assert_eq!(ImageType::from_location("https://cdn.example.com/avatar"), ImageType::Jpeg);
    }

    #[test]
    fn image_bytes_win_over_extension() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(ImageType::detect(png, "/assets/profile-image.jpg"), ImageType::Png);
        assert_eq!(ImageType::detect(b"GIF89a....", "/assets/profile-image.jpg"), ImageType::Gif);
        assert_eq!(ImageType::detect(&[0xFF, 0xD8, 0xFF, 0xE0], "https://cdn.example/a.png"), ImageType::Jpeg);
        assert_eq!(ImageType::detect(b"????", "https://cdn.example/a.webp"), ImageType::Webp);
    }

    #[test]
    fn relative_photo_reference_is_made_absolute() {
        assert_eq!(
            photo_reference("/assets/profile-image.jpg", "https://jane.example/"),
            "https://jane.example/assets/profile-image.jpg"
        );
        assert_eq!(photo_reference("/assets/p.jpg", ""), "/assets/p.jpg");
        assert_eq!(
            photo_reference("https://cdn.example/p.jpg", "https://jane.example"),
            "https://cdn.example/p.jpg"
        );
    }

    #[test]
    fn file_name_uses_profile_name() {
        assert_eq!(file_name("Jane Doe"), "Jane Doe.vcf");
        assert_eq!(file_name("  "), "contact.vcf");
        assert_eq!(file_name("a/b"), "a_b.vcf");
    }
}
