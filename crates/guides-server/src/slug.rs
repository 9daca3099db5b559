use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Extension of guide files in the content store.
pub const CONTENT_EXTENSION: &str = "mdx";

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn hyphen_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("valid regex"))
}

fn collapse(lowered: &str) -> String {
    let stripped = disallowed_chars().replace_all(lowered, "");
    let hyphenated = whitespace_runs().replace_all(stripped.trim(), "-");
    hyphen_runs().replace_all(&hyphenated, "-").into_owned()
}

/// "VPN & Tunnels" -> "vpn-and-tunnels". Idempotent.
pub fn category_to_slug(category: &str) -> String {
    collapse(&category.to_lowercase().replace('&', "and"))
}

/// "Setting Up Plex!" -> "setting-up-plex".
pub fn slugify_title(title: &str) -> String {
    collapse(&title.to_lowercase())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidSlug {
    #[error("slug is empty")]
    Empty,

    #[error("slug segment {0:?} is not allowed")]
    Segment(String),
}

/// A guide identifier: `/`-separated path segments relative to the locale directory,
/// without the file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuideSlug(String);

impl GuideSlug {
    /// Build the slug a guide with this category and title is stored under.
    pub fn for_guide(category: &str, title: &str) -> Result<Self, InvalidSlug> {
        let category = category_to_slug(category);
        let title = slugify_title(title);
        if category.is_empty() || title.is_empty() {
            return Err(InvalidSlug::Empty);
        }
        format!("{category}/{title}").parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the guide file relative to the locale directory.
    pub fn relative_path(&self) -> PathBuf {
        let (parent, file) = match self.0.rsplit_once('/') {
            Some((parent, file)) => (Some(parent), file),
            None => (None, self.0.as_str()),
        };
        let mut path: PathBuf = parent.into_iter().flat_map(|p| p.split('/')).collect();
        path.push(format!("{file}.{CONTENT_EXTENSION}"));
        path
    }
}

impl FromStr for GuideSlug {
    type Err = InvalidSlug;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(InvalidSlug::Empty);
        }
        for segment in trimmed.split('/') {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['\\', '\0'])
            {
                return Err(InvalidSlug::Segment(segment.to_string()));
            }
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for GuideSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GuideSlug {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_slugs() {
        assert_eq!(category_to_slug("VPN & Tunnels"), "vpn-and-tunnels");
        assert_eq!(category_to_slug("Storage & Backup"), "storage-and-backup");
        assert_eq!(category_to_slug("  Home   Automation -- Basics "), "home-automation-basics");
    }

    #[test]
    fn category_slug_is_idempotent() {
        for input in ["VPN & Tunnels", "Storage & Backup", "Media/Streaming (Plex)"] {
            let once = category_to_slug(input);
            assert_eq!(category_to_slug(&once), once);
        }
    }

    #[test]
    fn title_slugs() {
        assert_eq!(slugify_title("Setting Up Plex!"), "setting-up-plex");
        assert_eq!(slugify_title("Docker & Compose"), "docker-compose");
        assert_eq!(slugify_title("Wi-Fi 6E: what's new?"), "wi-fi-6e-whats-new");
    }

    #[test]
    fn guide_slug_rejects_traversal() {
        assert_eq!("".parse::<GuideSlug>(), Err(InvalidSlug::Empty));
        assert!("../etc/passwd".parse::<GuideSlug>().is_err());
        assert!("a//b".parse::<GuideSlug>().is_err());
        assert!("a\\b".parse::<GuideSlug>().is_err());
        assert!("a/./b".parse::<GuideSlug>().is_err());
    }

    #[test]
    fn guide_slug_paths() {
        let slug: GuideSlug = "/networking/pi-hole-setup/".parse().unwrap();
        assert_eq!(slug.as_str(), "networking/pi-hole-setup");
        assert_eq!(
            slug.relative_path(),
            PathBuf::from("networking").join("pi-hole-setup.mdx")
        );

        let built = GuideSlug::for_guide("VPN & Tunnels", "Setting Up WireGuard").unwrap();
        assert_eq!(built.as_str(), "vpn-and-tunnels/setting-up-wireguard");
    }

    #[test]
    fn unsluggable_title_is_rejected() {
        assert_eq!(
            GuideSlug::for_guide("Networking", "!!!"),
            Err(InvalidSlug::Empty)
        );
    }
}
