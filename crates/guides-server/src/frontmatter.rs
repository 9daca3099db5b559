/// Guide file format: a `---` fenced YAML header followed by a blank line and the
/// markdown body.
///
/// ```text
/// ---
/// title: "Setting Up Plex"
/// category: "Media"
/// tags: ["plex", "streaming"]
/// ---
///
/// ## Install
/// ```
use serde::{Deserialize, Deserializer};

use crate::model::{Difficulty, GuideMetadata, GuideStatus};
use crate::slug::GuideSlug;

const FENCE: &str = "---";
const DEFAULT_TIME: &str = "N/A";

#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("missing frontmatter: file must start with a '---' line")]
    Missing,

    #[error("unterminated frontmatter: no closing '---' line")]
    Unterminated,

    #[error("invalid frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    title: String,
    description: String,
    category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    difficulty: Difficulty,
    #[serde(default)]
    time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    uk_specific: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    tested_on: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    status: GuideStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    last_updated: String,
}

/// `key:` with no value parses as YAML null; treat it like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Header {
    fn into_metadata(self, slug: &GuideSlug) -> GuideMetadata {
        GuideMetadata {
            title: self.title,
            description: self.description,
            category: self.category,
            difficulty: self.difficulty,
            time: self
                .time
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TIME.to_string()),
            uk_specific: self.uk_specific,
            tags: self.tags,
            tested_on: self.tested_on,
            status: self.status,
            last_updated: self.last_updated,
            slug: slug.to_string(),
        }
    }
}

/// A parsed guide file.
#[derive(Debug, Clone)]
pub struct GuideDocument {
    pub metadata: GuideMetadata,
    pub body: String,
}

/// Split a file into its raw header and raw body (the text after the closing fence line).
fn split(text: &str) -> Result<(&str, &str), FrontmatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let first = lines.next().ok_or(FrontmatterError::Missing)?;
    if first.trim_end() != FENCE {
        return Err(FrontmatterError::Missing);
    }

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == FENCE {
            return Ok((&text[header_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(FrontmatterError::Unterminated)
}

/// Drop the blank separator line and the final newline written by [`render`].
fn trim_body(raw: &str) -> &str {
    let body = raw
        .strip_prefix("\r\n")
        .or_else(|| raw.strip_prefix('\n'))
        .unwrap_or(raw);
    body.strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
}

/// Parse only the header, for listings.
pub fn parse_metadata(slug: &GuideSlug, text: &str) -> Result<GuideMetadata, FrontmatterError> {
    let (header, _) = split(text)?;
    let header: Header = serde_yaml::from_str(header)?;
    Ok(header.into_metadata(slug))
}

pub fn parse(slug: &GuideSlug, text: &str) -> Result<GuideDocument, FrontmatterError> {
    let (header, body) = split(text)?;
    let header: Header = serde_yaml::from_str(header)?;
    Ok(GuideDocument {
        metadata: header.into_metadata(slug),
        body: trim_body(body).to_string(),
    })
}

/// Serialize metadata and body into the on-disk format.
pub fn render(metadata: &GuideMetadata, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 512);
    out.push_str(FENCE);
    out.push('\n');
    push_field(&mut out, "title", &quote(&metadata.title));
    push_field(&mut out, "description", &quote(&metadata.description));
    push_field(&mut out, "category", &quote(&metadata.category));
    push_field(&mut out, "difficulty", &quote(metadata.difficulty.as_str()));
    push_field(&mut out, "time", &quote(&metadata.time));
    push_field(&mut out, "lastUpdated", &quote(&metadata.last_updated));
    push_field(&mut out, "slug", &quote(&metadata.slug));
    push_field(&mut out, "status", metadata.status.as_str());
    push_field(&mut out, "tags", &quote_list(&metadata.tags));
    push_field(&mut out, "ukSpecific", if metadata.uk_specific { "true" } else { "false" });
    push_field(&mut out, "testedOn", &quote_list(&metadata.tested_on));
    out.push_str(FENCE);
    out.push_str("\n\n");
    out.push_str(body);
    out.push('\n');
    out
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

/// YAML double-quoted scalar.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn quote_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug() -> GuideSlug {
        "media/setting-up-plex".parse().unwrap()
    }

    #[test]
    fn parse_full_header() {
        let text = r#"---
title: "Setting Up Plex"
description: "Stream your library anywhere"
category: "Media & Streaming"
difficulty: "Intermediate"
time: "45 minutes"
lastUpdated: "03 Feb 2026"
slug: "somewhere/else"
status: draft
tags: ["plex", "Streaming"]
ukSpecific: true
testedOn: ["Ubuntu 24.04", "Raspberry Pi OS"]
---

## Install

Run the installer.
"#;
        let doc = parse(&slug(), text).unwrap();
        let meta = &doc.metadata;
        assert_eq!(meta.title, "Setting Up Plex");
        assert_eq!(meta.category, "Media & Streaming");
        assert_eq!(meta.difficulty, Difficulty::Intermediate);
        assert_eq!(meta.status, GuideStatus::Draft);
        assert_eq!(meta.tags, vec!["plex", "Streaming"]);
        assert_eq!(meta.tested_on.len(), 2);
        assert!(meta.uk_specific);
        assert_eq!(meta.slug, "media/setting-up-plex");
        assert_eq!(doc.body, "## Install\n\nRun the installer.");
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let text = "---\ntitle: Plex\ndescription: Stream things\ncategory: Media\ntags:\n---\nBody\n";
        let meta = parse_metadata(&slug(), text).unwrap();
        assert!(meta.tags.is_empty());
        assert!(meta.tested_on.is_empty());
        assert!(!meta.uk_specific);
        assert_eq!(meta.difficulty, Difficulty::Beginner);
        assert_eq!(meta.time, "N/A");
        assert_eq!(meta.status, GuideStatus::Published);
        assert_eq!(meta.last_updated, "");
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let text = "---\ntitle: Plex\ncategory: Media\n---\nBody\n";
        assert!(matches!(
            parse_metadata(&slug(), text),
            Err(FrontmatterError::Yaml(_))
        ));
    }

    #[test]
    fn unknown_difficulty_is_an_error() {
        let text = "---\ntitle: Plex\ndescription: d\ncategory: Media\ndifficulty: Expert\n---\n";
        assert!(parse_metadata(&slug(), text).is_err());
    }

    #[test]
    fn header_fences_are_required() {
        assert!(matches!(
            parse_metadata(&slug(), "# Just markdown\n"),
            Err(FrontmatterError::Missing)
        ));
        assert!(matches!(
            parse_metadata(&slug(), "---\ntitle: Plex\n"),
            Err(FrontmatterError::Unterminated)
        ));
    }

    #[test]
    fn crlf_files_parse() {
        let text = "---\r\ntitle: Plex\r\ndescription: d\r\ncategory: Media\r\n---\r\n\r\nBody\r\n";
        let doc = parse(&slug(), text).unwrap();
        assert_eq!(doc.metadata.title, "Plex");
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn render_then_parse_preserves_metadata_and_body() {
        let mut meta = crate::model::sample_metadata("media/setting-up-plex", "Media & Streaming");
        meta.title = "Plex \"the\" \\ server".to_string();
        meta.description = "Line one\nline two: with colon".to_string();
        meta.tags = vec!["plex".to_string(), "a, b".to_string()];
        meta.tested_on = vec!["Debian 12".to_string()];
        meta.uk_specific = true;
        meta.status = GuideStatus::Draft;
        meta.difficulty = Difficulty::Advanced;
        let body = "\n## Heading\n\n```sh\necho hi\n```\n";

        let text = render(&meta, body);
        assert!(text.starts_with("---\ntitle: "));
        assert!(text.contains("\nstatus: draft\n"));

        let doc = parse(&slug(), &text).unwrap();
        assert_eq!(doc.metadata, meta);
        assert_eq!(doc.body, body);
    }
}
