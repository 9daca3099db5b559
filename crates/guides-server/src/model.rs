use std::fmt;

use serde::{Deserialize, Serialize};

use guides_common::api::GuideSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication state. Drafts are hidden from every public read path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideStatus {
    Draft,
    #[default]
    Published,
}

impl GuideStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GuideStatus::Draft => "draft",
            GuideStatus::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(GuideStatus::Draft),
            "published" => Some(GuideStatus::Published),
            _ => None,
        }
    }

    pub fn is_draft(self) -> bool {
        self == GuideStatus::Draft
    }
}

/// Metadata header of one guide file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideMetadata {
    pub title: String,
    pub description: String,
    /// Free-text label; see `slug::category_to_slug` for its URL form.
    pub category: String,
    pub difficulty: Difficulty,
    /// Free-text estimate such as "30 minutes".
    pub time: String,
    pub uk_specific: bool,
    pub tags: Vec<String>,
    pub tested_on: Vec<String>,
    pub status: GuideStatus,
    pub last_updated: String,
    /// `categorySlug/titleSlug`, always derived from the file's location.
    pub slug: String,
}

impl GuideMetadata {
    pub fn is_visible(&self, include_drafts: bool) -> bool {
        include_drafts || !self.status.is_draft()
    }
}

/// A guide with its body compiled to HTML, for rendering.
#[derive(Debug, Clone)]
pub struct Guide {
    pub metadata: GuideMetadata,
    pub html: String,
    pub reading_time: String,
}

/// A guide with its uncompiled body, for editing.
#[derive(Debug, Clone)]
pub struct RawGuide {
    pub metadata: GuideMetadata,
    pub content: String,
    /// Hex SHA-256 of the whole stored file.
    pub content_hash: String,
}

pub fn to_summary(metadata: &GuideMetadata) -> GuideSummary {
    GuideSummary {
        slug: metadata.slug.clone(),
        title: metadata.title.clone(),
        description: metadata.description.clone(),
        category: metadata.category.clone(),
        difficulty: metadata.difficulty.to_string(),
        time: metadata.time.clone(),
        uk_specific: metadata.uk_specific,
        tags: metadata.tags.clone(),
        tested_on: metadata.tested_on.clone(),
        status: metadata.status.as_str().to_string(),
        last_updated: metadata.last_updated.clone(),
    }
}

#[cfg(test)]
pub(crate) fn sample_metadata(slug: &str, category: &str) -> GuideMetadata {
    let title = slug.rsplit('/').next().unwrap_or(slug).replace('-', " ");
    GuideMetadata {
        title,
        description: "A guide used in tests".to_string(),
        category: category.to_string(),
        difficulty: Difficulty::Beginner,
        time: "10 minutes".to_string(),
        uk_specific: false,
        tags: Vec::new(),
        tested_on: Vec::new(),
        status: GuideStatus::Published,
        last_updated: "01 Jan 2026".to_string(),
        slug: slug.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_round_trips_through_its_name() {
        for d in Difficulty::ALL {
            assert_eq!(Difficulty::parse(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::parse("beginner"), None);
        assert_eq!(Difficulty::default(), Difficulty::Beginner);
    }

    #[test]
    fn drafts_are_only_visible_on_request() {
        let mut meta = sample_metadata("networking/dns", "Networking");
        assert!(meta.is_visible(false));
        meta.status = GuideStatus::Draft;
        assert!(!meta.is_visible(false));
        assert!(meta.is_visible(true));
    }

    #[test]
    fn summary_uses_display_names() {
        let mut meta = sample_metadata("networking/dns", "Networking");
        meta.difficulty = Difficulty::Advanced;
        meta.status = GuideStatus::Draft;
        let summary = to_summary(&meta);
        assert_eq!(summary.difficulty, "Advanced");
        assert_eq!(summary.status, "draft");
        assert_eq!(summary.slug, "networking/dns");
    }
}
