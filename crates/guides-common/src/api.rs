use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchGuidesParams {
    /// Case-insensitive text to look for in titles, descriptions, categories and tags.
    pub query: String,
    /// Optional category name or slug to restrict results to.
    pub category: Option<String>,
    /// Maximum number of results to return (default: 20, max: 100).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetGuideParams {
    /// Guide slug such as "vpn-and-tunnels/setting-up-wireguard".
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListCategoryParams {
    /// Category name or slug such as "Storage & Backup" or "storage-and-backup".
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RelatedGuidesParams {
    /// Slug of the guide to find related guides for.
    pub slug: String,
    /// Maximum number of related guides (default: 3, max: 10).
    pub limit: Option<u32>,
}

/// Listing view of a guide's metadata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuideSummary {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub time: String,
    pub uk_specific: bool,
    pub tags: Vec<String>,
    pub tested_on: Vec<String>,
    pub status: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuideListResponse {
    pub guides: Vec<GuideSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchGuidesResponse {
    pub results: Vec<GuideSummary>,
    pub total: usize,
}

/// A published guide with its body compiled to HTML.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuideDetailResponse {
    pub metadata: GuideSummary,
    pub html: String,
    pub reading_time: String,
}

/// A guide's uncompiled body, as returned to editors.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawGuideResponse {
    pub metadata: GuideSummary,
    pub content: String,
    /// Hex SHA-256 of the stored file; send back as `expectedHash` to detect concurrent edits.
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListResponse {
    pub category: String,
    pub guides: Vec<GuideSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatedGuidesResponse {
    pub related_guides: Vec<GuideSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub ok: bool,
    pub html: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct DifficultyCounts {
    pub beginner: usize,
    pub intermediate: usize,
    pub advanced: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuideStatsResponse {
    pub total_guides: usize,
    pub categories: usize,
    pub difficulties: DifficultyCounts,
    pub uk_specific: usize,
    pub total_tags: usize,
}
