use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use guides_common::api::{
    CategoryListResponse, GetGuideParams, GuideDetailResponse, ListCategoryParams,
    RelatedGuidesParams, RelatedGuidesResponse, SearchGuidesParams, SearchGuidesResponse,
};

use crate::model::to_summary;
use crate::related::DEFAULT_RELATED_LIMIT;
use crate::repository::GuideRepository;
use crate::search::{search_guides, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};

const MAX_RELATED_LIMIT: usize = 10;

/// Read-only view of the published guides for MCP clients.
#[derive(Clone)]
pub struct GuidesMcpServer {
    repo: Arc<GuideRepository>,
    tool_router: ToolRouter<GuidesMcpServer>,
}

impl GuidesMcpServer {
    pub fn new(repo: Arc<GuideRepository>) -> Self {
        Self {
            repo,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl GuidesMcpServer {
    #[tool(description = "Search published guides by title, description, category and tags.")]
    async fn search_guides(
        &self,
        Parameters(params): Parameters<SearchGuidesParams>,
    ) -> Result<Json<SearchGuidesResponse>, String> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }
        let limit = params
            .limit
            .map_or(DEFAULT_SEARCH_LIMIT, |l| l as usize)
            .clamp(1, MAX_SEARCH_LIMIT);

        let guides = self
            .repo
            .list_all(false)
            .await
            .map_err(|e| format!("failed to load guides: {e}"))?;
        let matches = search_guides(guides, &query, params.category.as_deref());
        info!(query = %query, matches = matches.len(), "search_guides");

        Ok(Json(SearchGuidesResponse {
            total: matches.len(),
            results: matches.iter().take(limit).map(to_summary).collect(),
        }))
    }

    #[tool(description = "Get a published guide by slug (e.g. 'media/setting-up-plex'), with its body compiled to HTML.")]
    async fn get_guide(
        &self,
        Parameters(params): Parameters<GetGuideParams>,
    ) -> Result<Json<GuideDetailResponse>, String> {
        let slug = params.slug.trim().trim_matches('/').to_string();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }

        let guide = self
            .repo
            .get_by_slug(&slug, false)
            .await
            .map_err(|e| format!("failed to load guide: {e}"))?
            .ok_or_else(|| format!("guide not found: {slug}"))?;

        Ok(Json(GuideDetailResponse {
            metadata: to_summary(&guide.metadata),
            html: guide.html,
            reading_time: guide.reading_time,
        }))
    }

    #[tool(description = "List published guides in a category, by name ('VPN & Tunnels') or slug ('vpn-and-tunnels').")]
    async fn list_category(
        &self,
        Parameters(params): Parameters<ListCategoryParams>,
    ) -> Result<Json<CategoryListResponse>, String> {
        let category = params.category.trim().to_string();
        if category.is_empty() {
            return Err("category must not be empty".to_string());
        }

        let guides = self
            .repo
            .by_category(&category, false)
            .await
            .map_err(|e| format!("failed to load guides: {e}"))?;
        if guides.is_empty() {
            let mut available: Vec<String> = self
                .repo
                .list_all(false)
                .await
                .map_err(|e| format!("failed to load guides: {e}"))?
                .into_iter()
                .map(|g| g.category)
                .collect();
            available.sort_unstable();
            available.dedup();
            return Err(format!(
                "unknown category: '{category}'. Available categories: {}",
                available.join(", ")
            ));
        }

        Ok(Json(CategoryListResponse {
            category,
            guides: guides.iter().map(to_summary).collect(),
        }))
    }

    #[tool(description = "Find published guides related to a guide by category, difficulty, region and shared tags.")]
    async fn related_guides(
        &self,
        Parameters(params): Parameters<RelatedGuidesParams>,
    ) -> Result<Json<RelatedGuidesResponse>, String> {
        let slug = params.slug.trim().trim_matches('/').to_string();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }
        let limit = params
            .limit
            .map_or(DEFAULT_RELATED_LIMIT, |l| l as usize)
            .clamp(1, MAX_RELATED_LIMIT);

        let related = self
            .repo
            .related(&slug, limit)
            .await
            .map_err(|e| format!("failed to load guides: {e}"))?
            .ok_or_else(|| format!("guide not found: {slug}"))?;

        Ok(Json(RelatedGuidesResponse {
            count: related.len(),
            related_guides: related.iter().map(to_summary).collect(),
        }))
    }
}

#[tool_handler]
impl ServerHandler for GuidesMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "guides-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Self-hosting guides MCP server. Use search_guides for keyword queries, \
                 list_category to browse a category, get_guide to read a guide by slug, and \
                 related_guides to suggest what to read next. Drafts are never returned."
                    .to_string(),
            ),
        }
    }
}
