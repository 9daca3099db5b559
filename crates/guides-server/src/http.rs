/// HTTP surface.
///
/// Public routes serve published guides only. `/api/admin/*` sits behind an admin guard
/// layer, and each admin handler checks the caller again before acting. Mutating handlers
/// count against the rate limit before the body is parsed.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use guides_common::api::{
    CategoryListResponse, GuideDetailResponse, GuideListResponse, GuideStatsResponse,
    MutationResponse, PreviewResponse, RawGuideResponse, RelatedGuidesResponse,
    SearchGuidesResponse,
};

use crate::admin::AdminService;
use crate::auth::{authorize_admin, authorize_session, SessionResolver, UserDirectory};
use crate::error::AppError;
use crate::model::to_summary;
use crate::rate_limit::{client_identity, RateLimitPolicy};
use crate::related::DEFAULT_RELATED_LIMIT;
use crate::repository::GuideRepository;
use crate::search::search_guides;
use crate::sitemap::{robots_txt, sitemap_xml};
use crate::stats::guide_stats;
use crate::validation::GuideInput;

const NOT_FOUND: &str = "Guide not found";

pub struct AppState {
    pub repo: Arc<GuideRepository>,
    pub admin: AdminService,
    pub sessions: SessionResolver,
    pub users: Arc<dyn UserDirectory>,
    pub site_url: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/guides", get(admin_list_guides).post(create_guide))
        .route(
            "/guides/{*slug}",
            get(admin_get_guide).put(update_guide).delete(delete_guide),
        )
        .route("/stats", get(stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/guides", get(list_guides))
        .route("/api/guides/{*slug}", get(get_guide))
        .route("/api/categories/{category}", get(list_category))
        .route("/api/search", get(search))
        .route("/api/related", get(related))
        .route("/api/preview", post(preview))
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots))
        .nest("/api/admin", admin)
        .with_state(state)
}

async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize_admin(&state.sessions, state.users.as_ref(), request.headers()).await?;
    Ok(next.run(request).await)
}

async fn healthz() -> &'static str {
    "ok"
}

// -- public --

async fn list_guides(State(state): State<Arc<AppState>>) -> Result<Json<GuideListResponse>, AppError> {
    let guides: Vec<_> = state.repo.list_all(false).await?.iter().map(to_summary).collect();
    Ok(Json(GuideListResponse {
        total: guides.len(),
        guides,
    }))
}

async fn get_guide(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<GuideDetailResponse>, AppError> {
    let guide = state
        .repo
        .get_by_slug(&slug, false)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    Ok(Json(GuideDetailResponse {
        metadata: to_summary(&guide.metadata),
        html: guide.html,
        reading_time: guide.reading_time,
    }))
}

async fn list_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let guides = state.repo.by_category(&category, false).await?;
    Ok(Json(CategoryListResponse {
        category,
        guides: guides.iter().map(to_summary).collect(),
    }))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    category: Option<String>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchGuidesResponse>, AppError> {
    let guides = state.repo.list_all(false).await?;
    let results: Vec<_> = search_guides(guides, &params.q, params.category.as_deref())
        .iter()
        .map(to_summary)
        .collect();
    Ok(Json(SearchGuidesResponse {
        total: results.len(),
        results,
    }))
}

#[derive(Debug, Deserialize)]
struct RelatedQuery {
    slug: Option<String>,
}

async fn related(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RelatedQuery>,
) -> Result<Json<RelatedGuidesResponse>, AppError> {
    let slug = params
        .slug
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Guide slug is required".to_string()))?;
    let related = state
        .repo
        .related(&slug, DEFAULT_RELATED_LIMIT)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    Ok(Json(RelatedGuidesResponse {
        count: related.len(),
        related_guides: related.iter().map(to_summary).collect(),
    }))
}

async fn sitemap(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let guides = state.repo.list_all(false).await?;
    let xml = sitemap_xml(&state.site_url, &guides);
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}

async fn robots(State(state): State<Arc<AppState>>) -> String {
    robots_txt(&state.site_url)
}

// -- session --

#[derive(Debug, Deserialize)]
struct PreviewRequest {
    content: String,
}

async fn preview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, AppError> {
    authorize_session(&state.sessions, &headers)?;
    state
        .admin
        .throttle(RateLimitPolicy::PREVIEW, &client_identity(&headers))
        .await?;
    let Json(request) = body.map_err(|_| AppError::BadRequest("Invalid content".to_string()))?;
    let html = state.admin.preview(&request.content).await?;
    Ok(Json(PreviewResponse { ok: true, html }))
}

// -- admin --

#[derive(Debug, Deserialize)]
struct AdminListQuery {
    q: Option<String>,
}

/// Every guide including drafts, optionally narrowed by `?q=`.
async fn admin_list_guides(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<AdminListQuery>,
) -> Result<Json<GuideListResponse>, AppError> {
    authorize_admin(&state.sessions, state.users.as_ref(), &headers).await?;
    let guides = match params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.repo.search(q, true).await?,
        None => state.repo.list_all(true).await?,
    };
    let guides: Vec<_> = guides.iter().map(to_summary).collect();
    Ok(Json(GuideListResponse {
        total: guides.len(),
        guides,
    }))
}

async fn admin_get_guide(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<RawGuideResponse>, AppError> {
    authorize_admin(&state.sessions, state.users.as_ref(), &headers).await?;
    let raw = state
        .repo
        .get_raw_by_slug(&slug, true)
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    Ok(Json(RawGuideResponse {
        metadata: to_summary(&raw.metadata),
        content: raw.content,
        content_hash: raw.content_hash,
    }))
}

fn json_body(body: Result<Json<GuideInput>, JsonRejection>) -> Result<GuideInput, AppError> {
    body.map(|Json(input)| input)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn create_guide(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<GuideInput>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    authorize_admin(&state.sessions, state.users.as_ref(), &headers).await?;
    state
        .admin
        .throttle(RateLimitPolicy::CREATE, &client_identity(&headers))
        .await?;
    let slug = state.admin.create(json_body(body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            message: "Guide created successfully".to_string(),
            slug: Some(slug.to_string()),
        }),
    ))
}

async fn update_guide(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    body: Result<Json<GuideInput>, JsonRejection>,
) -> Result<Json<MutationResponse>, AppError> {
    authorize_admin(&state.sessions, state.users.as_ref(), &headers).await?;
    state
        .admin
        .throttle(RateLimitPolicy::UPDATE, &client_identity(&headers))
        .await?;
    let new_slug = state.admin.update(&slug, json_body(body)?).await?;
    Ok(Json(MutationResponse {
        message: "Guide updated successfully".to_string(),
        slug: Some(new_slug.to_string()),
    }))
}

async fn delete_guide(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<MutationResponse>, AppError> {
    authorize_admin(&state.sessions, state.users.as_ref(), &headers).await?;
    state
        .admin
        .throttle(RateLimitPolicy::DELETE, &client_identity(&headers))
        .await?;
    state.admin.delete(&slug).await?;
    Ok(Json(MutationResponse {
        message: "Guide deleted successfully".to_string(),
        slug: None,
    }))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<GuideStatsResponse>, AppError> {
    authorize_admin(&state.sessions, state.users.as_ref(), &headers).await?;
    let guides = state.repo.list_all(false).await?;
    Ok(Json(guide_stats(&guides)))
}
