/// Guide create, update, delete and preview.
///
/// Callers are already authorized and have passed `throttle` for the matching
/// [`RateLimitPolicy`] before the request body is read.
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::frontmatter;
use crate::model::{GuideMetadata, GuideStatus, RawGuide};
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::repository::GuideRepository;
use crate::sanitize::sanitize;
use crate::slug::GuideSlug;
use crate::validation::{validate, GuideInput, ValidGuide};

const NOT_FOUND: &str = "Guide not found";

/// Display format of `lastUpdated`, e.g. "05 Mar 2026".
pub const LAST_UPDATED_FORMAT: &str = "%d %b %Y";

pub struct AdminService {
    repo: Arc<GuideRepository>,
    limiter: RateLimiter,
}

impl AdminService {
    pub fn new(repo: Arc<GuideRepository>, limiter: RateLimiter) -> Self {
        Self { repo, limiter }
    }

    pub async fn create(&self, input: GuideInput) -> Result<GuideSlug, AppError> {
        let guide = validate(input).map_err(AppError::Validation)?;

        let status = guide.status.unwrap_or_default();
        let slug = self.store(guide, status).await?;
        info!(slug = %slug, "guide created");
        Ok(slug)
    }

    /// Rewrite the guide at `original_slug`. A changed title or category moves the file.
    pub async fn update(
        &self,
        original_slug: &str,
        mut input: GuideInput,
    ) -> Result<GuideSlug, AppError> {
        let (old_slug, existing) = self.existing(original_slug).await?;

        let expected_hash = input.expected_hash.take();
        let guide = validate(input).map_err(AppError::Validation)?;
        if expected_hash.is_some_and(|h| h != existing.content_hash) {
            return Err(AppError::Conflict);
        }

        let status = guide.status.unwrap_or(existing.metadata.status);
        let new_slug = self.store(guide, status).await?;

        if new_slug != old_slug {
            if let Err(e) = self.repo.delete(&old_slug).await {
                warn!(old = %old_slug, new = %new_slug, error = %e, "failed to remove old guide file after rename");
            }
        }
        info!(slug = %new_slug, previous = %old_slug, "guide updated");
        Ok(new_slug)
    }

    pub async fn delete(&self, slug: &str) -> Result<(), AppError> {
        let (slug, _) = self.existing(slug).await?;
        self.repo.delete(&slug).await?;
        info!(slug = %slug, "guide deleted");
        Ok(())
    }

    /// Sanitize and compile an unsaved body.
    pub async fn preview(&self, content: &str) -> Result<String, AppError> {
        Ok(self.repo.compile(&sanitize(content)).await?)
    }

    /// Count one request from `client` against `policy`.
    pub async fn throttle(&self, policy: RateLimitPolicy, client: &str) -> Result<(), AppError> {
        let decision = self.limiter.check(policy, client).await;
        if decision.allowed {
            debug!(action = policy.action, client, remaining = decision.remaining, "rate limit check passed");
            Ok(())
        } else {
            warn!(action = policy.action, client, "rate limit exceeded");
            Err(AppError::RateLimited {
                reset_at_ms: decision.reset_at_ms,
            })
        }
    }

    /// Drafts count as existing here.
    async fn existing(&self, slug: &str) -> Result<(GuideSlug, RawGuide), AppError> {
        let parsed: GuideSlug = slug.parse().map_err(|_| AppError::NotFound(NOT_FOUND))?;
        let raw = self
            .repo
            .get_raw_by_slug(parsed.as_str(), true)
            .await?
            .ok_or(AppError::NotFound(NOT_FOUND))?;
        Ok((parsed, raw))
    }

    async fn store(&self, guide: ValidGuide, status: GuideStatus) -> Result<GuideSlug, AppError> {
        let slug = GuideSlug::for_guide(&guide.category, &guide.title).map_err(|_| {
            AppError::BadRequest("Title and category must contain letters or digits".to_string())
        })?;
        let metadata = GuideMetadata {
            title: guide.title,
            description: guide.description,
            category: guide.category,
            difficulty: guide.difficulty,
            time: guide.time,
            uk_specific: guide.uk_specific,
            tags: guide.tags,
            tested_on: guide.tested_on,
            status,
            last_updated: chrono::Local::now().format(LAST_UPDATED_FORMAT).to_string(),
            slug: slug.to_string(),
        };
        let text = frontmatter::render(&metadata, &sanitize(&guide.content));
        self.repo.write(&slug, &text).await?;
        Ok(slug)
    }
}
