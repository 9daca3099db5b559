/// Guide repository: queryable view over the content store.
///
/// Single-item lookups propagate parse and compile failures. Bulk listings log and skip
/// a file that fails to load, so one bad guide cannot take down a listing page.
use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use crate::cache::{digest, HtmlCache};
use crate::frontmatter::{self, FrontmatterError};
use crate::markdown::{self, CompileError};
use crate::model::{Guide, GuideMetadata, RawGuide};
use crate::related::find_related_guides;
use crate::slug::{category_to_slug, GuideSlug};
use crate::store::{ContentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to parse guide {slug}: {source}")]
    Frontmatter {
        slug: String,
        #[source]
        source: FrontmatterError,
    },

    #[error("failed to compile guide {slug}: {source}")]
    Compile {
        slug: String,
        #[source]
        source: CompileError,
    },
}

pub struct GuideRepository {
    store: Arc<dyn ContentStore>,
    html_cache: HtmlCache,
}

impl GuideRepository {
    pub fn new(store: Arc<dyn ContentStore>, html_cache: HtmlCache) -> Self {
        Self { store, html_cache }
    }

    pub async fn list_slugs(&self) -> Result<Vec<GuideSlug>, RepositoryError> {
        Ok(self.store.list_slugs().await?)
    }

    /// Published guide (or any guide with `include_drafts`) with its body compiled.
    pub async fn get_by_slug(
        &self,
        slug: &str,
        include_drafts: bool,
    ) -> Result<Option<Guide>, RepositoryError> {
        let Some(raw) = self.get_raw_by_slug(slug, include_drafts).await? else {
            return Ok(None);
        };

        let html = self
            .compile(&raw.content)
            .await
            .map_err(|source| RepositoryError::Compile {
                slug: raw.metadata.slug.clone(),
                source,
            })?;

        Ok(Some(Guide {
            reading_time: markdown::reading_time(&raw.content),
            metadata: raw.metadata,
            html,
        }))
    }

    /// Same lookup as [`get_by_slug`](Self::get_by_slug), returning the uncompiled body.
    pub async fn get_raw_by_slug(
        &self,
        slug: &str,
        include_drafts: bool,
    ) -> Result<Option<RawGuide>, RepositoryError> {
        let Ok(slug) = slug.parse::<GuideSlug>() else {
            return Ok(None);
        };
        let Some(text) = self.store.read(&slug).await? else {
            return Ok(None);
        };

        let doc = frontmatter::parse(&slug, &text).map_err(|source| {
            RepositoryError::Frontmatter {
                slug: slug.to_string(),
                source,
            }
        })?;
        if !doc.metadata.is_visible(include_drafts) {
            return Ok(None);
        }

        Ok(Some(RawGuide {
            metadata: doc.metadata,
            content: doc.body,
            content_hash: digest(&text),
        }))
    }

    /// Metadata of every guide, in slug order. Unreadable files are skipped.
    pub async fn list_all(&self, include_drafts: bool) -> Result<Vec<GuideMetadata>, RepositoryError> {
        let slugs = self.store.list_slugs().await?;
        let loaded = join_all(slugs.iter().map(|slug| self.load_metadata(slug))).await;

        let guides = slugs
            .iter()
            .zip(loaded)
            .filter_map(|(slug, result)| {
                result
                    .inspect_err(|e| warn!(slug = %slug, error = %e, "skipping unreadable guide"))
                    .ok()
                    .flatten()
            })
            .filter(|meta| meta.is_visible(include_drafts))
            .collect();
        Ok(guides)
    }

    /// Case-insensitive substring match on title, description and tags.
    pub async fn search(
        &self,
        term: &str,
        include_drafts: bool,
    ) -> Result<Vec<GuideMetadata>, RepositoryError> {
        let term = term.to_lowercase();
        let guides = self.list_all(include_drafts).await?;
        Ok(guides
            .into_iter()
            .filter(|g| {
                g.title.to_lowercase().contains(&term)
                    || g.description.to_lowercase().contains(&term)
                    || g.tags.iter().any(|t| t.to_lowercase().contains(&term))
            })
            .collect())
    }

    /// Guides whose category normalizes to the same slug as `category`.
    pub async fn by_category(
        &self,
        category: &str,
        include_drafts: bool,
    ) -> Result<Vec<GuideMetadata>, RepositoryError> {
        let wanted = category_to_slug(category);
        let guides = self.list_all(include_drafts).await?;
        Ok(guides
            .into_iter()
            .filter(|g| category_to_slug(&g.category) == wanted)
            .collect())
    }

    /// Published guides most similar to the published guide at `slug`, or `None` if
    /// there is no such guide.
    pub async fn related(
        &self,
        slug: &str,
        limit: usize,
    ) -> Result<Option<Vec<GuideMetadata>>, RepositoryError> {
        let Some(current) = self.get_raw_by_slug(slug, false).await? else {
            return Ok(None);
        };
        let pool = self.list_all(false).await?;
        Ok(Some(find_related_guides(&current.metadata, &pool, limit)))
    }

    pub async fn write(&self, slug: &GuideSlug, text: &str) -> Result<(), RepositoryError> {
        Ok(self.store.write(slug, text).await?)
    }

    pub async fn delete(&self, slug: &GuideSlug) -> Result<(), RepositoryError> {
        Ok(self.store.delete(slug).await?)
    }

    /// Compile a body, consulting the HTML cache first.
    pub async fn compile(&self, body: &str) -> Result<String, CompileError> {
        if let Some(html) = self.html_cache.get(body).await {
            return Ok(html);
        }
        let html = markdown::compile(body)?;
        self.html_cache.set(body, &html).await;
        Ok(html)
    }

    async fn load_metadata(&self, slug: &GuideSlug) -> Result<Option<GuideMetadata>, RepositoryError> {
        let Some(text) = self.store.read(slug).await? else {
            return Ok(None);
        };
        frontmatter::parse_metadata(slug, &text)
            .map(Some)
            .map_err(|source| RepositoryError::Frontmatter {
                slug: slug.to_string(),
                source,
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Difficulty, GuideStatus};
    use crate::store::FsContentStore;

    pub(crate) const BODY: &str = "## Overview\n\nSome useful instructions for the reader.";

    pub(crate) fn guide_file(title: &str, category: &str, extra: &str) -> String {
        format!(
            "---\ntitle: \"{title}\"\ndescription: \"About {title}\"\ncategory: \"{category}\"\n{extra}---\n\n{BODY}\n"
        )
    }

    pub(crate) fn write_fixture(root: &std::path::Path, slug: &str, text: &str) {
        let path = root.join("en").join(format!("{slug}.mdx"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    /// A small content tree: two published guides, one draft, one broken file.
    pub(crate) fn fixture_repo(root: &std::path::Path) -> GuideRepository {
        write_fixture(
            root,
            "vpn-and-tunnels/setting-up-wireguard",
            &guide_file(
                "Setting Up WireGuard",
                "VPN & Tunnels",
                "difficulty: Intermediate\ntags: [\"vpn\", \"WireGuard\"]\nukSpecific: true\n",
            ),
        );
        write_fixture(
            root,
            "media/setting-up-plex",
            &guide_file("Setting Up Plex", "Media", "tags: [\"streaming\"]\n"),
        );
        write_fixture(
            root,
            "media/jellyfin-draft",
            &guide_file("Jellyfin", "Media", "status: draft\ntags: [\"streaming\"]\n"),
        );
        write_fixture(root, "media/broken", "no frontmatter here\n");

        let store = FsContentStore::new(root, "en");
        GuideRepository::new(Arc::new(store), HtmlCache::disabled())
    }

    #[tokio::test]
    async fn list_all_skips_drafts_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());

        let public: Vec<String> = repo.list_all(false).await.unwrap().into_iter().map(|g| g.slug).collect();
        assert_eq!(public, vec!["media/setting-up-plex", "vpn-and-tunnels/setting-up-wireguard"]);

        let all = repo.list_all(true).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|g| g.status == GuideStatus::Draft));
        assert_eq!(repo.list_slugs().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn missing_tags_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());
        write_fixture(dir.path(), "misc/no-tags", &guide_file("No Tags", "Misc", ""));

        let guides = repo.list_all(false).await.unwrap();
        let guide = guides.iter().find(|g| g.slug == "misc/no-tags").unwrap();
        assert!(guide.tags.is_empty());
        assert_eq!(guide.difficulty, Difficulty::Beginner);
    }

    #[tokio::test]
    async fn get_by_slug_filters_drafts_and_compiles() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());

        assert!(repo.get_by_slug("media/jellyfin-draft", false).await.unwrap().is_none());
        assert!(repo.get_by_slug("media/jellyfin-draft", true).await.unwrap().is_some());
        assert!(repo.get_by_slug("media/nope", false).await.unwrap().is_none());
        assert!(repo.get_by_slug("../../etc/passwd", true).await.unwrap().is_none());

        let guide = repo.get_by_slug("media/setting-up-plex", false).await.unwrap().unwrap();
        assert!(guide.html.contains(r#"<h2 id="overview">"#));
        assert_eq!(guide.reading_time, "1 min read");
        assert_eq!(guide.metadata.slug, "media/setting-up-plex");
    }

    #[tokio::test]
    async fn single_lookup_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());
        assert!(matches!(
            repo.get_raw_by_slug("media/broken", true).await,
            Err(RepositoryError::Frontmatter { .. })
        ));
    }

    #[tokio::test]
    async fn raw_lookup_returns_body_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());

        let raw = repo.get_raw_by_slug("media/setting-up-plex", false).await.unwrap().unwrap();
        assert_eq!(raw.content, BODY);
        let text = std::fs::read_to_string(dir.path().join("en/media/setting-up-plex.mdx")).unwrap();
        assert_eq!(raw.content_hash, digest(&text));
    }

    #[tokio::test]
    async fn search_matches_title_description_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());

        let by_tag = repo.search("wireguard", false).await.unwrap();
        assert_eq!(by_tag.len(), 1);

        let by_tag_only = repo.search("STREAMING", false).await.unwrap();
        assert_eq!(by_tag_only.len(), 1, "draft must not match");
        assert_eq!(repo.search("STREAMING", true).await.unwrap().len(), 2);

        let by_description = repo.search("about setting", false).await.unwrap();
        assert_eq!(by_description.len(), 2);

        assert!(repo.search("kubernetes", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn by_category_normalizes_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());

        assert_eq!(repo.by_category("vpn-and-tunnels", false).await.unwrap().len(), 1);
        assert_eq!(repo.by_category("VPN & Tunnels", false).await.unwrap().len(), 1);
        assert_eq!(repo.by_category("media", false).await.unwrap().len(), 1);
        assert_eq!(repo.by_category("media", true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn related_uses_published_guides_only() {
        let dir = tempfile::tempdir().unwrap();
        let repo = fixture_repo(dir.path());

        let related = repo.related("media/setting-up-plex", 3).await.unwrap().unwrap();
        let slugs: Vec<&str> = related.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, vec!["vpn-and-tunnels/setting-up-wireguard"]);

        assert!(repo.related("media/jellyfin-draft", 3).await.unwrap().is_none());
        assert!(repo.related("media/nope", 3).await.unwrap().is_none());
    }
}
