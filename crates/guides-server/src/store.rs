/// Content store: where guide files live.
///
/// The repository and admin service only ever speak in slugs; mapping a slug to a
/// location is the store's business. `FsContentStore` keeps one file per guide under
/// `<root>/<locale>/<category>/<title>.mdx`.
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::slug::{GuideSlug, CONTENT_EXTENSION};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("guide file is not valid UTF-8: {0}")]
    Encoding(String),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every stored guide, as sorted slugs.
    async fn list_slugs(&self) -> Result<Vec<GuideSlug>, StoreError>;

    /// File text for `slug`, or `None` if no such file exists.
    async fn read(&self, slug: &GuideSlug) -> Result<Option<String>, StoreError>;

    /// Create or overwrite the file for `slug`.
    async fn write(&self, slug: &GuideSlug, text: &str) -> Result<(), StoreError>;

    /// Remove the file for `slug`. Removing a missing file is an error.
    async fn delete(&self, slug: &GuideSlug) -> Result<(), StoreError>;

    async fn exists(&self, slug: &GuideSlug) -> Result<bool, StoreError> {
        Ok(self.read(slug).await?.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct FsContentStore {
    locale_dir: PathBuf,
}

impl FsContentStore {
    pub fn new(content_root: impl AsRef<Path>, locale: &str) -> Self {
        Self {
            locale_dir: content_root.as_ref().join(locale),
        }
    }

    pub fn path_for(&self, slug: &GuideSlug) -> PathBuf {
        self.locale_dir.join(slug.relative_path())
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn list_slugs(&self) -> Result<Vec<GuideSlug>, StoreError> {
        let mut slugs = Vec::new();
        if !fs::try_exists(&self.locale_dir)
            .await
            .map_err(|e| StoreError::io(&self.locale_dir, e))?
        {
            return Ok(slugs);
        }

        let mut pending = vec![self.locale_dir.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| StoreError::io(&dir, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::io(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| StoreError::io(&path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some(CONTENT_EXTENSION) {
                    continue;
                }
                match slug_for_path(&self.locale_dir, &path) {
                    Some(slug) => slugs.push(slug),
                    None => debug!(path = %path.display(), "skipping file with unusable name"),
                }
            }
        }

        slugs.sort();
        Ok(slugs)
    }

    async fn read(&self, slug: &GuideSlug) -> Result<Option<String>, StoreError> {
        let path = self.path_for(slug);
        match fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Encoding(slug.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    async fn write(&self, slug: &GuideSlug, text: &str) -> Result<(), StoreError> {
        let path = self.path_for(slug);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(&path, text).await.map_err(|e| StoreError::io(&path, e))
    }

    async fn delete(&self, slug: &GuideSlug) -> Result<(), StoreError> {
        let path = self.path_for(slug);
        fs::remove_file(&path).await.map_err(|e| StoreError::io(&path, e))
    }
}

fn slug_for_path(root: &Path, path: &Path) -> Option<GuideSlug> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    segments.join("/").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> GuideSlug {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn write_read_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path(), "en");

        assert!(store.list_slugs().await.unwrap().is_empty());

        store.write(&slug("networking/dns"), "dns").await.unwrap();
        store.write(&slug("media/plex"), "plex").await.unwrap();
        assert!(dir.path().join("en/networking/dns.mdx").exists());

        let slugs = store.list_slugs().await.unwrap();
        assert_eq!(slugs, vec![slug("media/plex"), slug("networking/dns")]);
        assert_eq!(store.read(&slug("media/plex")).await.unwrap().as_deref(), Some("plex"));
        assert_eq!(store.read(&slug("media/missing")).await.unwrap(), None);

        store.delete(&slug("media/plex")).await.unwrap();
        assert!(!store.exists(&slug("media/plex")).await.unwrap());
        assert!(store.delete(&slug("media/plex")).await.is_err());
    }

    #[tokio::test]
    async fn listing_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let locale = dir.path().join("en");
        std::fs::create_dir_all(locale.join("media/nested")).unwrap();
        std::fs::write(locale.join("media/readme.md"), "x").unwrap();
        std::fs::write(locale.join("media/nested/deep.mdx"), "x").unwrap();

        let store = FsContentStore::new(dir.path(), "en");
        assert_eq!(store.list_slugs().await.unwrap(), vec![slug("media/nested/deep")]);
    }
}
