//! Article resolution: identifier to [`Article`], through the cache.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::article::{self, Article};
use crate::cache::{Cache, CacheValue};
use crate::url::strip_extension;

/// Loads articles from a content directory, memoizing raw file contents.
pub struct ArticleStore {
    /// The directory holding `{id}.{extension}` files.
    content_directory: PathBuf,

    /// The extension of article files, without the leading dot.
    extension: String,

    /// Prefix for canonical article URLs. Ends in a trailing slash.
    site_url: Url,

    /// Delimits the summary within an article body.
    summary_marker: String,

    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl ArticleStore {
    pub fn new(
        content_directory: &Path,
        extension: &str,
        site_url: &Url,
        summary_marker: &str,
        cache: Arc<dyn Cache>,
        ttl: Duration,
    ) -> ArticleStore {
        ArticleStore {
            content_directory: content_directory.to_owned(),
            extension: extension.to_owned(),
            site_url: site_url.clone(),
            summary_marker: summary_marker.to_owned(),
            cache,
            ttl,
        }
    }

    /// Resolves an identifier (with or without a known extension) into an
    /// [`Article`]. Returns `Ok(None)` when no file backs the identifier.
    pub fn resolve(&self, id: &str) -> Result<Option<Article>> {
        let id = strip_extension(id, &self.extension);
        match self.load(id)? {
            Some(raw) => Ok(Some(Article::parse(
                id,
                raw,
                &self.site_url,
                &self.summary_marker,
            )?)),
            None => Ok(None),
        }
    }

    /// Returns the raw contents for `id`, from the cache when present.
    fn load(&self, id: &str) -> Result<Option<Arc<[u8]>>> {
        let key = cache_key(id);
        if let Some(CacheValue::Raw(raw)) = self.cache.get(&key) {
            return Ok(Some(raw));
        }

        let path = match self.path(id) {
            Some(path) => path,
            None => {
                debug!(id, "identifier names no article file");
                return Ok(None);
            }
        };
        let raw: Arc<[u8]> = match std::fs::read(&path) {
            Ok(bytes) => bytes.into(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(id, path = %path.display(), "no article file");
                return Ok(None);
            }
            Err(err) => return Err(Error::Read { path, err }),
        };
        self.cache.set(&key, CacheValue::Raw(raw.clone()), self.ttl);
        Ok(Some(raw))
    }

    /// The file path for `id`, or `None` if `id` has an empty or `..`
    /// component and so can't name a file in the content directory.
    fn path(&self, id: &str) -> Option<PathBuf> {
        if id.is_empty() || id.split(['/', '\\']).any(|part| part.is_empty() || part == "..") {
            return None;
        }
        Some(self.content_directory.join(format!("{}.{}", id, self.extension)))
    }
}

fn cache_key(id: &str) -> String {
    format!("article:{}", id)
}

/// Represents the result of an article-resolution operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error resolving an [`Article`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for I/O problems other than a missing file.
    #[error("reading article file '{}': {err}", .path.display())]
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when the file contents can't be parsed.
    #[error(transparent)]
    Parse(#[from] article::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::MemoryCache;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        cache: Arc<dyn Cache>,
        store: ArticleStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(64));
        let store = ArticleStore::new(
            dir.path(),
            "md",
            &Url::parse("https://example.org/").unwrap(),
            "<!-- ~ -->",
            cache.clone(),
            Duration::from_secs(100),
        );
        Fixture { dir, cache, store }
    }

    impl Fixture {
        fn write(&self, id: &str, contents: &str) {
            fs::write(self.dir.path().join(format!("{}.md", id)), contents).unwrap();
        }

        fn remove(&self, id: &str) {
            fs::remove_file(self.dir.path().join(format!("{}.md", id))).unwrap();
        }
    }

    #[test]
    fn test_resolve_existing() -> Result<()> {
        let f = fixture();
        f.write("2020-01-01-a", "a: 1\n\nHello\n\n~\nWorld");
        let article = f.store.resolve("2020-01-01-a")?.expect("article");
        assert_eq!(Some(1), article.meta["a"].as_i64());
        assert!(article.summary.contains("Hello"));
        assert!(article.body.contains("World"));
        Ok(())
    }

    #[test]
    fn test_resolve_missing_is_none() -> Result<()> {
        let f = fixture();
        assert!(f.store.resolve("2020-01-01-nope")?.is_none());
        Ok(())
    }

    #[test]
    fn test_resolve_strips_extension() -> Result<()> {
        let f = fixture();
        f.write("2020-01-01-a", "\n\nbody");
        let article = f.store.resolve("2020-01-01-a.md")?.expect("article");
        assert_eq!("2020-01-01-a", article.id);
        assert!(f.store.resolve("2020-01-01-a.txt")?.is_some());
        Ok(())
    }

    #[test]
    fn test_second_resolve_served_from_cache() -> Result<()> {
        let f = fixture();
        f.write("2020-01-01-a", "title: A\n\nbody");
        let first = f.store.resolve("2020-01-01-a")?.expect("article");

        // with the file gone, only the cache can answer
        f.remove("2020-01-01-a");
        let second = f.store.resolve("2020-01-01-a")?.expect("cached article");
        assert_eq!(first.raw, second.raw);
        Ok(())
    }

    #[test]
    fn test_flush_forces_reread() -> Result<()> {
        let f = fixture();
        f.write("2020-01-01-a", "title: Old\n\nbody");
        assert_eq!("Old", f.store.resolve("2020-01-01-a")?.expect("article").title());

        f.write("2020-01-01-a", "title: New\n\nbody");
        assert_eq!("Old", f.store.resolve("2020-01-01-a")?.expect("article").title());

        f.cache.flush();
        assert_eq!("New", f.store.resolve("2020-01-01-a")?.expect("article").title());
        Ok(())
    }

    #[test]
    fn test_missing_files_are_not_cached() -> Result<()> {
        let f = fixture();
        assert!(f.store.resolve("2020-01-01-late")?.is_none());
        f.write("2020-01-01-late", "\n\nbody");
        assert!(f.store.resolve("2020-01-01-late")?.is_some());
        Ok(())
    }

    #[test]
    fn test_unnameable_identifiers_are_missing() -> Result<()> {
        let f = fixture();
        for id in ["../secret", "", "a\\", "a//b", "a/../b"] {
            assert!(f.store.resolve(id)?.is_none(), "{:?}", id);
        }
        Ok(())
    }

    #[test]
    fn test_parse_errors_propagate() {
        let f = fixture();
        f.write("2020-01-01-bad", "a: [1\n\nbody");
        assert!(matches!(f.store.resolve("2020-01-01-bad"), Err(Error::Parse(_))));
    }
}
