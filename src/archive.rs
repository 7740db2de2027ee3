//! Archive listing: scanning the content directory for article files,
//! filtering them by name, paginating, and memoizing each page.
//!
//! Pagination is applied either during the scan ([`PageOrder::Scan`]) or after
//! sorting every match ([`PageOrder::Newest`]). With `Scan`, a page holds the
//! entries that fall in its window of enumeration order, sorted newest-first
//! among themselves, so it isn't guaranteed to hold the newest entries overall.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::cache::{Cache, CacheValue};
use crate::url::{relative_url, strip_extension};

/// A listed article: its identifier and site-relative URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// The identifier, e.g. `2020-01-01-a`.
    pub name: String,

    /// The site-relative URL, e.g. `/2020/01/01/a`.
    pub url: String,
}

impl ArchiveEntry {
    /// Builds an entry from a raw file name, stripping its extension.
    pub fn from_file_name(file_name: &str, extension: &str) -> ArchiveEntry {
        let name = strip_extension(file_name, extension);
        ArchiveEntry {
            name: name.to_owned(),
            url: relative_url(name),
        }
    }
}

/// When pagination is applied relative to sorting.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageOrder {
    /// Slice in enumeration order during the scan, then sort the page.
    #[default]
    Scan,

    /// Sort every match newest-first, then slice.
    Newest,
}

/// Lists article entries from some storage.
pub trait ContentIndex: Send + Sync {
    /// Returns page `offset` (of `limit` entries each) of the entries whose
    /// file name contains `filter`, sorted newest-first.
    fn list(&self, filter: &str, limit: usize, offset: usize) -> Result<Vec<ArchiveEntry>>;
}

/// A [`ContentIndex`] over a directory tree. Directories are walked
/// recursively; entries within a directory are enumerated in file-name order.
pub struct DirectoryIndex {
    root: PathBuf,
    extension: String,
    order: PageOrder,
}

impl DirectoryIndex {
    pub fn new(root: &Path, extension: &str, order: PageOrder) -> DirectoryIndex {
        DirectoryIndex {
            root: root.to_owned(),
            extension: extension.to_owned(),
            order,
        }
    }

    /// Visits the file names of every candidate file in enumeration order.
    fn scan(&self, filter: &str, mut visit: impl FnMut(&str)) -> Result<()> {
        for result in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            if is_candidate(&file_name, filter) {
                visit(&file_name);
            }
        }
        Ok(())
    }
}

impl ContentIndex for DirectoryIndex {
    fn list(&self, filter: &str, limit: usize, offset: usize) -> Result<Vec<ArchiveEntry>> {
        let (index_from, index_to) = window(limit, offset);
        let mut entries = Vec::new();

        match self.order {
            PageOrder::Scan => {
                let mut count = 0;
                self.scan(filter, |file_name| {
                    if count >= index_from && count < index_to {
                        entries.push(ArchiveEntry::from_file_name(file_name, &self.extension));
                    }
                    count += 1;
                })?;
                sort_newest_first(&mut entries);
            }
            PageOrder::Newest => {
                self.scan(filter, |file_name| {
                    entries.push(ArchiveEntry::from_file_name(file_name, &self.extension));
                })?;
                sort_newest_first(&mut entries);
                entries = entries
                    .into_iter()
                    .skip(index_from)
                    .take(index_to - index_from)
                    .collect();
            }
        }

        debug!(filter, index_from, index_to, found = entries.len(), "scanned archive");
        Ok(entries)
    }
}

/// A file is listed when its name contains `filter` and its first `.` comes
/// after at least one character (it has an extension and isn't a dot-file).
fn is_candidate(file_name: &str, filter: &str) -> bool {
    file_name.contains(filter) && file_name.find('.').is_some_and(|i| i > 0)
}

/// The `[from, to)` index range for page `offset` of `limit` entries.
fn window(limit: usize, offset: usize) -> (usize, usize) {
    let from = limit.saturating_mul(offset);
    (from, from.saturating_add(limit))
}

fn sort_newest_first(entries: &mut [ArchiveEntry]) {
    entries.sort_by(|a, b| b.name.cmp(&a.name));
}

/// The cached front of a [`ContentIndex`].
pub struct Archives {
    index: Box<dyn ContentIndex>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl Archives {
    pub fn new(index: Box<dyn ContentIndex>, cache: Arc<dyn Cache>, ttl: Duration) -> Archives {
        Archives { index, cache, ttl }
    }

    /// Returns page `offset` of `limit` entries matching `filter`, from the
    /// cache when present.
    pub fn list(&self, filter: &str, limit: usize, offset: usize) -> Result<Arc<[ArchiveEntry]>> {
        let key = cache_key(filter, limit, offset);
        if let Some(CacheValue::Archive(entries)) = self.cache.get(&key) {
            return Ok(entries);
        }

        let entries: Arc<[ArchiveEntry]> = self.index.list(filter, limit, offset)?.into();
        self.cache.set(&key, CacheValue::Archive(entries.clone()), self.ttl);
        Ok(entries)
    }
}

fn cache_key(filter: &str, limit: usize, offset: usize) -> String {
    let (index_from, index_to) = window(limit, offset);
    format!("archives:{}:{}:{}", filter, index_from, index_to)
}

/// Represents the result of a listing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error listing archive entries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for WalkDir I/O errors.
    #[error("scanning content directory: {0}")]
    WalkDir(#[from] walkdir::Error),
}
