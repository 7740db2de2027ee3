//! Loads the site configuration from a `hypr.yaml` project file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::archive::PageOrder;
use crate::url::with_trailing_slash;

/// The name of the project file.
pub const PROJECT_FILE: &str = "hypr.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(25)
    }
}

#[derive(Deserialize)]
struct ArticlesPerPage(usize);
impl Default for ArticlesPerPage {
    fn default() -> Self {
        ArticlesPerPage(10)
    }
}

#[derive(Deserialize)]
struct CacheTtl(u64);
impl Default for CacheTtl {
    fn default() -> Self {
        CacheTtl(100)
    }
}

#[derive(Deserialize)]
struct CacheCapacity(u64);
impl Default for CacheCapacity {
    fn default() -> Self {
        CacheCapacity(10_000)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    site_url: Url,

    #[serde(default)]
    site_name: String,

    #[serde(default)]
    site_description: String,

    #[serde(default)]
    author: Option<Author>,

    content_directory: Option<PathBuf>,
    templates_directory: Option<PathBuf>,

    #[serde(default)]
    partials: Vec<PathBuf>,

    extension: Option<String>,

    /// Seconds; zero disables expiry.
    #[serde(default)]
    cache_ttl: CacheTtl,

    #[serde(default)]
    cache_capacity: CacheCapacity,

    #[serde(default)]
    page_size: PageSize,

    #[serde(default)]
    articles_per_page: ArticlesPerPage,

    summary_marker: Option<String>,

    #[serde(default)]
    page_order: PageOrder,
}

/// The author credited in feeds.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// The resolved site configuration. Relative paths from the project file
/// are resolved against the directory containing it.
#[derive(Clone, Debug)]
pub struct Config {
    /// The site's root URL. Always ends in a trailing slash.
    pub site_url: Url,
    pub site_name: String,
    pub site_description: String,
    pub author: Option<Author>,

    /// The directory holding article files.
    pub content_directory: PathBuf,

    /// The directory holding page, feed, and sitemap templates.
    pub templates_directory: PathBuf,

    /// Template files (relative to `templates_directory`) prepended to every
    /// template.
    pub partials: Vec<PathBuf>,

    /// Article file extension, without the leading dot.
    pub extension: String,

    /// How long cache entries live. Zero means forever.
    pub cache_ttl: Duration,

    /// Maximum number of cache entries.
    pub cache_capacity: u64,

    /// Number of entries per archive page.
    pub page_size: usize,

    /// Number of articles on the index page and in feeds.
    pub articles_per_page: usize,

    /// Delimits the summary within an article body.
    pub summary_marker: String,

    /// Whether archive pages are sliced before or after sorting.
    pub page_order: PageOrder,
}

impl Config {
    /// Creates a configuration with defaults for everything but the site
    /// URL, rooted at `root`.
    pub fn new(site_url: Url, root: &Path) -> Config {
        Config {
            site_url: with_trailing_slash(site_url),
            site_name: String::new(),
            site_description: String::new(),
            author: None,
            content_directory: root.join("articles"),
            templates_directory: root.join("templates"),
            partials: Vec::new(),
            extension: String::from("md"),
            cache_ttl: Duration::from_secs(CacheTtl::default().0),
            cache_capacity: CacheCapacity::default().0,
            page_size: PageSize::default().0,
            articles_per_page: ArticlesPerPage::default().0,
            summary_marker: String::from("<!-- ~ -->"),
            page_order: PageOrder::default(),
        }
    }

    /// Loads the configuration from `path`, which may be either a project
    /// file or a directory to search from.
    pub fn load(path: &Path) -> Result<Config> {
        if path.is_file() {
            Config::from_project_file(path)
        } else {
            let dir = path
                .canonicalize()
                .with_context(|| format!("Resolving directory `{}`", path.display()))?;
            Config::from_directory(&dir)
        }
    }

    /// Searches `dir` and its ancestors for a project file and loads it.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path).context("Loading configuration")
        } else {
            match dir.parent() {
                Some(dir) => Config::from_directory(dir),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a project file.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)
            .with_context(|| format!("Parsing project file `{}`", path.display()))?;
        let root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        Config::from_project(project, root)
    }

    fn from_project(project: Project, root: &Path) -> Result<Config> {
        if project.page_size.0 == 0 {
            bail!("`page_size` must be greater than zero");
        }
        if project.articles_per_page.0 == 0 {
            bail!("`articles_per_page` must be greater than zero");
        }

        let mut config = Config::new(project.site_url, root);
        config.site_name = project.site_name;
        config.site_description = project.site_description;
        config.author = project.author;
        if let Some(dir) = project.content_directory {
            config.content_directory = root.join(dir);
        }
        if let Some(dir) = project.templates_directory {
            config.templates_directory = root.join(dir);
        }
        config.partials = project.partials;
        if let Some(extension) = project.extension {
            config.extension = extension.trim_start_matches('.').to_owned();
        }
        if config.extension.is_empty() {
            bail!("`extension` must not be empty");
        }
        config.cache_ttl = Duration::from_secs(project.cache_ttl.0);
        config.cache_capacity = project.cache_capacity.0;
        config.page_size = project.page_size.0;
        config.articles_per_page = project.articles_per_page.0;
        if let Some(marker) = project.summary_marker {
            config.summary_marker = marker;
        }
        config.page_order = project.page_order;
        Ok(config)
    }
}
