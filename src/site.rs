//! Exports [`Site`], which stitches together article resolution
//! ([`crate::store`]), archive listing ([`crate::archive`]), and templating
//! ([`crate::template`]) into the views the server exposes.

use std::collections::HashMap;
use std::sync::Arc;

use gtmpl_value::Value;
use tracing::{debug, info};

use crate::archive::{self, ArchiveEntry, Archives, ContentIndex, DirectoryIndex};
use crate::article::Article;
use crate::cache::{Cache, MemoryCache};
use crate::config::Config;
use crate::feed::{self, FeedConfig};
use crate::store::{self, ArticleStore};
use crate::tag::Tag;
use crate::template::{self, Renderer, TemplateDir};
use crate::value::array;

pub const HTML: &str = "text/html; charset=utf-8";
pub const RSS: &str = "application/rss+xml; charset=utf-8";
pub const ATOM: &str = "application/atom+xml; charset=utf-8";
pub const XML: &str = "application/xml; charset=utf-8";

const NOT_FOUND_TEMPLATE: &str = "pages/404.html";

/// A rendered response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub body: String,
    pub content_type: &'static str,
}

impl Page {
    fn html(body: String) -> Page {
        Page {
            body,
            content_type: HTML,
        }
    }
}

/// The date components narrowing an archive listing. Each is present only
/// if the previous one is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveDate {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
}

impl ArchiveDate {
    /// The file-name filter, e.g. `2011-04`. Empty when no year is given.
    fn filter(&self) -> Result<String> {
        let parts = [(&self.year, 4), (&self.month, 2), (&self.day, 2)];
        let mut filter = String::new();
        for (part, width) in parts {
            match part {
                Some(part) if is_digits(part, width) => {
                    if !filter.is_empty() {
                        filter.push('-');
                    }
                    filter.push_str(part);
                }
                Some(_) => return Err(Error::NotFound),
                None => break,
            }
        }
        Ok(filter)
    }

    /// The archive path for these components, e.g. `/archives/2011/04`.
    fn path(&self) -> String {
        [&self.year, &self.month, &self.day]
            .iter()
            .map_while(|part| part.as_deref())
            .fold(String::from("/archives"), |path, part| path + "/" + part)
    }
}

/// What an admin action did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminOutcome {
    Flushed,
}

/// The blog: every view the server exposes, built from the configured
/// content and template directories.
pub struct Site {
    config: Config,
    cache: Arc<dyn Cache>,
    store: ArticleStore,
    archives: Archives,
    renderer: Box<dyn Renderer>,
}

impl Site {
    /// Builds a site over an in-memory cache, the configured content
    /// directory, and the configured template directory.
    pub fn new(config: Config) -> Site {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(config.cache_capacity));
        let index = Box::new(DirectoryIndex::new(
            &config.content_directory,
            &config.extension,
            config.page_order,
        ));
        let renderer = Box::new(TemplateDir::new(
            &config.templates_directory,
            config.partials.clone(),
            globals(&config),
        ));
        Site::with_parts(config, cache, index, renderer)
    }

    /// Builds a site from explicit collaborators.
    pub fn with_parts(
        config: Config,
        cache: Arc<dyn Cache>,
        index: Box<dyn ContentIndex>,
        renderer: Box<dyn Renderer>,
    ) -> Site {
        let store = ArticleStore::new(
            &config.content_directory,
            &config.extension,
            &config.site_url,
            &config.summary_marker,
            cache.clone(),
            config.cache_ttl,
        );
        let archives = Archives::new(index, cache.clone(), config.cache_ttl);
        Site {
            config,
            cache,
            store,
            archives,
            renderer,
        }
    }

    /// Resolves an article by identifier.
    pub fn resolve(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.store.resolve(id)?)
    }

    /// Resolves the entries of an archive page into articles, skipping
    /// entries whose file has disappeared since the listing was cached.
    fn resolve_all(&self, entries: &[ArchiveEntry]) -> Result<Vec<Article>> {
        let mut articles = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.store.resolve(&entry.name)? {
                Some(article) => articles.push(article),
                None => debug!(id = %entry.name, "listed article vanished"),
            }
        }
        Ok(articles)
    }

    /// The first `articles_per_page` articles of the unfiltered listing.
    pub fn recent_articles(&self) -> Result<Vec<Article>> {
        let entries = self.archives.list("", self.config.articles_per_page, 0)?;
        self.resolve_all(&entries)
    }

    /// Renders the home page.
    pub fn index(&self) -> Result<Page> {
        let articles = self.recent_articles()?;
        let mut context = HashMap::new();
        context.insert("articles".to_owned(), array(&articles));
        self.render_html("pages/index.html", context)
    }

    /// Renders the article `{year}-{month}-{day}-{slug}`.
    pub fn article(&self, year: &str, month: &str, day: &str, slug: &str) -> Result<Page> {
        if !(is_digits(year, 4) && is_digits(month, 2) && is_digits(day, 2)) {
            return Err(Error::NotFound);
        }
        let id = format!("{}-{}-{}-{}", year, month, day, slug);
        let article = self.store.resolve(&id)?.ok_or(Error::NotFound)?;
        let mut context = HashMap::new();
        context.insert("article".to_owned(), Value::from(&article));
        self.render_html("pages/article.html", context)
    }

    /// Renders page `page` of the archive narrowed by `date`.
    pub fn archives(&self, date: &ArchiveDate, page: usize) -> Result<Page> {
        let filter = date.filter()?;
        let limit = self.config.page_size;
        let entries = self.archives.list(&filter, limit, page)?;

        let path = date.path();
        let optional = |s: &Option<String>| s.as_ref().map_or(Value::Nil, Value::from);
        let mut context = HashMap::new();
        context.insert("year".to_owned(), optional(&date.year));
        context.insert("month".to_owned(), optional(&date.month));
        context.insert("day".to_owned(), optional(&date.day));
        context.insert("page".to_owned(), Value::from(page as u64));
        context.insert(
            "prev".to_owned(),
            match page {
                0 => Value::Nil,
                _ => format!("{}?page={}", path, page - 1).into(),
            },
        );
        context.insert(
            "next".to_owned(),
            match entries.len() < limit {
                true => Value::Nil,
                false => format!("{}?page={}", path, page + 1).into(),
            },
        );
        context.insert("archives".to_owned(), array(entries.iter()));
        self.render_html("pages/archives.html", context)
    }

    /// Renders every article carrying `tag`.
    pub fn tag(&self, tag: &str) -> Result<Page> {
        let tag = Tag::new(tag);
        if tag.name.is_empty() {
            return Err(Error::NotFound);
        }
        let entries = self.archives.list("", usize::MAX, 0)?;
        let articles: Vec<Article> = self
            .resolve_all(&entries)?
            .into_iter()
            .filter(|a| a.has_tag(&tag.name))
            .collect();

        let mut context = HashMap::new();
        context.insert("tag".to_owned(), Value::from(&tag));
        context.insert("articles".to_owned(), array(&articles));
        self.render_html("pages/tag.html", context)
    }

    /// Renders the RSS template.
    pub fn rss(&self) -> Result<Page> {
        Ok(Page {
            body: self.render_listing("rss.feed")?,
            content_type: RSS,
        })
    }

    /// Renders the sitemap template.
    pub fn sitemap(&self) -> Result<Page> {
        Ok(Page {
            body: self.render_listing("sitemap.xml")?,
            content_type: XML,
        })
    }

    /// Generates the Atom feed.
    pub fn atom(&self) -> Result<Page> {
        let articles = self.recent_articles()?;
        let config = FeedConfig {
            title: &self.config.site_name,
            subtitle: &self.config.site_description,
            id: self.config.site_url.as_str(),
            author: self.config.author.as_ref(),
            home_page: self.config.site_url.as_str(),
        };
        Ok(Page {
            body: feed::atom(&config, &articles),
            content_type: ATOM,
        })
    }

    /// Renders the free-standing page template `pages/{name}.html`. Slashes
    /// in `name` are dropped.
    pub fn page(&self, name: &str) -> Result<Page> {
        let name: String = name.chars().filter(|&c| c != '/').collect();
        if name.is_empty() {
            return Err(Error::NotFound);
        }
        self.render_html(&format!("pages/{}.html", name), HashMap::new())
    }

    /// Renders the not-found page, or a bare message if it has no template.
    pub fn not_found(&self) -> Page {
        match self.render_html(NOT_FOUND_TEMPLATE, HashMap::new()) {
            Ok(page) => page,
            Err(e) => {
                debug!(error = %e, "no usable not-found template");
                Page {
                    body: String::from("Not Found"),
                    content_type: "text/plain; charset=utf-8",
                }
            }
        }
    }

    /// Runs an admin action. Only `flush` exists.
    pub fn admin(&self, action: &str) -> Result<AdminOutcome> {
        match action {
            "flush" => {
                self.flush();
                Ok(AdminOutcome::Flushed)
            }
            _ => Err(Error::NotFound),
        }
    }

    /// Clears every cache entry.
    pub fn flush(&self) {
        info!("flushing cache");
        self.cache.flush();
    }

    fn render_listing(&self, template: &str) -> Result<String> {
        let articles = self.recent_articles()?;
        let mut context = HashMap::new();
        context.insert("title".to_owned(), Value::from(&self.config.site_name));
        context.insert("description".to_owned(), Value::from(&self.config.site_description));
        context.insert("site_url".to_owned(), Value::from(self.config.site_url.as_str()));
        context.insert("articles".to_owned(), array(&articles));
        Ok(self.renderer.render(template, Value::Object(context))?)
    }

    fn render_html(&self, template: &str, context: HashMap<String, Value>) -> Result<Page> {
        Ok(Page::html(self.renderer.render(template, Value::Object(context))?))
    }
}

/// Values available to every template.
fn globals(config: &Config) -> HashMap<String, Value> {
    let mut m = HashMap::new();
    m.insert("site_name".to_owned(), Value::from(&config.site_name));
    m.insert("site_description".to_owned(), Value::from(&config.site_description));
    m.insert("site_url".to_owned(), Value::from(config.site_url.as_str()));
    m
}

fn is_digits(s: &str, width: usize) -> bool {
    s.len() == width && s.bytes().all(|b| b.is_ascii_digit())
}

/// The result of a fallible view.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error producing a view. [`Error::NotFound`] is expected
/// and becomes a 404; everything else is a fault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the article, template, or action doesn't exist.
    #[error("not found")]
    NotFound,

    /// Returned for errors resolving articles.
    #[error(transparent)]
    Store(#[from] store::Error),

    /// Returned for errors listing the archive.
    #[error(transparent)]
    Archive(#[from] archive::Error),

    /// Returned for errors rendering templates other than a missing one.
    #[error(transparent)]
    Template(template::Error),
}

impl From<template::Error> for Error {
    /// Converts a [`template::Error`] into an [`Error`], treating a missing
    /// template as [`Error::NotFound`].
    fn from(err: template::Error) -> Error {
        match err {
            template::Error::NotFound(name) => {
                debug!(template = %name, "template not found");
                Error::NotFound
            }
            err => Error::Template(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use url::Url;

    fn write(root: &Path, name: &str, contents: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn fixture() -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "articles/2020-01-01-first.md", "title: First\ntags: [rust]\n\nHello first");
        write(
            root,
            "articles/2021-06-15-second.md",
            "title: Second\ntags: [food]\n\nHello second",
        );
        write(root, "templates/pages/index.html", "{{range .articles}}[{{.title}}]{{end}}");
        write(
            root,
            "templates/pages/article.html",
            "{{.site_name}}|{{.article.title}}|{{.article.body}}",
        );
        write(
            root,
            "templates/pages/archives.html",
            "{{.year}}:{{range .archives}}<{{.url}}>{{end}}",
        );
        write(
            root,
            "templates/pages/tag.html",
            "{{.tag.name}}:{{range .articles}}[{{.title}}]{{end}}",
        );
        write(root, "templates/pages/about.html", "About us");
        write(root, "templates/pages/404.html", "Nothing here");
        write(
            root,
            "templates/rss.feed",
            "<rss>{{.title}}{{range .articles}}<item>{{.url}}</item>{{end}}</rss>",
        );

        let mut config = Config::new(Url::parse("https://example.org/").unwrap(), root);
        config.site_name = String::from("Blog");
        (dir, Site::new(config))
    }

    #[test]
    fn test_index() -> Result<()> {
        let (_dir, site) = fixture();
        assert_eq!("[Second][First]", site.index()?.body);
        Ok(())
    }

    #[test]
    fn test_article() -> Result<()> {
        let (_dir, site) = fixture();
        let page = site.article("2020", "01", "01", "first")?;
        assert!(page.body.starts_with("Blog|First|"));
        assert!(page.body.contains("Hello first"));
        assert_eq!(HTML, page.content_type);
        Ok(())
    }

    #[test]
    fn test_missing_article() {
        let (_dir, site) = fixture();
        assert!(matches!(site.article("2020", "01", "01", "nope"), Err(Error::NotFound)));
        assert!(matches!(site.article("20", "01", "01", "first"), Err(Error::NotFound)));
        assert!(matches!(site.article("2020", "01", "01", "a\\"), Err(Error::NotFound)));
        assert!(matches!(site.article("2020", "01", "01", "a/../b"), Err(Error::NotFound)));
    }

    #[test]
    fn test_archives_filtered() -> Result<()> {
        let (_dir, site) = fixture();
        let date = ArchiveDate {
            year: Some("2021".to_owned()),
            ..Default::default()
        };
        assert_eq!("2021:</2021/06/15/second>", site.archives(&date, 0)?.body);
        Ok(())
    }

    #[test]
    fn test_archives_rejects_malformed_dates() {
        let (_dir, site) = fixture();
        let date = ArchiveDate {
            year: Some("20x1".to_owned()),
            ..Default::default()
        };
        assert!(matches!(site.archives(&date, 0), Err(Error::NotFound)));
    }

    #[test]
    fn test_archive_date() -> Result<()> {
        let date = ArchiveDate {
            year: Some("2011".to_owned()),
            month: Some("04".to_owned()),
            day: None,
        };
        assert_eq!("2011-04", date.filter()?);
        assert_eq!("/archives/2011/04", date.path());
        assert_eq!("", ArchiveDate::default().filter()?);
        assert_eq!("/archives", ArchiveDate::default().path());
        Ok(())
    }

    #[test]
    fn test_tag() -> Result<()> {
        let (_dir, site) = fixture();
        assert_eq!("rust:[First]", site.tag("Rust")?.body);
        Ok(())
    }

    #[test]
    fn test_rss() -> Result<()> {
        let (_dir, site) = fixture();
        let page = site.rss()?;
        assert_eq!(RSS, page.content_type);
        assert!(page
            .body
            .starts_with("<rss>Blog<item>https://example.org/2021/06/15/second</item>"));
        Ok(())
    }

    #[test]
    fn test_missing_sitemap_template_is_not_found() {
        let (_dir, site) = fixture();
        assert!(matches!(site.sitemap(), Err(Error::NotFound)));
    }

    #[test]
    fn test_atom() -> Result<()> {
        let (_dir, site) = fixture();
        let page = site.atom()?;
        assert_eq!(ATOM, page.content_type);
        assert!(page.body.contains("https://example.org/2020/01/01/first"));
        Ok(())
    }

    #[test]
    fn test_pages() -> Result<()> {
        let (_dir, site) = fixture();
        assert_eq!("About us", site.page("about")?.body);
        assert_eq!("About us", site.page("/about/")?.body);
        assert!(matches!(site.page("contact"), Err(Error::NotFound)));
        assert!(matches!(site.page("../secret"), Err(Error::NotFound)));
        assert_eq!("Nothing here", site.not_found().body);
        Ok(())
    }

    #[test]
    fn test_admin_flush() -> Result<()> {
        let (dir, site) = fixture();
        assert!(site.resolve("2020-01-01-first")?.is_some());
        fs::remove_file(dir.path().join("articles/2020-01-01-first.md")).unwrap();
        assert!(site.resolve("2020-01-01-first")?.is_some());

        assert_eq!(AdminOutcome::Flushed, site.admin("flush")?);
        assert!(site.resolve("2020-01-01-first")?.is_none());
        assert!(matches!(site.admin("reboot"), Err(Error::NotFound)));
        Ok(())
    }
}
