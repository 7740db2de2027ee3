//! Defines the [`Article`] type and the logic for parsing one from the raw
//! bytes of a content file.
//!
//! A content file is structured as follows:
//!
//! 1. YAML front-matter (optional)
//! 2. A blank line
//! 3. Markdown body, optionally containing the summary marker
//!
//! For example:
//!
//! ```md
//! title: Hello, world!
//! tags: [greet]
//!
//! # Hello
//!
//! <!-- ~ -->
//!
//! World
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_yaml::Value as Yaml;
use url::Url;

use crate::markdown;
use crate::tag::Tag;
use crate::url::article_url;

/// Separates front-matter from body.
const SEPARATOR: &str = "\n\n";

/// Length of the `YYYY-MM-DD` prefix of an identifier.
const DATE_PREFIX_LEN: usize = 10;

/// The parsed front-matter of an article: a flat mapping of string keys to
/// YAML values.
pub type FrontMatter = BTreeMap<String, Yaml>;

/// An article resolved from a content file. Articles are immutable once
/// parsed.
#[derive(Clone, Debug)]
pub struct Article {
    /// The identifier, e.g. `2011-04-16-hello-world`.
    pub id: String,

    /// The file contents the article was parsed from.
    pub raw: Arc<[u8]>,

    /// The front-matter block.
    pub meta: FrontMatter,

    /// HTML for the body text preceding the summary marker, or for the whole
    /// body when there is no marker.
    pub summary: String,

    /// HTML for the whole body.
    pub body: String,

    /// The canonical URL.
    pub url: Url,
}

impl Article {
    /// Parses an article from its identifier and raw file contents.
    ///
    /// * `site_url` is the prefix for canonical URLs and should end in a
    ///   trailing slash.
    /// * `summary_marker` delimits the summary within the body.
    pub fn parse(
        id: &str,
        raw: Arc<[u8]>,
        site_url: &Url,
        summary_marker: &str,
    ) -> Result<Article> {
        let text = std::str::from_utf8(&raw)?;
        let (head, body) = split(text);
        let meta = parse_front_matter(head)?;
        let summary = summary(body, summary_marker);

        Ok(Article {
            id: id.to_owned(),
            url: article_url(site_url, id)?,
            meta,
            summary: markdown::to_html(summary),
            body: markdown::to_html(body),
            raw,
        })
    }

    /// The title from the `title` (or `Title`) front-matter key, falling back
    /// to the slug.
    pub fn title(&self) -> String {
        self.meta_str(&["title", "Title"])
            .unwrap_or_else(|| self.slug().to_owned())
    }

    /// The identifier less its date prefix.
    pub fn slug(&self) -> &str {
        match self.date() {
            Some(_) => self.id[DATE_PREFIX_LEN..].trim_start_matches('-'),
            None => &self.id,
        }
    }

    /// The publication date encoded in the identifier prefix, if it is one.
    pub fn date(&self) -> Option<NaiveDate> {
        let prefix = self.id.get(..DATE_PREFIX_LEN)?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }

    /// Tags from the `tags` (or `Tags`) front-matter key. Both a YAML list and
    /// a comma-separated string are accepted.
    pub fn tags(&self) -> Vec<Tag> {
        let value = ["tags", "Tags"].iter().find_map(|k| self.meta.get(*k));
        let mut tags: Vec<Tag> = match value {
            Some(Yaml::Sequence(items)) => items
                .iter()
                .filter_map(scalar_string)
                .map(|s| Tag::new(&s))
                .collect(),
            Some(Yaml::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Tag::new)
                .collect(),
            _ => Vec::new(),
        };
        let mut seen = std::collections::HashSet::new();
        tags.retain(|t| !t.name.is_empty() && seen.insert(t.name.clone()));
        tags
    }

    /// Whether the article carries `tag` (already slugified).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t.name == tag)
    }

    fn meta_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.meta.get(*k)).and_then(scalar_string)
    }
}

/// Splits `text` on the first blank line. With no blank line, the whole text
/// is front-matter and the body is empty.
fn split(text: &str) -> (&str, &str) {
    text.split_once(SEPARATOR).unwrap_or((text, ""))
}

fn summary<'a>(body: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return body;
    }
    body.split_once(marker).map_or(body, |(before, _)| before)
}

fn parse_front_matter(head: &str) -> Result<FrontMatter> {
    if head.trim().is_empty() {
        return Ok(FrontMatter::new());
    }
    match serde_yaml::from_str::<Yaml>(head)? {
        Yaml::Null => Ok(FrontMatter::new()),
        Yaml::Mapping(mapping) => mapping
            .into_iter()
            .map(|(k, v)| match scalar_string(&k) {
                Some(key) => Ok((key, v)),
                None => Err(Error::FrontMatterKey),
            })
            .collect(),
        _ => Err(Error::FrontMatterNotMapping),
    }
}

/// Renders a scalar YAML value as a string. Collections yield `None`.
pub(crate) fn scalar_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Represents the result of an [`Article`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing an [`Article`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the file contents aren't valid UTF-8.
    #[error("article is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Returned when there was an error parsing the front-matter as YAML.
    #[error("parsing front-matter: {0}")]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned when the front-matter is valid YAML but not a mapping.
    #[error("front-matter must be a mapping")]
    FrontMatterNotMapping,

    /// Returned when a front-matter key isn't a scalar.
    #[error("front-matter keys must be scalars")]
    FrontMatterKey,

    /// Returned when the canonical URL can't be built.
    #[error("building article URL: {0}")]
    UrlParse(#[from] url::ParseError),
}
