//! Helpers for turning article identifiers into file names and URLs.
//!
//! An identifier is the file name of an article less its extension, e.g.
//! `2011-04-16-hello-world`. Its URL path replaces the first three hyphens
//! with slashes, giving `2011/04/16/hello-world`.

use url::{ParseError, Url};

/// Extensions stripped from identifiers in addition to the configured one.
pub const KNOWN_EXTENSIONS: &[&str] = &["md", "txt"];

/// Number of hyphens (year, month, day) that become path separators.
const DATE_SEPARATORS: usize = 3;

/// Strips one trailing known extension (or `extension`, the configured one)
/// from `name`. Names without a recognized extension come back unchanged.
pub fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    let configured = std::iter::once(extension).filter(|e| !e.is_empty());
    for ext in configured.chain(KNOWN_EXTENSIONS.iter().copied()) {
        if let Some(stem) = name.strip_suffix(ext).and_then(|s| s.strip_suffix('.')) {
            if !stem.is_empty() {
                return stem;
            }
        }
    }
    name
}

/// Converts an identifier into its URL path (without a leading slash).
pub fn id_path(id: &str) -> String {
    id.replacen('-', "/", DATE_SEPARATORS)
}

/// The site-relative URL for an identifier, e.g. `/2011/04/16/hello-world`.
pub fn relative_url(id: &str) -> String {
    format!("/{}", id_path(id))
}

/// The canonical URL for an identifier under `site_url`.
///
/// NOTE: `site_url` must end in a trailing slash. Without it, [`Url::join`]
/// treats the last path component as a file name and replaces it.
pub fn article_url(site_url: &Url, id: &str) -> Result<Url, ParseError> {
    site_url.join(&id_path(id))
}

/// Appends a trailing slash to the path of `url` if it lacks one.
pub fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strip_known_extensions() {
        assert_eq!("2020-01-01-a", strip_extension("2020-01-01-a.md", "md"));
        assert_eq!("2020-01-01-a", strip_extension("2020-01-01-a.txt", "md"));
    }

    #[test]
    fn test_strip_configured_extension() {
        assert_eq!("2020-01-01-a", strip_extension("2020-01-01-a.markdown", "markdown"));
    }

    #[test]
    fn test_strip_only_suffix() {
        // a slug that merely contains `md` must not be mangled
        assert_eq!("2020-01-01-mdtxt", strip_extension("2020-01-01-mdtxt", "md"));
        assert_eq!("2020-01-01-a.html", strip_extension("2020-01-01-a.html", "md"));
        assert_eq!(".md", strip_extension(".md", "md"));
    }

    #[test]
    fn test_id_path() {
        assert_eq!("2020/01/01/a", id_path("2020-01-01-a"));
        assert_eq!("2020/01/01/hello-big-world", id_path("2020-01-01-hello-big-world"));
        assert_eq!("about", id_path("about"));
    }

    #[test]
    fn test_relative_url() {
        assert_eq!("/2020/01/01/a", relative_url("2020-01-01-a"));
    }

    #[test]
    fn test_article_url() -> Result<(), ParseError> {
        let site = with_trailing_slash(Url::parse("https://example.org/blog")?);
        assert_eq!(
            "https://example.org/blog/2020/01/01/a",
            article_url(&site, "2020-01-01-a")?.as_str(),
        );
        Ok(())
    }
}
