//! Defines the [`Tag`] type, which represents an [`crate::article::Article`]
//! tag.

use std::hash::{Hash, Hasher};

/// Base path for tag pages.
const TAG_PATH: &str = "/tag/";

/// Represents an article tag. Tags are slugified when parsed from
/// front-matter so e.g., `macOS` and `MacOS` resolve to the same value, and
/// also so the name can be dropped into a URL path.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag's slugified name.
    pub name: String,

    /// The site-relative URL for the tag's page, i.e. `/tag/{name}`.
    pub url: String,
}

impl Tag {
    /// Creates a tag from a raw (unslugified) name.
    pub fn new(raw: &str) -> Tag {
        let name = slug::slugify(raw);
        let url = format!("{}{}", TAG_PATH, name);
        Tag { name, url }
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `name`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}
