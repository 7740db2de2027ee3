//! Conversions from the crate's types into template [`Value`]s.

use std::collections::HashMap;

use gtmpl_value::Value;
use serde_yaml::Value as Yaml;

use crate::archive::ArchiveEntry;
use crate::article::{scalar_string, Article};
use crate::tag::Tag;

impl From<&Tag> for Value {
    fn from(t: &Tag) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), (&t.name).into());
        m.insert("url".to_owned(), (&t.url).into());
        Value::Object(m)
    }
}

impl From<&ArchiveEntry> for Value {
    fn from(entry: &ArchiveEntry) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), (&entry.name).into());
        m.insert("url".to_owned(), (&entry.url).into());
        Value::Object(m)
    }
}

impl From<&Article> for Value {
    /// Exposes `id`, `slug`, `title`, `date`, `url`, `summary`, `body`,
    /// `tags`, and the raw front-matter as `meta`.
    fn from(a: &Article) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), (&a.id).into());
        m.insert("slug".to_owned(), a.slug().into());
        m.insert("title".to_owned(), a.title().into());
        m.insert(
            "date".to_owned(),
            match a.date() {
                Some(date) => date.format("%Y-%m-%d").to_string().into(),
                None => Value::Nil,
            },
        );
        m.insert("url".to_owned(), a.url.to_string().into());
        m.insert("summary".to_owned(), (&a.summary).into());
        m.insert("body".to_owned(), (&a.body).into());
        m.insert("tags".to_owned(), Value::Array(a.tags().iter().map(Value::from).collect()));
        m.insert(
            "meta".to_owned(),
            Value::Object(a.meta.iter().map(|(k, v)| (k.clone(), yaml(v))).collect()),
        );
        Value::Object(m)
    }
}

/// Converts a slice into a [`Value::Array`] without cloning its items.
pub fn array<'a, T: 'a>(items: impl IntoIterator<Item = &'a T>) -> Value
where
    &'a T: Into<Value>,
{
    Value::Array(items.into_iter().map(Into::into).collect())
}

/// Converts front-matter YAML into a template value.
pub fn yaml(value: &Yaml) -> Value {
    match value {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::from(*b),
        Yaml::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Value::from(i),
            (None, Some(u), _) => Value::from(u),
            (None, None, Some(f)) => Value::from(f),
            _ => Value::Nil,
        },
        Yaml::String(s) => s.into(),
        Yaml::Sequence(items) => Value::Array(items.iter().map(yaml).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .iter()
                .filter_map(|(k, v)| scalar_string(k).map(|k| (k, yaml(v))))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml(&tagged.value),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use url::Url;

    fn object(value: Value) -> HashMap<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_article_value() {
        let raw: Arc<[u8]> = Arc::from("title: Hi\ntags: [a]\ncount: 3\n\nbody".as_bytes());
        let article = Article::parse(
            "2020-01-01-hi",
            raw,
            &Url::parse("https://example.org/").unwrap(),
            "<!-- ~ -->",
        )
        .unwrap();
        let m = object(Value::from(&article));
        assert_eq!("Hi", m["title"].to_string());
        assert_eq!("2020-01-01", m["date"].to_string());
        assert_eq!("https://example.org/2020/01/01/hi", m["url"].to_string());
        assert_eq!("3", object(m["meta"].clone())["count"].to_string());
        match &m["tags"] {
            Value::Array(tags) => assert_eq!(1, tags.len()),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_archive_entries() {
        let entries = vec![ArchiveEntry::from_file_name("2020-01-01-a.md", "md")];
        match array(&entries) {
            Value::Array(items) => {
                let m = object(items[0].clone());
                assert_eq!("/2020/01/01/a", m["url"].to_string());
            }
            other => panic!("expected array, got {:?}", other),
        }
    }
}
