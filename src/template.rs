//! Defines the [`Renderer`] capability and [`TemplateDir`], its `gtmpl`
//! implementation over a directory of template files.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gtmpl_value::Value;

/// Renders a named template with a context.
pub trait Renderer: Send + Sync {
    /// Renders the template called `name`. `context` should be a
    /// [`Value::Object`]; site-wide values are merged into it. Returns
    /// [`Error::NotFound`] when no such template exists.
    fn render(&self, name: &str, context: Value) -> Result<String>;
}

/// Renders Go-style templates loaded from `directory`.
pub struct TemplateDir {
    /// The directory template names are resolved against.
    directory: PathBuf,

    /// Files concatenated in front of every template so their `{{define}}`
    /// blocks are available everywhere.
    partials: Vec<PathBuf>,

    /// Values merged into every context (e.g. `site_name`).
    globals: HashMap<String, Value>,
}

impl TemplateDir {
    pub fn new(
        directory: &Path,
        partials: Vec<PathBuf>,
        globals: HashMap<String, Value>,
    ) -> TemplateDir {
        TemplateDir {
            directory: directory.to_owned(),
            partials,
            globals,
        }
    }

    /// Loads the partials followed by the template file into one source.
    fn source(&self, name: &str) -> Result<String> {
        let path = self.directory.join(name);
        let template = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(name.to_owned()))
            }
            Err(err) => return Err(Error::OpenTemplateFile { path, err }),
        };

        let mut contents = String::new();
        for partial in &self.partials {
            let path = self.directory.join(partial);
            let partial = std::fs::read_to_string(&path)
                .map_err(|err| Error::OpenTemplateFile { path, err })?;
            contents.push_str(&partial);
            contents.push(' ');
        }
        contents.push_str(&template);
        Ok(contents)
    }

    fn with_globals(&self, context: Value) -> Value {
        let mut m = match context {
            Value::Object(m) => m,
            Value::Nil => HashMap::new(),
            other => {
                let mut m = HashMap::new();
                m.insert("item".to_owned(), other);
                m
            }
        };
        for (k, v) in &self.globals {
            m.entry(k.clone()).or_insert_with(|| v.clone());
        }
        Value::Object(m)
    }
}

impl Renderer for TemplateDir {
    fn render(&self, name: &str, context: Value) -> Result<String> {
        validate_name(name)?;
        let source = self.source(name)?;
        gtmpl::template(&source, self.with_globals(context)).map_err(|e| Error::Template {
            name: name.to_owned(),
            message: e.to_string(),
        })
    }
}

/// Template names are relative paths of ASCII alphanumerics, `-`, `_`, and
/// `.`, with no empty or `..` components.
fn validate_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'));
    let valid_parts = name.split('/').all(|part| !part.is_empty() && part != "." && part != "..");
    if valid_chars && valid_parts {
        Ok(())
    } else {
        Err(Error::NotFound(name.to_owned()))
    }
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a rendering operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the named template doesn't exist.
    #[error("template `{0}` not found")]
    NotFound(String),

    /// Returned for I/O problems while opening template files.
    #[error("opening template file '{}': {err}", .path.display())]
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// An error parsing or executing a template.
    #[error("rendering template `{name}`: {message}")]
    Template { name: String, message: String },
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[(&str, &str)], partials: &[&str]) -> (TempDir, TemplateDir) {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        let mut globals = HashMap::new();
        globals.insert("site_name".to_owned(), Value::from("My Blog"));
        let renderer = TemplateDir::new(
            dir.path(),
            partials.iter().map(PathBuf::from).collect(),
            globals,
        );
        (dir, renderer)
    }

    fn context(pairs: &[(&str, &str)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect(),
        )
    }

    #[test]
    fn test_render_with_globals() -> Result<()> {
        let (_dir, renderer) =
            fixture(&[("pages/hello.html", "{{.site_name}}: {{.greeting}}")], &[]);
        assert_eq!(
            "My Blog: hi",
            renderer.render("pages/hello.html", context(&[("greeting", "hi")]))?
        );
        Ok(())
    }

    #[test]
    fn test_context_overrides_globals() -> Result<()> {
        let (_dir, renderer) = fixture(&[("t.html", "{{.site_name}}")], &[]);
        assert_eq!("Other", renderer.render("t.html", context(&[("site_name", "Other")]))?);
        Ok(())
    }

    #[test]
    fn test_partials_are_shared() -> Result<()> {
        let (_dir, renderer) = fixture(
            &[
                ("base.html", r#"{{define "header"}}<h1>{{.site_name}}</h1>{{end}}"#),
                ("pages/index.html", r#"{{template "header" .}}body"#),
            ],
            &["base.html"],
        );
        let out = renderer.render("pages/index.html", Value::Nil)?;
        assert!(out.contains("<h1>My Blog</h1>body"));
        Ok(())
    }

    #[test]
    fn test_missing_template() {
        let (_dir, renderer) = fixture(&[], &[]);
        assert!(matches!(
            renderer.render("pages/nope.html", Value::Nil),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_rejects_traversal() {
        let (_dir, renderer) = fixture(&[], &[]);
        for name in ["../secret", "pages/../../x", "/etc/passwd", "a b"] {
            assert!(matches!(renderer.render(name, Value::Nil), Err(Error::NotFound(_))));
        }
    }
}
