//! Minimal `{{name}}` templates and the [`Theme`] that bundles them.
//!
//! Rendering replaces every placeholder whose name is in the [`Context`] with
//! its value, verbatim. The substitution itself never escapes anything, so a
//! [`Context`] distinguishes values that are already HTML
//! ([`Context::html`]) from plain text that must be escaped on the way in
//! ([`Context::text`]). Placeholders without a value are left untouched.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

/// The values for one template rendering.
#[derive(Default)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value that is already HTML.
    pub fn html(mut self, name: &str, value: impl Into<String>) -> Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    /// Inserts plain text, escaping it.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_owned(), escape(value));
        self
    }
}

/// Escapes text for use in HTML content or a quoted attribute.
pub fn escape(s: &str) -> String {
    html_escape::encode_quoted_attribute(s).into_owned()
}

#[derive(Clone, Debug)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Template { text: text.into() }
    }

    /// Loads a template file.
    pub fn load(path: &Path) -> Result<Template> {
        if !path.is_file() {
            return Err(Error::Missing {
                path: path.to_owned(),
            });
        }
        std::fs::read_to_string(path)
            .map(Template::new)
            .map_err(|err| Error::Read {
                path: path.to_owned(),
                err,
            })
    }

    /// Substitutes `context` into the template in a single pass, so values
    /// that happen to contain `{{...}}` are never substituted again.
    pub fn render(&self, context: &Context) -> String {
        PLACEHOLDER
            .replace_all(&self.text, |caps: &Captures| {
                match context.values.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_owned(),
                }
            })
            .into_owned()
    }
}

/// The templates and stylesheet every build needs.
pub struct Theme {
    /// The layout shared by every page.
    pub base: Template,
    pub post: Template,
    pub home: Template,
    pub page: Template,

    /// The stylesheet, copied to `css/style.css`.
    pub stylesheet: PathBuf,
}

impl Theme {
    /// Loads `base.html`, `post.html`, `home.html`, and `page.html` from
    /// `dir`, failing if any is missing.
    pub fn load(dir: &Path) -> Result<Theme> {
        Ok(Theme {
            base: Template::load(&dir.join("base.html"))?,
            post: Template::load(&dir.join("post.html"))?,
            home: Template::load(&dir.join("home.html"))?,
            page: Template::load(&dir.join("page.html"))?,
            stylesheet: dir.join("style.css"),
        })
    }
}

/// Represents the result of a template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading templates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a template file doesn't exist.
    #[error("missing template `{}`", path.display())]
    Missing { path: PathBuf },

    /// Returned when a template file exists but can't be read.
    #[error("reading template `{}`: {err}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_render() {
        let template = Template::new("<title>{{title}}</title>{{content}}{{unknown}}");
        let context = Context::new()
            .text("title", "Tom & <Jerry>")
            .html("content", "<p>{{title}}</p>");
        assert_eq!(
            "<title>Tom &amp; &lt;Jerry&gt;</title><p>{{title}}</p>{{unknown}}",
            template.render(&context)
        );
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = Template::new("{{x}}-{{x}}");
        assert_eq!("1-1", template.render(&Context::new().html("x", "1")));
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        match Theme::load(dir.path()) {
            Err(Error::Missing { path }) => assert_eq!(dir.path().join("base.html"), path),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("loaded a theme from an empty directory"),
        }
    }
}
