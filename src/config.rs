//! Loads the site configuration from a `site.yaml` project file. The result is
//! an immutable [`Config`] value which is built once at start-up and passed by
//! reference into every stage of the build.

use crate::markdown::{ImageAttributes, Options as MarkdownOptions};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "site.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct FeedSize(usize);
impl Default for FeedSize {
    fn default() -> Self {
        FeedSize(20)
    }
}

fn default_author() -> String {
    String::from("anonymous")
}

fn default_language() -> String {
    String::from("en-us")
}

fn default_excerpt_chars() -> usize {
    300
}

fn default_feed_excerpt_chars() -> usize {
    500
}

fn default_navigation() -> Vec<String> {
    ["home", "projects", "guides"].iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_dir(name: &str) -> PathBuf {
    PathBuf::from(name)
}

/// Identifiers for the client-side commenting widget embedded in post pages.
/// They are passed through verbatim into the post template.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Comments {
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub repo_id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_id: String,
}

#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    byline: String,

    url: Url,

    #[serde(default = "default_author")]
    author: String,

    #[serde(default)]
    posts_per_page: PageSize,

    #[serde(default)]
    base_path: String,

    #[serde(default = "default_language")]
    language: String,

    #[serde(default)]
    feed_items: FeedSize,

    #[serde(default = "default_excerpt_chars")]
    excerpt_chars: usize,

    #[serde(default = "default_feed_excerpt_chars")]
    feed_excerpt_chars: usize,

    #[serde(default = "default_navigation")]
    navigation: Vec<String>,

    #[serde(default)]
    comments: Comments,

    #[serde(default = "content_dir")]
    content_dir: PathBuf,

    #[serde(default = "posts_dir")]
    posts_dir: String,

    #[serde(default = "theme_dir")]
    theme_dir: PathBuf,

    #[serde(default = "static_dir")]
    static_dir: PathBuf,

    #[serde(default = "output_dir")]
    output_dir: PathBuf,

    #[serde(default = "default_true")]
    raw_html: bool,

    #[serde(default = "default_true")]
    image_attributes: bool,

    #[serde(default = "default_true")]
    projects_placeholder: bool,
}

fn content_dir() -> PathBuf {
    default_dir("content")
}

fn posts_dir() -> String {
    String::from("posts")
}

fn theme_dir() -> PathBuf {
    default_dir("theme")
}

fn static_dir() -> PathBuf {
    default_dir("static")
}

fn output_dir() -> PathBuf {
    default_dir("public")
}

/// The immutable configuration for one build.
#[derive(Clone, Debug)]
pub struct Config {
    /// The site title, injected into every page and the feed.
    pub title: String,

    /// The byline shown under the site title and used as the feed
    /// description.
    pub byline: String,

    /// The canonical site URL (e.g., `https://example.github.io`). Feed links
    /// are built as `{site_url}{base_path}{item_url}`.
    pub site_url: Url,

    /// The author used for posts whose front matter omits one.
    pub author: String,

    /// The number of posts per home listing page. Always at least 1.
    pub posts_per_page: usize,

    /// The URL prefix for every emitted link, either empty or starting with a
    /// `/` and never ending with one (e.g., `/neo`).
    pub base_path: String,

    pub language: String,

    /// The number of most recent published posts in the feed.
    pub feed_items: usize,

    pub excerpt_chars: usize,

    pub feed_excerpt_chars: usize,

    /// The navigation keys of the base layout. Each key `k` corresponds to a
    /// `{{nav_k}}` placeholder.
    pub navigation: Vec<String>,

    pub comments: Comments,

    /// The root of the content tree.
    pub content_directory: PathBuf,

    /// The name of the directory under `content_directory` holding posts.
    pub posts_directory_name: String,

    /// The directory holding the templates and the stylesheet.
    pub theme_directory: PathBuf,

    /// The optional tree copied verbatim into the output root.
    pub static_directory: PathBuf,

    /// The output root. It is deleted and recreated on every build.
    pub output_directory: PathBuf,

    /// Whether raw HTML inside markdown passes through to the output.
    pub raw_html: bool,

    /// Whether `![alt](src){k="v"}` expands to an `<img>` tag carrying the
    /// attributes, or the attribute block is dropped.
    pub image_attributes: bool,

    /// Whether to emit a placeholder projects page when the content tree has
    /// no `projects` directory.
    pub projects_placeholder: bool,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a [`PROJECT_FILE`]
    /// and loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a project file. Relative directories in the file are resolved
    /// against the file's own directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let contents = crate::util::read_to_string(path, "project")?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Config::parse(&contents, project_root),
        }
    }

    /// Parses project YAML, resolving relative directories against
    /// `project_root`.
    pub fn parse(yaml: &str, project_root: &Path) -> Result<Config> {
        let project: Project =
            serde_yaml::from_str(yaml).context("Parsing project file")?;
        if project.posts_per_page.0 == 0 {
            bail!("`posts_per_page` must be at least 1");
        }
        Ok(Config {
            title: project.title,
            byline: project.byline,
            site_url: project.url,
            author: project.author,
            posts_per_page: project.posts_per_page.0,
            base_path: normalize_base_path(&project.base_path),
            language: project.language,
            feed_items: project.feed_items.0,
            excerpt_chars: project.excerpt_chars,
            feed_excerpt_chars: project.feed_excerpt_chars,
            navigation: project.navigation,
            comments: project.comments,
            content_directory: project_root.join(project.content_dir),
            posts_directory_name: project.posts_dir,
            theme_directory: project_root.join(project.theme_dir),
            static_directory: project_root.join(project.static_dir),
            output_directory: project_root.join(project.output_dir),
            raw_html: project.raw_html,
            image_attributes: project.image_attributes,
            projects_placeholder: project.projects_placeholder,
        })
    }

    /// Replaces the output root, e.g. from a command-line override.
    pub fn with_output_directory(mut self, output_directory: PathBuf) -> Config {
        self.output_directory = output_directory;
        self
    }

    pub fn posts_directory(&self) -> PathBuf {
        self.content_directory.join(&self.posts_directory_name)
    }

    /// The options for converting content bodies to HTML.
    pub fn markdown_options(&self) -> MarkdownOptions<'_> {
        MarkdownOptions {
            base_path: &self.base_path,
            raw_html: self.raw_html,
            image_attributes: match self.image_attributes {
                true => ImageAttributes::Expand,
                false => ImageAttributes::Strip,
            },
        }
    }

    /// Prefixes a site-relative path (e.g., `/posts/2025/foo/`) with the base
    /// path.
    pub fn href(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }

    /// Builds an absolute URL for a site-relative path.
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.site_url.as_str().trim_end_matches('/'),
            self.base_path,
            path
        )
    }
}

fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    match trimmed.is_empty() {
        true => String::new(),
        false => format!("/{}", trimmed),
    }
}
