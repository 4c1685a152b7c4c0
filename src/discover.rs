//! Finds content items on disk. Discovery only classifies documents and
//! derives their slugs and URLs; reading them is left to [`crate::item`].
//!
//! Posts live under the posts directory:
//!
//! ```text
//! posts/
//!   2025/                  <- year bucket (all-numeric name)
//!     nes-fpga/index.md    <- bundle post, /posts/2025/nes-fpga/
//!     nes-fpga/die.webp
//!     quick-note.md        <- loose post, /posts/2025/quick-note/
//!     quick-note-1.png
//!   old-post/index.md      <- legacy bundle post, /posts/old-post/
//! ```
//!
//! Pages live in any other directory of the content root:
//!
//! ```text
//! guides/
//!   _index.md              <- section index, /guides/
//!   setup.md               <- section page, /guides/setup/
//! ```
//!
//! Entries are listed in file name order so that discovery order is the same
//! on every platform.

use crate::util::is_document;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The document marking a directory as a bundle post.
pub const BUNDLE_INDEX: &str = "index.md";

/// The document marking a directory as a section with an index page.
pub const SECTION_INDEX: &str = "_index.md";

/// How a content item is laid out on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// A post directory holding an `index.md`, either inside a year bucket or
    /// directly in the posts directory (legacy, no year). Every other file in
    /// the directory belongs to the post.
    Bundle,

    /// A post document directly inside a year bucket. Only the bucket's files
    /// whose names start with the post's slug belong to it.
    Loose,

    /// The `_index.md` of a content section.
    SectionIndex,

    /// Any other document directly inside a content section.
    SectionPage,
}

/// A discovered content item whose document hasn't been read yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub layout: Layout,

    /// The backing document.
    pub document: PathBuf,

    /// The directory holding the item's co-located assets.
    pub directory: PathBuf,

    pub slug: String,

    /// The year bucket, for posts that have one.
    pub year: Option<String>,

    /// The content directory name, for pages.
    pub section: Option<String>,

    /// The site-relative URL, always with leading and trailing slashes.
    pub url: String,
}

impl Source {
    pub fn is_post(&self) -> bool {
        matches!(self.layout, Layout::Bundle | Layout::Loose)
    }

    /// Returns true if `path` is a co-located asset of this item. Documents
    /// are never assets; for loose posts the file name must also start with
    /// the slug, which keeps the files of neighbouring loose posts apart.
    pub fn owns_asset(&self, path: &Path) -> bool {
        if is_document(path) {
            return false;
        }
        match self.layout {
            Layout::Loose => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map_or(false, |stem| stem.starts_with(&self.slug)),
            _ => true,
        }
    }
}

/// Discovers every post under `posts_directory`. A missing posts directory
/// holds no posts.
pub fn discover_posts(posts_directory: &Path) -> Result<Vec<Source>> {
    let mut sources = Vec::new();
    if !posts_directory.is_dir() {
        log::warn!("posts directory `{}` not found", posts_directory.display());
        return Ok(sources);
    }

    for entry in list(posts_directory)? {
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = file_name(entry.path())?;
        if is_year(&name) {
            discover_year(entry.path(), &name, &mut sources)?;
        } else if let Some(source) = bundle(entry.path(), &name, None)? {
            sources.push(source);
        } else {
            log::debug!("skipping `{}`: no {}", entry.path().display(), BUNDLE_INDEX);
        }
    }
    Ok(sources)
}

fn discover_year(dir: &Path, year: &str, sources: &mut Vec<Source>) -> Result<()> {
    for entry in list(dir)? {
        let path = entry.path();
        if entry.file_type().is_dir() {
            let slug = file_name(path)?;
            match bundle(path, &slug, Some(year))? {
                Some(source) => sources.push(source),
                None => log::debug!("skipping `{}`: no {}", path.display(), BUNDLE_INDEX),
            }
        } else if entry.file_type().is_file() && is_document(path) {
            let slug = file_stem(path)?;
            sources.push(Source {
                layout: Layout::Loose,
                document: path.to_owned(),
                directory: dir.to_owned(),
                url: format!("/posts/{}/{}/", year, slug),
                year: Some(year.to_owned()),
                section: None,
                slug,
            });
        }
    }
    Ok(())
}

fn bundle(dir: &Path, slug: &str, year: Option<&str>) -> Result<Option<Source>> {
    let document = dir.join(BUNDLE_INDEX);
    if !document.is_file() {
        return Ok(None);
    }
    Ok(Some(Source {
        layout: Layout::Bundle,
        document,
        directory: dir.to_owned(),
        slug: slug.to_owned(),
        url: match year {
            Some(year) => format!("/posts/{}/{}/", year, slug),
            None => format!("/posts/{}/", slug),
        },
        year: year.map(str::to_owned),
        section: None,
    }))
}

/// Discovers the pages in every directory of `content_directory` other than
/// the one named `posts_directory_name`.
pub fn discover_pages(content_directory: &Path, posts_directory_name: &str) -> Result<Vec<Source>> {
    let mut sources = Vec::new();
    if !content_directory.is_dir() {
        return Ok(sources);
    }

    for entry in list(content_directory)? {
        if !entry.file_type().is_dir() {
            continue;
        }
        let section = file_name(entry.path())?;
        if section == posts_directory_name {
            continue;
        }
        discover_section(entry.path(), &section, &mut sources)?;
    }
    Ok(sources)
}

fn discover_section(dir: &Path, section: &str, sources: &mut Vec<Source>) -> Result<()> {
    let index = dir.join(SECTION_INDEX);
    if index.is_file() {
        sources.push(Source {
            layout: Layout::SectionIndex,
            document: index,
            directory: dir.to_owned(),
            slug: section.to_owned(),
            year: None,
            section: Some(section.to_owned()),
            url: format!("/{}/", section),
        });
    }

    for entry in list(dir)? {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_document(path) {
            continue;
        }
        let slug = file_stem(path)?;
        if slug.starts_with('_') {
            continue;
        }
        sources.push(Source {
            layout: Layout::SectionPage,
            document: path.to_owned(),
            directory: dir.to_owned(),
            url: format!("/{}/{}/", section, slug),
            year: None,
            section: Some(section.to_owned()),
            slug,
        });
    }
    Ok(())
}

// Lists the immediate children of `dir` in file name order.
fn list(dir: &Path) -> Result<Vec<walkdir::DirEntry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn is_year(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))
}

/// Represents the result of a discovery operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error discovering content.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for I/O errors listing directories.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned when a file name isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),
}
