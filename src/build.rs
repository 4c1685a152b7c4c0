//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: discovering and loading the posts
//! ([`crate::discover`], [`crate::item`]), indexing them ([`crate::index`]),
//! rendering post, home, tag, and static pages ([`crate::render`]), copying
//! co-located assets and the static tree, and generating the RSS feed.

use crate::config::Config;
use crate::discover::{self, discover_pages, discover_posts};
use crate::feed::{self, write_feed, FEED_PATH};
use crate::index::ContentIndex;
use crate::item::{self, load_all, Item};
use crate::render::{paginate, tag_url, Renderer};
use crate::template::{self, Theme};
use crate::util::is_document;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The content directory whose absence triggers the placeholder page.
const PROJECTS: &str = "projects";

/// Builds the site described by `config` into `config.output_directory`.
/// `build_time` stands in for missing post dates and becomes the feed's
/// `lastBuildDate`, so two builds with the same `build_time` over the same
/// input produce identical trees.
///
/// Any failure aborts the build, leaving the output directory in whatever
/// state it was in.
pub fn build_site(config: &Config, build_time: NaiveDateTime) -> Result<()> {
    // Load the theme before touching the output so a missing template fails
    // without destroying the previous build.
    let theme = Theme::load(&config.theme_directory)?;
    let renderer = Renderer::new(config, &theme);
    let out = config.output_directory.as_path();

    rmdir(out)?;
    mkdir(out)?;

    let posts = load_all(discover_posts(&config.posts_directory())?, config, build_time)?;
    let index = ContentIndex::build(&posts);
    log::info!(
        "found {} published posts, {} drafts",
        index.published_items().len(),
        index.draft_count()
    );

    for post in index.all_items() {
        let dir = output_directory(out, post.url());
        write_page(&dir, &renderer.post(post, &index.neighbors(post)))?;
        copy_assets(post, &dir)?;
        log::info!("generated {}", post.url());
    }

    let pages = paginate(index.published_items(), config.posts_per_page);
    for page in &pages {
        write_page(&output_directory(out, &page.url()), &renderer.home(page))?;
    }
    log::info!("generated {} home pages", pages.len());

    let mut tag_pages = 0;
    for (tag, tagged) in index.tag_index() {
        match tag_url(tag) {
            Some(url) => {
                write_page(&output_directory(out, &url), &renderer.tag(tag, tagged))?;
                tag_pages += 1;
            }
            None => log::warn!("skipping tag page for `{}`: not a valid path segment", tag),
        }
    }
    log::info!("generated {} tag pages", tag_pages);

    build_pages(config, &renderer, build_time)?;

    copy_file(&theme.stylesheet, &out.join("css").join("style.css"))?;
    if config.static_directory.is_dir() {
        copy_dir(&config.static_directory, out)?;
    }

    let feed_path = out.join(FEED_PATH.trim_start_matches('/'));
    let file = File::create(&feed_path).map_err(|err| Error::Io {
        path: feed_path.clone(),
        err,
    })?;
    write_feed(config, index.published_items(), build_time, BufWriter::new(file))?;
    log::info!("generated {}", FEED_PATH);

    Ok(())
}

// Renders the pages of every non-post content directory, copies each
// directory's non-document files alongside them, and fills in the projects
// placeholder if there is no projects content.
fn build_pages(config: &Config, renderer: &Renderer, build_time: NaiveDateTime) -> Result<()> {
    let out = config.output_directory.as_path();
    let sources = discover_pages(&config.content_directory, &config.posts_directory_name)?;
    let mut sections = BTreeSet::new();
    for source in sources {
        let item = Item::load(source, config, build_time)?;
        let section = item.source.section.clone().unwrap_or_default();
        let active = match config.navigation.contains(&section) && section != "home" {
            true => Some(section.as_str()),
            false => None,
        };
        write_page(
            &output_directory(out, item.url()),
            &renderer.page(&item.title, &item.html, active),
        )?;
        log::info!("generated {}", item.url());
        sections.insert((section, item.source.directory));
    }

    for (section, dir) in &sections {
        let dst = out.join(section);
        for path in files(dir)? {
            if !is_document(&path) {
                copy_into(&path, &dst)?;
            }
        }
    }

    if config.projects_placeholder && !config.content_directory.join(PROJECTS).exists() {
        write_page(
            &out.join(PROJECTS),
            &renderer.page("Projects", "<p>Projects coming soon.</p>", Some(PROJECTS)),
        )?;
        log::info!("generated /{}/ placeholder", PROJECTS);
    }
    Ok(())
}

// Copies the files in the post's directory that belong to it.
fn copy_assets(post: &Item, dst: &Path) -> Result<()> {
    for path in files(&post.source.directory)? {
        if post.source.owns_asset(&path) {
            copy_into(&path, dst)?;
        }
    }
    Ok(())
}

// Maps a site-relative URL onto a directory under `out`.
fn output_directory(out: &Path, url: &str) -> PathBuf {
    url.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(out.to_owned(), |dir, segment| dir.join(segment))
}

fn write_page(dir: &Path, html: &str) -> Result<()> {
    mkdir(dir)?;
    let path = dir.join("index.html");
    std::fs::write(&path, html).map_err(|err| Error::Io { path, err })
}

// Lists the regular files directly inside `dir`, in file name order.
fn files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(discover::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn copy_into(src: &Path, dst_dir: &Path) -> Result<()> {
    match src.file_name() {
        Some(name) => copy_file(src, &dst_dir.join(name)),
        None => Ok(()),
    }
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        mkdir(parent)?;
    }
    log::debug!("copying {} to {}", src.display(), dst.display());
    std::fs::copy(src, dst).map_err(|err| Error::Copy {
        src: src.to_owned(),
        dst: dst.to_owned(),
        err,
    })?;
    Ok(())
}

// Recursively copies the contents of `src` into `dst`, merging with whatever
// `dst` already holds.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(discover::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| discover::Error::InvalidFileName(entry.path().to_owned()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            mkdir(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn mkdir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| Error::Io {
        path: dir.to_owned(),
        err,
    })
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// Represents the result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can come from discovery,
/// loading items, loading templates, cleaning the output directory, writing
/// pages, copying assets, and writing the feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for errors listing content directories.
    #[error(transparent)]
    Discover(#[from] discover::Error),

    /// Returned for errors reading or parsing content documents.
    #[error(transparent)]
    Item(#[from] item::Error),

    /// Returned when a template is missing or unreadable.
    #[error(transparent)]
    Template(#[from] template::Error),

    /// Returned for errors creating the feed.
    #[error("writing feed: {0}")]
    Feed(#[from] feed::Error),

    /// Returned for I/O problems while cleaning the output directory.
    #[error("cleaning directory `{}`: {err}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for I/O problems copying assets.
    #[error("copying `{}` to `{}`: {err}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned for other I/O problems writing output.
    #[error("writing `{}`: {err}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}
