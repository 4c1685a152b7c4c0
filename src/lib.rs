//! The library code for the `yearbook` static site generator. A build runs
//! the following steps in order, each to completion before the next begins:
//!
//! 1. Discovering posts and pages under the content directory
//!    ([`crate::discover`])
//! 2. Loading each one: splitting off and normalizing its front matter
//!    ([`crate::frontmatter`]) and rendering its markdown body
//!    ([`crate::markdown`]) into an [`crate::item::Item`]
//! 3. Indexing the posts ([`crate::index`]): the published posts newest
//!    first, the tag buckets, and each post's neighbours
//! 4. Rendering and writing every page ([`crate::render`],
//!    [`crate::build`]) and the RSS feed ([`crate::feed`])
//!
//! Posts are bucketed by year on disk (`posts/2025/foo.md` or
//! `posts/2025/foo/index.md`) and published at `/posts/2025/foo/`. Every other
//! content directory is a section of static pages. Drafts are rendered to their
//! own URL but left out of every listing and the feed.
//!
//! Pages are rendered with plain `{{name}}` templates ([`crate::template`])
//! from a theme directory, and every link is prefixed with the configured base
//! path so the site can be served from a sub-directory.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod discover;
pub mod feed;
pub mod frontmatter;
pub mod index;
pub mod item;
pub mod markdown;
pub mod render;
pub mod template;
pub mod util;
