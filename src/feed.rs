//! Support for creating the RSS 2.0 feed from the published posts.

use crate::config::Config;
use crate::item::Item;
use crate::markdown::excerpt;
use chrono::NaiveDateTime;
use rss::extension::atom::{AtomExtension, Link};
use rss::validation::Validate;
use rss::{Channel, ChannelBuilder, GuidBuilder, ItemBuilder};
use std::io::Write;

/// The feed's path relative to the output root.
pub const FEED_PATH: &str = "/feed.xml";

/// Creates a feed over the most recent `config.feed_items` of `posts` (which
/// must be sorted newest first) and writes it to `w`. `build_time` becomes the
/// channel's `lastBuildDate`. `w` is flushed before returning, so buffered
/// write errors are reported too.
pub fn write_feed<W: Write>(
    config: &Config,
    posts: &[&Item],
    build_time: NaiveDateTime,
    w: W,
) -> Result<()> {
    let channel = feed(config, posts, build_time);
    channel
        .validate()
        .map_err(|e| Error::Validation(e.to_string()))?;
    channel.write_to(w)?.flush()?;
    Ok(())
}

fn feed(config: &Config, posts: &[&Item], build_time: NaiveDateTime) -> Channel {
    let mut self_link = Link::default();
    self_link.set_href(config.absolute_url(FEED_PATH));
    self_link.set_rel("self");
    self_link.set_mime_type(Some(String::from("application/rss+xml")));
    let mut atom = AtomExtension::default();
    atom.set_links(vec![self_link]);

    ChannelBuilder::default()
        .title(config.title.as_str())
        .link(config.absolute_url("/"))
        .description(config.byline.as_str())
        .language(Some(config.language.clone()))
        .last_build_date(Some(
            build_time.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        ))
        .atom_ext(Some(atom))
        .items(feed_items(config, posts))
        .build()
}

fn feed_items(config: &Config, posts: &[&Item]) -> Vec<rss::Item> {
    posts
        .iter()
        .take(config.feed_items)
        .map(|post| {
            let link = config.absolute_url(post.url());
            ItemBuilder::default()
                .title(Some(post.title.clone()))
                .link(Some(link.clone()))
                .guid(Some(
                    GuidBuilder::default().permalink(true).value(link).build(),
                ))
                .pub_date(Some(
                    post.date.format("%a, %d %b %Y 00:00:00 GMT").to_string(),
                ))
                .description(Some(excerpt(&post.html, config.feed_excerpt_chars)))
                .build()
        })
        .collect()
}

/// Represents the result of a feed operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating the feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the generated channel isn't valid RSS.
    #[error("invalid feed: {0}")]
    Validation(String),

    /// Returned when the feed can't be serialized or written.
    #[error(transparent)]
    Rss(#[from] rss::Error),

    /// Returned when flushing the feed fails.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
