//! Builds the read-only [`ContentIndex`] over a build's posts: the published
//! posts in reverse chronological order, the tag buckets, and each post's
//! neighbours.

use crate::item::Item;
use std::collections::BTreeMap;
use std::ptr;

/// A view over every post of one build.
pub struct ContentIndex<'a> {
    all: &'a [Item],
    published: Vec<&'a Item>,
    tags: BTreeMap<&'a str, Vec<&'a Item>>,
}

/// The published posts either side of a post. `prev` is the newer one, `next`
/// the older one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Neighbors<'a> {
    pub prev: Option<&'a Item>,
    pub next: Option<&'a Item>,
}

impl<'a> ContentIndex<'a> {
    /// Indexes `items`. Drafts are left out of the published list and the tag
    /// buckets. Posts with equal dates keep their relative order from `items`.
    pub fn build(items: &'a [Item]) -> ContentIndex<'a> {
        let mut published: Vec<&Item> = items.iter().filter(|item| !item.draft).collect();
        published.sort_by(|a, b| b.date.cmp(&a.date));

        let mut tags: BTreeMap<&str, Vec<&Item>> = BTreeMap::new();
        for &post in &published {
            for tag in &post.tags {
                let bucket = tags.entry(tag.as_str()).or_default();
                // a post listing the same tag twice lands in the bucket once
                if !bucket.iter().any(|p| ptr::eq(*p, post)) {
                    bucket.push(post);
                }
            }
        }

        ContentIndex {
            all: items,
            published,
            tags,
        }
    }

    /// Every post, drafts included, in discovery order.
    pub fn all_items(&self) -> &'a [Item] {
        self.all
    }

    /// The published posts, newest first.
    pub fn published_items(&self) -> &[&'a Item] {
        &self.published
    }

    pub fn draft_count(&self) -> usize {
        self.all.len() - self.published.len()
    }

    /// Maps each tag to its published posts, newest first.
    pub fn tag_index(&self) -> &BTreeMap<&'a str, Vec<&'a Item>> {
        &self.tags
    }

    /// Finds the neighbours of `item` among the published posts. Drafts, and
    /// items that aren't part of this index, have none.
    pub fn neighbors(&self, item: &Item) -> Neighbors<'a> {
        if item.draft {
            return Neighbors::default();
        }
        match self.published.iter().position(|p| ptr::eq(*p, item)) {
            None => Neighbors::default(),
            Some(i) => Neighbors {
                prev: i.checked_sub(1).map(|j| self.published[j]),
                next: self.published.get(i + 1).copied(),
            },
        }
    }
}
