//! Defines [`Item`], a post or page loaded from disk: its discovered
//! [`Source`], its normalized front matter, and its rendered body.

use crate::config::Config;
use crate::discover::{Layout, Source};
use crate::frontmatter::{self, display_date, Defaults};
use crate::markdown;
use crate::util::title_case;
use chrono::NaiveDateTime;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Item {
    pub source: Source,
    pub title: String,
    pub author: String,

    /// The normalized, timezone-naive date. Items without a usable date carry
    /// the build timestamp.
    pub date: NaiveDateTime,

    /// Tags in declaration order.
    pub tags: Vec<String>,

    /// Drafts get their own page but are left out of listings, tags, and the
    /// feed.
    pub draft: bool,

    /// The markdown body.
    pub body: String,

    /// The body rendered to HTML.
    pub html: String,
}

impl Item {
    /// Reads, extracts, and renders the item behind `source`. `now` is the
    /// build timestamp.
    pub fn load(source: Source, config: &Config, now: NaiveDateTime) -> Result<Item> {
        let contents = std::fs::read_to_string(&source.document).map_err(|err| Error::Read {
            path: source.document.clone(),
            err,
        })?;
        let doc = frontmatter::extract(&contents);

        let default_title = match source.layout {
            Layout::Bundle | Layout::Loose => source.slug.clone(),
            Layout::SectionIndex => title_case(&source.slug),
            Layout::SectionPage => title_case(&source.slug.replace('_', " ")),
        };

        let mut front_matter = doc.front_matter;
        // Only posts are dated; a page's date never affects the build.
        if !source.is_post() {
            front_matter.date = frontmatter::DateValue::Other;
        }

        let meta = front_matter
            .into_metadata(&Defaults {
                title: &default_title,
                author: &config.author,
                now,
            })
            .map_err(|err| Error::FrontMatter {
                path: source.document.clone(),
                err,
            })?;

        let html = markdown::to_html(doc.body, &config.markdown_options());
        Ok(Item {
            title: meta.title,
            author: meta.author,
            date: meta.date,
            tags: meta.tags,
            draft: meta.draft,
            body: doc.body.to_owned(),
            html,
            source,
        })
    }

    pub fn slug(&self) -> &str {
        &self.source.slug
    }

    pub fn url(&self) -> &str {
        &self.source.url
    }

    pub fn display_date(&self) -> String {
        display_date(&self.date)
    }
}

/// Loads every source, failing on the first item that can't be loaded.
pub fn load_all(sources: Vec<Source>, config: &Config, now: NaiveDateTime) -> Result<Vec<Item>> {
    sources
        .into_iter()
        .map(|source| Item::load(source, config, now))
        .collect()
}

/// Represents the result of loading an [`Item`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading an [`Item`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the document can't be read.
    #[error("reading `{}`: {err}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the front matter can't be normalized.
    #[error("parsing front matter of `{}`: {err}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        err: frontmatter::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    fn config() -> Config {
        Config::parse(
            "title: Site\nurl: https://example.org\nauthor: nand2mario\nbase_path: /neo\n",
            Path::new("/site"),
        )
        .unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 4).unwrap().and_hms_opt(5, 6, 7).unwrap()
    }

    fn source(dir: &Path, layout: Layout, file: &str, slug: &str, contents: &str) -> Source {
        let document = dir.join(file);
        std::fs::write(&document, contents).unwrap();
        Source {
            layout,
            document,
            directory: dir.to_owned(),
            slug: slug.into(),
            year: None,
            section: None,
            url: format!("/{}/", slug),
        }
    }

    #[test]
    fn test_load_post() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let src = source(
            dir.path(),
            Layout::Loose,
            "gba.md",
            "gba",
            "---\ntitle: GBA on FPGA\ndate: 2025-06-01\ntags: [fpga]\n---\n![board](/2025/gba.webp)\n",
        );
        let item = Item::load(src, &config(), now())?;
        assert_eq!("GBA on FPGA", item.title);
        assert_eq!("nand2mario", item.author);
        assert_eq!("June 01, 2025", item.display_date());
        assert_eq!(vec!["fpga"], item.tags);
        assert!(!item.draft);
        assert!(item.html.contains(r#"src="/neo/2025/gba.webp""#), "{}", item.html);
        Ok(())
    }

    #[test]
    fn test_title_defaults_to_slug() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let src = source(dir.path(), Layout::Loose, "plain.md", "plain", "Just a body.");
        let item = Item::load(src, &config(), now())?;
        assert_eq!("plain", item.title);
        assert_eq!(now(), item.date);
        assert_eq!("Just a body.", item.body);
        Ok(())
    }

    #[test]
    fn test_page_titles() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let index = source(dir.path(), Layout::SectionIndex, "_index.md", "guides", "");
        let page = source(dir.path(), Layout::SectionPage, "dev_setup.md", "dev_setup", "");
        assert_eq!("Guides", Item::load(index, &config(), now())?.title);
        assert_eq!("Dev Setup", Item::load(page, &config(), now())?.title);
        Ok(())
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let dir = TempDir::new().unwrap();
        let src = source(dir.path(), Layout::Loose, "bad.md", "bad", "---\ndate: yesterday\n---\n");
        assert!(matches!(
            Item::load(src, &config(), now()),
            Err(Error::FrontMatter { .. })
        ));
    }

    #[test]
    fn test_unreadable_document() {
        let dir = TempDir::new().unwrap();
        let src = Source {
            layout: Layout::Bundle,
            document: dir.path().join("missing/index.md"),
            directory: dir.path().join("missing"),
            slug: "missing".into(),
            year: None,
            section: None,
            url: "/posts/missing/".into(),
        };
        assert!(matches!(Item::load(src, &config(), now()), Err(Error::Read { .. })));
    }
}
