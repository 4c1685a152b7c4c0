//! Converts markdown bodies to HTML. Conversion happens in four passes:
//!
//! 1. A textual pre-pass finds the `![alt](src){key="value"}` image syntax
//!    (see [`rewrite_images`]) and either strips the attribute block or swaps
//!    the image for a marker.
//! 2. [`pulldown_cmark`] converts the markdown, with an [`EventConverter`]
//!    assigning heading ids and optionally neutralizing raw HTML. A paragraph
//!    holding only `[TOC]` becomes the table of contents.
//! 3. Image markers are replaced with their `<img>` tags, which therefore
//!    survive even when raw HTML is escaped.
//! 4. A textual post-pass prefixes root-relative `src`/`href` values with the
//!    base path (see [`prefix_root_relative`]).

use pulldown_cmark::{html, CowStr, Event, Options as CmarkOptions, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

static IMAGE_WITH_ATTRIBUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)\s*\{([^}]*)\}").unwrap());

static IMAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{E000}(\\d+)\u{E001}").unwrap());

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w-]+)=(?:"([^"]*)"|'([^']*)')"#).unwrap());

static URL_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(src|href)="(/[^"]*)""#).unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());

static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// The paragraph text replaced by the table of contents.
pub const TOC_MARKER: &str = "[TOC]";

/// How the `{key="value"}` block after an image is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageAttributes {
    /// Expand to an `<img>` tag carrying the attributes.
    Expand,

    /// Drop the attribute block, leaving a plain markdown image.
    Strip,
}

#[derive(Clone, Copy, Debug)]
pub struct Options<'a> {
    /// Prefix for root-relative URLs. Empty disables the rewrite.
    pub base_path: &'a str,

    /// Whether raw HTML in the markdown passes through unescaped.
    pub raw_html: bool,

    pub image_attributes: ImageAttributes,
}

/// Converts `markdown` to HTML.
pub fn to_html(markdown: &str, options: &Options) -> String {
    let images = rewrite_images(markdown, options.image_attributes);

    let mut cmark_options = CmarkOptions::empty();
    cmark_options.insert(CmarkOptions::ENABLE_TABLES);
    cmark_options.insert(CmarkOptions::ENABLE_HEADING_ATTRIBUTES);

    let mut converter = EventConverter::new(
        Parser::new_ext(&images.markdown, cmark_options),
        options.raw_html,
    );
    let events: Vec<Event> = converter.by_ref().collect();
    let events = insert_toc(events, &converter.headings);

    let mut out = String::with_capacity(images.markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());

    let out = images.restore(&out);
    prefix_root_relative(&out, options.base_path).into_owned()
}

/// Markdown whose attributed images were replaced by markers, and the `<img>`
/// tags the markers stand for.
pub struct RewrittenImages<'a> {
    pub markdown: Cow<'a, str>,
    images: Vec<String>,
}

impl RewrittenImages<'_> {
    /// Replaces every image marker in the rendered `html` with its tag.
    pub fn restore<'h>(&self, html: &'h str) -> Cow<'h, str> {
        if self.images.is_empty() {
            return Cow::Borrowed(html);
        }
        IMAGE_MARKER.replace_all(html, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| self.images.get(i))
                .cloned()
                .unwrap_or_default()
        })
    }
}

/// Rewrites every `![alt](src){attributes}` in `markdown` per `mode`. With
/// [`ImageAttributes::Expand`] each one becomes a marker that
/// [`RewrittenImages::restore`] turns into an `<img>` tag after conversion.
pub fn rewrite_images(markdown: &str, mode: ImageAttributes) -> RewrittenImages<'_> {
    let mut images = Vec::new();
    let markdown = IMAGE_WITH_ATTRIBUTES.replace_all(markdown, |caps: &Captures| {
        let (alt, src) = (&caps[1], &caps[2]);
        match mode {
            ImageAttributes::Strip => format!("![{}]({})", alt, src),
            ImageAttributes::Expand => {
                images.push(image_tag(alt, src, &caps[3]));
                format!("\u{E000}{}\u{E001}", images.len() - 1)
            }
        }
    });
    RewrittenImages { markdown, images }
}

/// Builds the `<img>` tag for an image with an attribute block.
pub fn image_tag(alt: &str, src: &str, block: &str) -> String {
    let mut img = format!(r#"<img src="{}" alt="{}""#, src, alt);
    for (key, value) in parse_attributes(block) {
        img.push_str(&format!(r#" {}="{}""#, key, value));
    }
    img.push('>');
    img
}

/// Parses `key="value"` and `key='value'` pairs. Anything else is ignored, so
/// a malformed block yields no attributes.
pub fn parse_attributes(block: &str) -> Vec<(&str, &str)> {
    ATTRIBUTE
        .captures_iter(block)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
            Some((key, value))
        })
        .collect()
}

/// Prefixes every root-relative `src="/..."` and `href="/..."` value in `html`
/// with `base_path`. Protocol-relative values (`//host/...`) and values
/// already under `base_path` are left alone.
pub fn prefix_root_relative<'h>(html: &'h str, base_path: &str) -> Cow<'h, str> {
    if base_path.is_empty() {
        return Cow::Borrowed(html);
    }
    URL_ATTRIBUTE.replace_all(html, |caps: &Captures| {
        let (attribute, value) = (&caps[1], &caps[2]);
        let prefixed = value
            .strip_prefix(base_path)
            .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'));
        match value.starts_with("//") || prefixed {
            true => caps[0].to_owned(),
            false => format!(r#"{}="{}{}""#, attribute, base_path, value),
        }
    })
}

/// Derives a plain-text excerpt from rendered HTML: tags are stripped,
/// whitespace collapsed, and text longer than `max_chars` characters is cut at
/// the last word boundary within the budget and suffixed with `...`.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = TAG.replace_all(html, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.trim();

    let cut = match text.char_indices().nth(max_chars) {
        None => return text.to_owned(),
        Some((cut, _)) => cut,
    };
    let (head, rest) = text.split_at(cut);
    let head = match rest.starts_with(' ') {
        true => head,
        false => head.rfind(' ').map_or(head, |i| &head[..i]),
    };
    format!("{}...", head.trim_end())
}

/// Produces the anchor id for a heading's text: lower-cased, punctuation
/// dropped, whitespace runs replaced by `-`.
pub fn slugify(text: &str) -> String {
    let text = NON_SLUG.replace_all(text, "");
    let text = text.trim().to_lowercase();
    SLUG_SEPARATORS.replace_all(&text, "-").into_owned()
}

/// A heading as listed in the table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Adapts the parser's event stream: headings without an explicit `{#id}`
/// receive a unique id derived from their text, and raw HTML is demoted to
/// text (and thus escaped) unless `raw_html` is set. Every heading passed
/// through is recorded in `headings`.
struct EventConverter<'a, I: Iterator<Item = Event<'a>>> {
    inner: I,
    pending: VecDeque<Event<'a>>,
    seen: HashSet<String>,
    raw_html: bool,
    headings: Vec<TocEntry>,
}

impl<'a, I: Iterator<Item = Event<'a>>> EventConverter<'a, I> {
    fn new(inner: I, raw_html: bool) -> Self {
        EventConverter {
            inner,
            pending: VecDeque::with_capacity(4),
            seen: HashSet::new(),
            raw_html,
            headings: Vec::new(),
        }
    }

    fn unique_id(&mut self, text: &str) -> String {
        let base = match slugify(text) {
            slug if slug.is_empty() => String::from("section"),
            slug => slug,
        };
        let mut id = base.clone();
        let mut n = 0;
        while self.seen.contains(&id) {
            n += 1;
            id = format!("{}_{}", base, n);
        }
        self.seen.insert(id.clone());
        id
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for EventConverter<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(ev) = self.pending.pop_front() {
            return Some(ev);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let raw_html = self.raw_html;
                let mut text = String::new();
                for ev in self.inner.by_ref() {
                    if let Event::Text(s) | Event::Code(s) = &ev {
                        text.push_str(s);
                    }
                    let end = matches!(ev, Event::End(TagEnd::Heading(_)));
                    self.pending.push_back(convert(ev, raw_html));
                    if end {
                        break;
                    }
                }
                let id = match id {
                    Some(id) => {
                        self.seen.insert(id.to_string());
                        id
                    }
                    None => CowStr::from(self.unique_id(&text)),
                };
                self.headings.push(TocEntry {
                    level: level as u8,
                    id: id.to_string(),
                    text,
                });
                Some(Event::Start(Tag::Heading {
                    level,
                    id: Some(id),
                    classes,
                    attrs,
                }))
            }
            ev => Some(convert(ev, self.raw_html)),
        }
    }
}

fn convert(ev: Event<'_>, raw_html: bool) -> Event<'_> {
    match ev {
        Event::Html(html) | Event::InlineHtml(html) if !raw_html => Event::Text(html),
        _ => ev,
    }
}

/// Replaces every paragraph consisting only of [`TOC_MARKER`] with the table
/// of contents built from `headings`.
fn insert_toc<'a>(events: Vec<Event<'a>>, headings: &[TocEntry]) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut i = 0;
    while i < events.len() {
        if let Some(len) = toc_marker_len(&events[i..]) {
            out.push(Event::Html(CowStr::from(toc_html(headings))));
            i += len;
        } else {
            out.push(events[i].clone());
            i += 1;
        }
    }
    out
}

// Returns the number of events making up a `[TOC]` paragraph at the start of
// `events`, if there is one. The parser may split the text into several
// events.
fn toc_marker_len(events: &[Event]) -> Option<usize> {
    if !matches!(events.first(), Some(Event::Start(Tag::Paragraph))) {
        return None;
    }
    let mut text = String::new();
    for (i, ev) in events.iter().enumerate().skip(1) {
        match ev {
            Event::Text(s) => text.push_str(s),
            Event::End(TagEnd::Paragraph) => {
                return match text.trim() == TOC_MARKER {
                    true => Some(i + 1),
                    false => None,
                }
            }
            _ => return None,
        }
    }
    None
}

/// Renders `headings` as nested lists. A heading deeper than the one before it
/// opens a sub-list; a shallower one closes sub-lists until it fits.
pub fn toc_html(headings: &[TocEntry]) -> String {
    let mut html = String::from(r#"<div class="toc">"#);
    let mut open: Vec<u8> = Vec::new();
    for heading in headings {
        match open.last().copied() {
            Some(last) if heading.level <= last => {
                html.push_str("</li>");
                while open.len() > 1
                    && heading.level < open[open.len() - 1]
                    && heading.level <= open[open.len() - 2]
                {
                    html.push_str("</ul></li>");
                    open.pop();
                }
            }
            _ => {
                html.push_str("<ul>");
                open.push(heading.level);
            }
        }
        html.push_str(&format!(
            r##"<li><a href="#{}">{}</a>"##,
            html_escape::encode_double_quoted_attribute(&heading.id),
            html_escape::encode_text(&heading.text)
        ));
    }
    for _ in &open {
        html.push_str("</li></ul>");
    }
    html.push_str("</div>\n");
    html
}
