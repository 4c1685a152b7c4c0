//! Renders complete HTML documents for the four page kinds: post, home
//! listing, tag listing, and static page. Every kind is rendered into its own
//! template (or inline markup for tag pages) and then into the base layout,
//! which injects the site title, byline, base path, and navigation markers.

use crate::config::Config;
use crate::index::Neighbors;
use crate::item::Item;
use crate::markdown::excerpt;
use crate::template::{escape, Context, Theme};

/// The value of the active navigation placeholder.
const ACTIVE: &str = r#"class="active""#;

/// One page of the home listing. Page numbers start at 1.
#[derive(Debug)]
pub struct HomePage<'a> {
    pub number: usize,
    pub total: usize,
    pub posts: &'a [&'a Item],
}

impl HomePage<'_> {
    /// The page's site-relative URL: `/` for page 1, `/page/{n}/` otherwise.
    pub fn url(&self) -> String {
        page_url(self.number)
    }

    /// The URL of the page with newer posts, if any.
    pub fn newer(&self) -> Option<String> {
        match self.number > 1 {
            true => Some(page_url(self.number - 1)),
            false => None,
        }
    }

    /// The URL of the page with older posts, if any.
    pub fn older(&self) -> Option<String> {
        match self.number < self.total {
            true => Some(page_url(self.number + 1)),
            false => None,
        }
    }
}

fn page_url(number: usize) -> String {
    match number {
        1 => String::from("/"),
        n => format!("/page/{}/", n),
    }
}

/// The number of home pages for `count` published posts: `ceil(count /
/// page_size)`, but never less than 1.
pub fn page_count(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size).max(1)
}

/// Splits the published posts into home pages of `page_size` posts. There is
/// always at least one page, even with no posts.
pub fn paginate<'a>(posts: &'a [&'a Item], page_size: usize) -> Vec<HomePage<'a>> {
    let total = page_count(posts.len(), page_size);
    if posts.is_empty() {
        return vec![HomePage {
            number: 1,
            total,
            posts,
        }];
    }
    posts
        .chunks(page_size)
        .enumerate()
        .map(|(i, chunk)| HomePage {
            number: i + 1,
            total,
            posts: chunk,
        })
        .collect()
}

/// Renders pages with one theme and configuration.
pub struct Renderer<'a> {
    config: &'a Config,
    theme: &'a Theme,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a Config, theme: &'a Theme) -> Self {
        Renderer { config, theme }
    }

    /// Wraps `content` in the base layout. `active` names the navigation entry
    /// to mark, if any.
    fn layout(&self, title: &str, content: String, active: Option<&str>) -> String {
        let mut context = Context::new()
            .text("title", title)
            .text("site_title", &self.config.title)
            .text("site_byline", &self.config.byline)
            .html("base_path", self.config.base_path.as_str())
            .html("content", content);
        for key in &self.config.navigation {
            let marker = match active == Some(key.as_str()) {
                true => ACTIVE,
                false => "",
            };
            context = context.html(&format!("nav_{}", key), marker);
        }
        self.theme.base.render(&context)
    }

    /// Renders a post page.
    pub fn post(&self, item: &Item, neighbors: &Neighbors) -> String {
        let prev_link = neighbors.prev.map_or_else(String::new, |prev| {
            format!(
                r#"<a href="{}" class="prev-post">← {}</a>"#,
                self.config.href(prev.url()),
                escape(&prev.title)
            )
        });
        let next_link = neighbors.next.map_or_else(String::new, |next| {
            format!(
                r#"<a href="{}" class="next-post">{} →</a>"#,
                self.config.href(next.url()),
                escape(&next.title)
            )
        });

        let comments = &self.config.comments;
        let content = self.theme.post.render(
            &Context::new()
                .text("title", &item.title)
                .text("date", &item.display_date())
                .text("author", &item.author)
                .html("tags", self.tag_links(&item.tags))
                .html("content", item.html.as_str())
                .html("prev_link", prev_link)
                .html("next_link", next_link)
                .text("comments_repo", &comments.repo)
                .text("comments_repo_id", &comments.repo_id)
                .text("comments_category", &comments.category)
                .text("comments_category_id", &comments.category_id),
        );
        self.layout(
            &format!("{} - {}", item.title, self.config.title),
            content,
            None,
        )
    }

    fn tag_links(&self, tags: &[String]) -> String {
        if tags.is_empty() {
            return String::new();
        }
        let links: Vec<String> = tags
            .iter()
            .map(|tag| match tag_url(tag) {
                Some(url) => format!(
                    r#"<a href="{}" class="tag">{}</a>"#,
                    self.config.href(&url),
                    escape(tag)
                ),
                None => format!(r#"<span class="tag">{}</span>"#, escape(tag)),
            })
            .collect();
        format!(
            r#"<div class="post-tags"><span class="tags-label">{}:</span> {}</div>"#,
            match tags.len() {
                1 => "Tag",
                _ => "Tags",
            },
            links.join(" ")
        )
    }

    /// Renders one page of the home listing.
    pub fn home(&self, page: &HomePage) -> String {
        let content = self.theme.home.render(
            &Context::new()
                .html("post_list", self.previews(page.posts))
                .html("pagination", self.pagination(page)),
        );
        let title = match page.number {
            1 => self.config.title.clone(),
            n => format!("Page {} - {}", n, self.config.title),
        };
        self.layout(&title, content, Some("home"))
    }

    fn pagination(&self, page: &HomePage) -> String {
        let mut html = String::from(r#"<nav class="pagination">"#);
        match page.newer() {
            Some(url) => html.push_str(&format!(
                r#"<a href="{}" class="prev">← Newer</a>"#,
                self.config.href(&url)
            )),
            None => html.push_str(r#"<span class="prev disabled">← Newer</span>"#),
        }
        html.push_str(&format!(
            r#"<span class="page-info">Page {} of {}</span>"#,
            page.number, page.total
        ));
        match page.older() {
            Some(url) => html.push_str(&format!(
                r#"<a href="{}" class="next">Older →</a>"#,
                self.config.href(&url)
            )),
            None => html.push_str(r#"<span class="next disabled">Older →</span>"#),
        }
        html.push_str("</nav>");
        html
    }

    fn previews(&self, posts: &[&Item]) -> String {
        posts.iter().map(|post| self.preview(post)).collect()
    }

    fn preview(&self, post: &Item) -> String {
        let url = self.config.href(post.url());
        format!(
            r#"
        <article class="post-preview">
            <h2><a href="{url}">{title}</a></h2>
            <div class="post-meta">{date}</div>
            <p>{excerpt}</p>
            <a href="{url}" class="read-more">Read more →</a>
        </article>
        "#,
            url = url,
            title = escape(&post.title),
            date = post.display_date(),
            excerpt = excerpt(&post.html, self.config.excerpt_chars),
        )
    }

    /// Renders the listing of every published post carrying `tag`.
    pub fn tag(&self, tag: &str, posts: &[&Item]) -> String {
        let content = format!(
            r#"
    <div class="tag-page">
        <h1>Posts tagged "{tag}"</h1>
        <p class="tag-count">{count} post{plural}</p>
        {previews}
    </div>
    "#,
            tag = escape(tag),
            count = posts.len(),
            plural = match posts.len() {
                1 => "",
                _ => "s",
            },
            previews = self.previews(posts),
        );
        self.layout(
            &format!("Tag: {} - {}", tag, self.config.title),
            content,
            None,
        )
    }

    /// Renders a static page from already-rendered HTML.
    pub fn page(&self, title: &str, html: &str, active: Option<&str>) -> String {
        let content = self
            .theme
            .page
            .render(&Context::new().text("title", title).html("content", html));
        self.layout(
            &format!("{} - {}", title, self.config.title),
            content,
            active,
        )
    }
}

/// The site-relative URL of a tag's listing. Tags that can't be a single path
/// segment (empty, `.`, `..`, or containing a path separator) have no listing.
pub fn tag_url(tag: &str) -> Option<String> {
    match tag.is_empty() || tag == "." || tag == ".." || tag.contains(['/', '\\']) {
        true => None,
        false => Some(format!("/tags/{}/", tag)),
    }
}
