use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use yearbook::build::{build_site, Error};
use yearbook::config::Config;
use yearbook::template;

const BASE: &str = "<title>{{title}}</title><link href=\"{{base_path}}/css/style.css\">\
<a href=\"{{base_path}}/\" {{nav_home}}>Home</a>\
<a href=\"{{base_path}}/projects/\" {{nav_projects}}>Projects</a>\
<a href=\"{{base_path}}/guides/\" {{nav_guides}}>Guides</a>\
<main>{{content}}</main>";

const POST: &str = "<h1>{{title}}</h1>{{date}}{{tags}}{{content}}<nav>{{prev_link}}{{next_link}}</nav>\
<script data-repo=\"{{comments_repo}}\" data-repo-id=\"{{comments_repo_id}}\" \
data-category=\"{{comments_category}}\" data-category-id=\"{{comments_category_id}}\"></script>";

/// A throwaway project: a theme, a content tree, and a project file.
struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Site {
        let site = Site {
            dir: TempDir::new().unwrap(),
        };
        site.write("theme/base.html", BASE);
        site.write("theme/post.html", POST);
        site.write("theme/home.html", "{{post_list}}{{pagination}}");
        site.write("theme/page.html", "<h1>{{title}}</h1>{{content}}");
        site.write("theme/style.css", "body { color: black; }\n");
        site
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, path: &str, contents: &str) {
        let path = self.root().join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn post(&self, path: &str, title: &str, date: &str, extra: &str) {
        self.write(
            &format!("content/posts/{}", path),
            &format!(
                "---\ntitle: {}\ndate: {}\n{}---\nThe body of {}.\n",
                title, date, extra, title
            ),
        );
    }

    fn config(&self, extra: &str) -> Config {
        Config::parse(
            &format!(
                "title: Small Things\nbyline: Retro\nurl: https://example.org\n{}",
                extra
            ),
            self.root(),
        )
        .unwrap()
    }

    fn build(&self, extra: &str) -> PathBuf {
        let config = self.config(extra);
        build_site(&config, build_time()).unwrap();
        config.output_directory
    }
}

fn build_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn read(path: PathBuf) -> String {
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

// Maps every file under `dir` to its contents.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap().to_owned();
            (relative, std::fs::read(entry.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_build_is_idempotent() {
    let site = Site::new();
    site.post("2025/one.md", "One", "2025-01-01", "tags: [fpga]\n");
    site.post("2025/two/index.md", "Two", "2025-02-01", "tags: [fpga, nes]\n");
    site.write("content/posts/2025/two/die.png", "png");
    site.write("content/posts/2025/undated.md", "No front matter here.");
    site.write("content/guides/_index.md", "All the guides.");

    let out = site.build("");
    let first = snapshot(&out);
    let out = site.build("");
    assert_eq!(first, snapshot(&out));
    assert!(first.contains_key(Path::new("feed.xml")));
    assert!(first.contains_key(Path::new("posts/2025/two/die.png")));
}

#[test]
fn test_pagination() {
    let site = Site::new();
    for day in 1..=23 {
        site.post(
            &format!("2025/p{:02}.md", day),
            &format!("P{:02}", day),
            &format!("2025-01-{:02}", day),
            "",
        );
    }
    let out = site.build("posts_per_page: 10\n");

    let first = read(out.join("index.html"));
    assert_eq!(10, first.matches("class=\"post-preview\"").count());
    assert!(first.contains(r#"<span class="prev disabled">← Newer</span>"#));
    assert!(first.contains(r#"<span class="page-info">Page 1 of 3</span>"#));
    assert!(first.contains("P23"));

    let second = read(out.join("page/2/index.html"));
    assert_eq!(10, second.matches("class=\"post-preview\"").count());
    assert!(second.contains(r#"<a href="/" class="prev">← Newer</a>"#));

    let third = read(out.join("page/3/index.html"));
    assert_eq!(3, third.matches("class=\"post-preview\"").count());
    assert!(third.contains(r#"<span class="next disabled">Older →</span>"#));
    assert!(third.contains("P01"));

    assert!(!out.join("page/4").exists());
    assert!(!out.join("page/1").exists());
}

#[test]
fn test_empty_site_has_one_home_page() {
    let site = Site::new();
    let out = site.build("");
    let home = read(out.join("index.html"));
    assert!(home.contains(r#"<span class="page-info">Page 1 of 1</span>"#));
    assert!(!out.join("page").exists());
    assert!(!out.join("tags").exists());
    assert_eq!(0, read(out.join("feed.xml")).matches("<item>").count());
}

#[test]
fn test_drafts_are_excluded_from_listings() {
    let site = Site::new();
    site.post("2025/public.md", "Public", "2025-01-01", "tags: [shared]\n");
    site.post(
        "2025/hidden.md",
        "Hidden",
        "2025-02-01",
        "tags: [shared, secret]\ndraft: true\n",
    );
    let out = site.build("");

    let draft = read(out.join("posts/2025/hidden/index.html"));
    assert!(draft.contains("The body of Hidden."));
    assert!(!draft.contains("prev-post") && !draft.contains("next-post"));

    assert!(!out.join("tags/secret").exists());
    assert!(!read(out.join("tags/shared/index.html")).contains("Hidden"));
    assert!(!read(out.join("index.html")).contains("Hidden"));
    assert!(read(out.join("index.html")).contains("Page 1 of 1"));
    assert!(!read(out.join("feed.xml")).contains("hidden"));

    // the published post has no neighbours either, since the draft isn't one
    let public = read(out.join("posts/2025/public/index.html"));
    assert!(!public.contains("prev-post") && !public.contains("next-post"));
}

#[test]
fn test_prev_next_links() {
    let site = Site::new();
    site.post("2025/jan.md", "Jan", "2025-01-01", "");
    site.post("2025/feb.md", "Feb", "2025-02-01", "");
    site.post("2025/mar.md", "Mar", "2025-03-01", "");
    let out = site.build("");

    let feb = read(out.join("posts/2025/feb/index.html"));
    assert!(feb.contains(r#"<a href="/posts/2025/mar/" class="prev-post">← Mar</a>"#));
    assert!(feb.contains(r#"<a href="/posts/2025/jan/" class="next-post">Jan →</a>"#));
    assert!(!read(out.join("posts/2025/mar/index.html")).contains("prev-post"));
    assert!(!read(out.join("posts/2025/jan/index.html")).contains("next-post"));
}

#[test]
fn test_feed_holds_the_most_recent_posts() {
    let site = Site::new();
    for day in 1..=25 {
        site.post(
            &format!("2025/p{:02}.md", day),
            &format!("P{:02}", day),
            &format!("2025-03-{:02}", day),
            "",
        );
    }
    let out = site.build("");
    let feed = read(out.join("feed.xml"));
    assert_eq!(20, feed.matches("<item>").count());
    assert!(feed.contains("https://example.org/posts/2025/p25/"));
    assert!(feed.contains("https://example.org/posts/2025/p06/"));
    assert!(!feed.contains("https://example.org/posts/2025/p05/"));
    assert!(feed.contains("<lastBuildDate>Fri, 16 Oct 2026 12:00:00 GMT</lastBuildDate>"));
}

#[test]
fn test_asset_copying() {
    let site = Site::new();
    site.post("2025/bundle/index.md", "Bundle", "2025-01-01", "");
    site.write("content/posts/2025/bundle/photo.png", "photo");
    site.write("content/posts/2025/bundle/notes.txt", "notes");
    site.post("2025/alpha.md", "Alpha", "2025-01-02", "");
    site.write("content/posts/2025/alpha-1.png", "alpha");
    site.post("2025/beta.md", "Beta", "2025-01-03", "");
    site.write("content/posts/2025/beta.png", "beta");
    site.write("content/posts/2025/shared.png", "shared");
    site.post("legacy/index.md", "Legacy", "2024-05-01", "");
    site.write("content/posts/legacy/old.gif", "gif");
    let out = site.build("");

    // a bundle owns every non-document file in its directory
    assert_eq!("photo", read(out.join("posts/2025/bundle/photo.png")));
    assert_eq!("notes", read(out.join("posts/2025/bundle/notes.txt")));
    assert!(!out.join("posts/2025/bundle/index.md").exists());

    // a loose post only owns the files named after it
    assert_eq!("alpha", read(out.join("posts/2025/alpha/alpha-1.png")));
    assert_eq!("beta", read(out.join("posts/2025/beta/beta.png")));
    assert!(!out.join("posts/2025/alpha/beta.png").exists());
    assert!(!out.join("posts/2025/alpha/shared.png").exists());
    assert!(!out.join("posts/2025/beta/shared.png").exists());
    assert!(!out.join("posts/2025/alpha/alpha.md").exists());

    // a legacy bundle has no year
    assert!(out.join("posts/legacy/index.html").exists());
    assert_eq!("gif", read(out.join("posts/legacy/old.gif")));
}

#[test]
fn test_pages_and_sections() {
    let site = Site::new();
    site.write("content/guides/_index.md", "---\ntitle: All Guides\n---\nStart here.");
    site.write("content/guides/dev_setup.md", "Install things.");
    site.write("content/guides/_draft.md", "Not a page.");
    site.write("content/guides/diagram.svg", "<svg/>");
    site.write("content/about/me.md", "Hi.");
    let out = site.build("");

    let index = read(out.join("guides/index.html"));
    assert!(index.contains("<title>All Guides - Small Things</title>"));
    assert!(index.contains(r#"<a href="/guides/" class="active">Guides</a>"#));
    assert!(index.contains("<p>Start here.</p>"));

    let page = read(out.join("guides/dev_setup/index.html"));
    assert!(page.contains("<h1>Dev Setup</h1>"));
    assert!(page.contains(r#"class="active">Guides"#));

    assert!(!out.join("guides/_draft").exists());
    assert_eq!("<svg/>", read(out.join("guides/diagram.svg")));
    assert!(!out.join("guides/dev_setup.md").exists());

    // sections outside the navigation activate nothing
    let me = read(out.join("about/me/index.html"));
    assert!(!me.contains(r#"class="active""#));
}

#[test]
fn test_projects_placeholder() {
    let site = Site::new();
    let out = site.build("");
    let projects = read(out.join("projects/index.html"));
    assert!(projects.contains("<p>Projects coming soon.</p>"));
    assert!(projects.contains(r#"<a href="/projects/" class="active">Projects</a>"#));

    let out = site.build("projects_placeholder: false\n");
    assert!(!out.join("projects").exists());

    site.write("content/projects/_index.md", "Real projects.");
    let out = site.build("");
    let projects = read(out.join("projects/index.html"));
    assert!(projects.contains("Real projects."));
    assert!(!projects.contains("coming soon"));
}

#[test]
fn test_base_path() {
    let site = Site::new();
    site.write(
        "content/posts/2025/gba.md",
        "---\ndate: 2025-06-01\n---\n<img src=\"/2025/a.webp\">\n\n<img src=\"https://ext.example/a.png\">\n\n[next](/posts/2025/nes/)\n",
    );
    let out = site.build("base_path: /neo\n");

    let post = read(out.join("posts/2025/gba/index.html"));
    assert!(post.contains(r#"<img src="/neo/2025/a.webp">"#), "{}", post);
    assert!(post.contains(r#"<img src="https://ext.example/a.png">"#));
    assert!(post.contains(r#"<a href="/neo/posts/2025/nes/">next</a>"#));
    assert!(post.contains(r#"<link href="/neo/css/style.css">"#));
    assert!(post.contains("<title>gba - Small Things</title>"));

    let home = read(out.join("index.html"));
    assert!(home.contains(r#"<a href="/neo/posts/2025/gba/">gba</a>"#));

    let feed = read(out.join("feed.xml"));
    assert!(feed.contains("<link>https://example.org/neo/posts/2025/gba/</link>"));
}

#[test]
fn test_static_assets() {
    let site = Site::new();
    site.write("static/favicon.ico", "ico");
    site.write("static/fonts/mono.woff2", "font");
    let out = site.build("");
    assert_eq!("body { color: black; }\n", read(out.join("css/style.css")));
    assert_eq!("ico", read(out.join("favicon.ico")));
    assert_eq!("font", read(out.join("fonts/mono.woff2")));
}

#[test]
fn test_stale_output_is_removed() {
    let site = Site::new();
    site.post("2025/gone.md", "Gone", "2025-01-01", "");
    let out = site.build("");
    assert!(out.join("posts/2025/gone/index.html").exists());

    std::fs::remove_file(site.root().join("content/posts/2025/gone.md")).unwrap();
    let out = site.build("");
    assert!(!out.join("posts/2025/gone").exists());
}

#[test]
fn test_missing_template_aborts_before_cleaning() {
    let site = Site::new();
    let out = site.build("");
    std::fs::remove_file(site.root().join("theme/page.html")).unwrap();

    match build_site(&site.config(""), build_time()) {
        Err(Error::Template(template::Error::Missing { path })) => {
            assert_eq!(site.root().join("theme/page.html"), path)
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(()) => panic!("built a site without a page template"),
    }
    // the previous build is still there
    assert!(out.join("index.html").exists());
}

#[test]
fn test_malformed_date_aborts() {
    let site = Site::new();
    site.write("content/posts/2025/bad.md", "---\ndate: next tuesday\n---\nBody.");
    assert!(matches!(
        build_site(&site.config(""), build_time()),
        Err(Error::Item(_))
    ));
}

#[test]
fn test_malformed_front_matter_is_tolerated() {
    let site = Site::new();
    site.write(
        "content/posts/2025/odd.md",
        "---\ntitle: [unclosed\n---\nStill a post.",
    );
    let out = site.build("");
    let post = read(out.join("posts/2025/odd/index.html"));
    assert!(post.contains("<h1>odd</h1>"));
    assert!(post.contains("Still a post."));
}

#[test]
fn test_tags_cannot_escape_the_tags_directory() {
    let site = Site::new();
    site.post("2025/sneaky.md", "Sneaky", "2025-01-01", "tags: ['..', 'a/b', nes]\n");
    let out = site.build("");

    let home = read(out.join("index.html"));
    assert!(home.contains(r#"<span class="page-info">Page 1 of 1</span>"#), "{}", home);
    assert!(!out.join("tags/a").exists());
    assert!(read(out.join("tags/nes/index.html")).contains("Sneaky"));
    assert!(read(out.join("posts/2025/sneaky/index.html")).contains(r#"<span class="tag">..</span>"#));
}
