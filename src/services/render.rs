use std::collections::BTreeMap;

use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};

use crate::services::images::is_valid_image_path;

/// Tags allowed in sanitized HTML by default.
const DEFAULT_ALLOWED_TAGS: [&str; 29] = [
    "p", "b", "i", "em", "strong", "a", "ul", "ol", "li", "br", "h1", "h2", "h3", "h4", "h5",
    "h6", "blockquote", "code", "pre", "hr", "span", "div", "img", "table", "thead", "tbody",
    "tr", "th", "td",
];

/// Attributes allowed on any tag by default.
const DEFAULT_ALLOWED_ATTR: [&str; 12] = [
    "href", "target", "rel", "src", "alt", "title", "class", "style", "width", "height", "id",
    "name",
];

/// URL schemes that survive sanitization. `data` stays allowed so that
/// stored data-URI images keep working as `src` values.
const ALLOWED_URL_SCHEMES: [&str; 4] = ["http", "https", "mailto", "data"];

fn base_builder() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .tags(DEFAULT_ALLOWED_TAGS.iter().copied().collect())
        .generic_attributes(DEFAULT_ALLOWED_ATTR.iter().copied().collect())
        .url_schemes(ALLOWED_URL_SCHEMES.iter().copied().collect())
        .link_rel(None);
    builder
}

fn blog_builder() -> ammonia::Builder<'static> {
    let mut builder = base_builder();
    builder
        // Embedded video frames and captioned figures.
        .add_tags(["iframe", "figure", "figcaption"])
        .add_generic_attributes(["frameborder", "allowfullscreen", "loading", "poster", "data-src"]);
    builder
}

/// Sanitize HTML against the default allow-list. Strips script content
/// and every attribute capable of triggering script execution.
pub fn sanitize_html(html: &str) -> String {
    base_builder().clean(html).to_string()
}

/// Sanitize HTML with the blog profile, which additionally permits
/// embedded video frames and figure/caption markup.
pub fn sanitize_blog_content(html: &str) -> String {
    blog_builder().clean(html).to_string()
}

/// Renders post Markdown to sanitized HTML, resolving internal image
/// references against a loaded asset mapping first.
#[derive(Debug, Clone)]
pub struct ContentRenderer {
    image_dir: String,
    internal_image_re: Regex,
}

impl ContentRenderer {
    pub fn new(image_dir: &str) -> Self {
        // Markdown image syntax whose path is rooted at the internal
        // images directory.
        let internal_image_re = Regex::new(&format!(
            r"!\[([^\]]*)\]\(({}/[^\s\)\]\}}]+)\)",
            regex::escape(image_dir)
        ))
        .expect("valid regex");
        Self {
            image_dir: image_dir.to_string(),
            internal_image_re,
        }
    }

    /// Substitute each internal image reference whose trailing file name
    /// is present in `assets` with the stored data URI, leaving the alt
    /// text untouched. Unresolvable references pass through verbatim.
    pub fn resolve_images(&self, content: &str, assets: &BTreeMap<String, String>) -> String {
        self.internal_image_re
            .replace_all(content, |caps: &Captures<'_>| {
                let alt = &caps[1];
                let path = &caps[2];
                let name = path.rsplit('/').next().unwrap_or_default();
                match assets.get(name) {
                    Some(data) if is_valid_image_path(data, &self.image_dir) => {
                        format!("![{alt}]({data})")
                    }
                    _ => caps[0].to_string(),
                }
            })
            .to_string()
    }

    /// Convert Markdown to HTML and sanitize it with the blog profile.
    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(markdown, options);
        let mut out = String::new();
        html::push_html(&mut out, parser);
        sanitize_blog_content(&out)
    }
}
