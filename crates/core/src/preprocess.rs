//! Document normalization ahead of scoring.
//!
//! Runs in two stages. [`preprocess_html`] streams the raw markup through
//! `lol_html` to drop non-content tags, repair lazy-loaded images and resolve
//! relative URLs. [`prepare_tree`] then works on the parsed [`DomTree`]:
//! comments and hidden elements go, `<br><br>` runs become paragraph breaks,
//! text-only `<div>`s become `<p>`s, and every table is classified.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use url::Url;

use crate::dom_tree::{DomTree, NodeId, is_block_tag};
use crate::metrics::normalize_text;
use crate::tables::classify_tables;

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script tags
    pub remove_scripts: bool,
    /// Whether to remove style tags
    pub remove_styles: bool,
    /// Whether to remove noscript tags (they duplicate lazy image markup)
    pub remove_noscript: bool,
    /// Whether to remove template tags
    pub remove_templates: bool,
    /// Whether to remove iframe tags; off so the embed allow-list can judge them
    pub remove_iframes: bool,
    /// Whether to remove svg tags
    pub remove_svg: bool,
    /// Whether to remove canvas tags
    pub remove_canvas: bool,
    /// Whether to copy lazy-load attributes into `src`/`srcset`
    pub fix_lazy_images: bool,
    /// Whether to remove comment nodes
    pub remove_comments: bool,
    /// Whether to remove hidden elements
    pub remove_hidden: bool,
    /// Whether to turn `<br>` runs into paragraphs
    pub collapse_brs: bool,
    /// Whether to rename `<div>`s without block children to `<p>`
    pub convert_divs: bool,
    /// Whether to convert relative URLs to absolute
    pub convert_urls: bool,
    /// Base URL for converting relative URLs
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_scripts: true,
            remove_styles: true,
            remove_noscript: true,
            remove_templates: true,
            remove_iframes: false,
            remove_svg: true,
            remove_canvas: true,
            fix_lazy_images: true,
            remove_comments: true,
            remove_hidden: true,
            collapse_brs: true,
            convert_divs: true,
            convert_urls: true,
            base_url: None,
        }
    }
}

impl PreprocessConfig {
    fn removed_tags(&self) -> Vec<&'static str> {
        [
            (self.remove_scripts, "script"),
            (self.remove_styles, "style"),
            (self.remove_noscript, "noscript"),
            (self.remove_templates, "template"),
            (self.remove_iframes, "iframe"),
            (self.remove_svg, "svg"),
            (self.remove_canvas, "canvas"),
        ]
        .into_iter()
        .filter_map(|(enabled, tag)| enabled.then_some(tag))
        .collect()
    }
}

/// Attributes lazy loaders park the real image URL in, in priority order.
const LAZY_SRC_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original", "data-url"];

/// Elements whose `src`/`srcset` get resolved against the base URL.
const MEDIA_SOURCE_TAGS: &[&str] = &["img", "source", "iframe", "video", "audio", "embed"];

/// `data:` URIs shorter than this are treated as placeholders.
const MAX_PLACEHOLDER_DATA_URI: usize = 256;

static PLACEHOLDER_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[/_.-])(placeholder|blank|spacer|pixel|lazy|loading|transparent|1x1)[^/]*$")
        .expect("valid placeholder regex")
});

static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("valid hidden style regex")
});

/// Whether a visible `src` value is only standing in for a lazy image.
pub fn is_placeholder_src(src: Option<&str>) -> bool {
    let Some(src) = src.map(str::trim) else {
        return true;
    };
    if src.is_empty() {
        return true;
    }
    if src.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
        return src.len() < MAX_PLACEHOLDER_DATA_URI;
    }
    PLACEHOLDER_SRC.is_match(src)
}

/// Stream the raw markup through the tag, image and URL rewrites.
///
/// Rewriting never fails the pipeline: on a rewriter error the input is
/// returned unchanged.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let base_url = config.base_url.as_ref().filter(|_| config.convert_urls);

    let mut handlers = Vec::new();

    for tag in config.removed_tags() {
        handlers.push(lol_html::element!(tag, |el| {
            el.remove();
            Ok(())
        }));
    }

    if config.fix_lazy_images {
        handlers.push(lol_html::element!("img", |el| {
            if is_placeholder_src(el.get_attribute("src").as_deref())
                && let Some(real) = LAZY_SRC_ATTRS
                    .iter()
                    .filter_map(|attr| el.get_attribute(attr))
                    .find(|value| !value.trim().is_empty())
            {
                el.set_attribute("src", &real).ok();
            }
            copy_lazy_srcset(el);
            Ok(())
        }));
        handlers.push(lol_html::element!("source", |el| {
            copy_lazy_srcset(el);
            Ok(())
        }));
    }

    if let Some(base_url) = base_url {
        for selector in ["a[href]", "link[href]"] {
            handlers.push(lol_html::element!(selector, move |el| {
                if let Some(href) = el.get_attribute("href")
                    && let Some(absolute) = resolve_url(base_url, &href)
                {
                    el.set_attribute("href", &absolute).ok();
                }
                Ok(())
            }));
        }
        for tag in MEDIA_SOURCE_TAGS {
            handlers.push(lol_html::element!(tag, move |el| {
                if let Some(src) = el.get_attribute("src")
                    && let Some(absolute) = resolve_url(base_url, &src)
                {
                    el.set_attribute("src", &absolute).ok();
                }
                if let Some(srcset) = el.get_attribute("srcset") {
                    el.set_attribute("srcset", &resolve_srcset(base_url, &srcset)).ok();
                }
                Ok(())
            }));
        }
    }

    if handlers.is_empty() {
        return html.to_string();
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        debug!("markup rewrite failed, using original input");
        return html.to_string();
    }
    if rewriter.end().is_err() {
        debug!("markup rewrite failed, using original input");
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

fn copy_lazy_srcset(el: &mut lol_html::html_content::Element<'_, '_>) {
    let has_srcset = el.get_attribute("srcset").is_some_and(|s| !s.trim().is_empty());
    if !has_srcset && let Some(lazy) = el.get_attribute("data-srcset").filter(|s| !s.trim().is_empty()) {
        el.set_attribute("srcset", &lazy).ok();
    }
}

/// Resolve a possibly relative URL; fragments and script URLs are left alone.
fn resolve_url(base_url: &Url, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') || value.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }
    base_url.join(value).ok().map(String::from)
}

fn resolve_srcset(base_url: &Url, srcset: &str) -> String {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let resolved = resolve_url(base_url, url).unwrap_or_else(|| url.to_string());
            let descriptor: Vec<&str> = parts.collect();
            Some(if descriptor.is_empty() { resolved } else { format!("{} {}", resolved, descriptor.join(" ")) })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tree-level normalization run after parsing.
pub fn prepare_tree(tree: &mut DomTree, config: &PreprocessConfig) {
    let root = tree.root();

    if config.remove_comments {
        for id in tree.descendants(root) {
            if tree.is_comment(id) {
                tree.remove(id);
            }
        }
    }

    if config.remove_hidden {
        let mut removed = 0usize;
        for id in tree.descendants(root) {
            if tree.contains(id) && is_hidden(tree, id) {
                tree.remove(id);
                removed += 1;
            }
        }
        trace!(removed, "removed hidden elements");
    }

    if config.collapse_brs {
        collapse_br_runs(tree, root);
    }

    if config.convert_divs {
        convert_text_divs(tree, root);
    }

    classify_tables(tree, root);
}

/// Hidden by inline style, the `hidden` attribute, or `aria-hidden="true"`.
pub fn is_hidden(tree: &DomTree, id: NodeId) -> bool {
    if matches!(tree.tag_name(id), None | Some("html" | "body")) {
        return false;
    }
    if tree.attr(id, "style").is_some_and(|style| HIDDEN_STYLE.is_match(style)) {
        return true;
    }
    if tree.has_attr(id, "hidden") {
        return true;
    }
    tree.attr(id, "aria-hidden")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn is_blank_text(tree: &DomTree, id: NodeId) -> bool {
    tree.text(id).is_some_and(|t| t.trim().is_empty())
}

/// Next sibling that is not whitespace-only text.
fn next_significant_sibling(tree: &DomTree, id: NodeId) -> Option<NodeId> {
    let mut next = tree.next_sibling(id);
    while let Some(candidate) = next {
        if !is_blank_text(tree, candidate) {
            return Some(candidate);
        }
        next = tree.next_sibling(candidate);
    }
    None
}

/// Replace each run of two or more `<br>`s with a `<p>` that absorbs the
/// phrasing content following the run.
fn collapse_br_runs(tree: &mut DomTree, root: NodeId) {
    for br in tree.find_all(root, "br") {
        if !tree.contains(br) {
            continue;
        }

        let mut collapsed = false;
        while let Some(next) = next_significant_sibling(tree, br) {
            if !tree.is_tag(next, "br") {
                break;
            }
            collapsed = true;
            // whitespace between the breaks goes with them
            while let Some(gap) = tree.next_sibling(br) {
                let is_next = gap == next;
                tree.remove(gap);
                if is_next {
                    break;
                }
            }
        }
        if !collapsed {
            continue;
        }

        let paragraph = tree.create_element("p");
        tree.replace_with(br, paragraph);

        while let Some(sibling) = tree.next_sibling(paragraph) {
            if tree.is_tag(sibling, "br")
                && next_significant_sibling(tree, sibling).is_some_and(|n| tree.is_tag(n, "br"))
            {
                break;
            }
            if tree.tag_name(sibling).is_some_and(is_block_tag) {
                break;
            }
            tree.append_child(paragraph, sibling);
        }

        while let Some(&last) = tree.children(paragraph).last() {
            if !is_blank_text(tree, last) {
                break;
            }
            tree.remove(last);
        }

        if tree.children(paragraph).is_empty() {
            tree.remove(paragraph);
            continue;
        }

        if let Some(parent) = tree.parent(paragraph)
            && tree.is_tag(parent, "p")
        {
            tree.rename(parent, "div");
        }
    }
}

/// A `<div>` holding only phrasing content and some text is a paragraph.
fn convert_text_divs(tree: &mut DomTree, root: NodeId) {
    let Some(body) = tree.find_first(root, "body") else {
        return;
    };
    let mut converted = 0usize;
    for div in tree.find_all(body, "div") {
        let has_block = tree
            .descendants(div)
            .into_iter()
            .any(|d| tree.tag_name(d).is_some_and(|name| is_block_tag(name) || name == "img" || name == "video"));
        if has_block || normalize_text(&tree.text_content(div)).is_empty() {
            continue;
        }
        tree.rename(div, "p");
        converted += 1;
    }
    trace!(converted, "converted text-only divs");
}
