//! Conditional cleanup of the selected content.
//!
//! Cleanup runs in three steps over the detached container:
//!
//! 1. a tag-wide pass that drops interactive chrome and disallowed embeds
//!    wherever they appear;
//! 2. a post-order pass that sorts every element into an [`ElementCategory`]
//!    and applies that category's rule, producing a [`Decision`];
//! 3. attribute stripping and removal of empty phrasing wrappers.
//!
//! Data tables and preserved link blocks are never descended into. When link
//! preservation is on, every conditional removal goes through
//! [`remove_preserving_links`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::dom_tree::{DomTree, NodeId, is_block_tag};
use crate::extract::ExtractedContent;
use crate::links::{LinkMatcher, remove_preserving_links};
use crate::metrics::{ClassKeywords, CLASS_WEIGHT, NodeMetrics, normalize_text, paragraph_count, visible_descendants};
use crate::tables::{TableKind, flatten_layout_table, table_kind};
use crate::{FolioError, Result};

/// Configuration for content cleanup
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Class/id keyword sets used for class weight
    pub keywords: ClassKeywords,
    /// Minimum text a generic container needs to survive
    pub min_text_length: usize,
    /// Maximum link density for a generic container
    pub max_link_density: f64,
    /// Maximum link density for a container kept for its media or tables
    pub max_protected_link_density: f64,
    /// Re-insert important links from removed elements
    pub preserve_important_links: bool,
    /// Classifier for important links
    pub link_matcher: LinkMatcher,
    /// Whether to keep class attributes (default: false)
    pub keep_classes: bool,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            keywords: ClassKeywords::default(),
            min_text_length: 25,
            max_link_density: 0.25,
            max_protected_link_density: 0.5,
            preserve_important_links: false,
            link_matcher: LinkMatcher::default(),
            keep_classes: false,
        }
    }
}

/// Rule family an element is judged by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementCategory {
    Heading,
    Paragraph,
    Container,
    Table,
    Embed,
    Image,
    List,
    Landmark,
    InteractiveChrome,
    Text,
    Other,
}

/// Outcome of a cleanup rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Remove,
    Rewrite,
}

/// Counts of what cleanup did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub rewritten: usize,
    pub preserved: usize,
}

const INTERACTIVE_TAGS: &[&str] = &["button", "input", "select", "textarea", "option", "optgroup"];
const EMBED_TAGS: &[&str] = &["iframe", "video", "audio", "object", "embed"];
const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "iframe", "embed", "object"];
const PHRASING_WRAPPERS: &[&str] = &["span", "font", "b", "i", "em", "strong", "small", "u", "a", "sup", "sub"];

const PRESENTATIONAL_ATTRS: &[&str] = &[
    "style", "align", "background", "bgcolor", "border", "cellpadding", "cellspacing", "frame", "hspace", "rules",
    "valign", "vspace",
];
const SIZED_TAGS: &[&str] = &["table", "th", "td", "hr", "pre"];

/// Hosts whose embedded players count as content.
static VIDEO_HOSTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq|bilibili|live\.bilibili)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)",
    )
    .expect("valid video host regex")
});

static TRACKING_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(pixel|spacer|tracking|beacon|1x1|blank\.gif)").expect("valid tracking regex")
});

/// Sort an element into its rule family.
pub fn categorize(tree: &DomTree, id: NodeId) -> ElementCategory {
    if tree.is_text(id) {
        return ElementCategory::Text;
    }
    let Some(tag) = tree.tag_name(id) else {
        return ElementCategory::Other;
    };
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementCategory::Heading,
        "p" => ElementCategory::Paragraph,
        "div" | "section" | "article" | "main" => ElementCategory::Container,
        "span" if has_block_child(tree, id) => ElementCategory::Container,
        "table" => ElementCategory::Table,
        "img" => ElementCategory::Image,
        "ul" | "ol" | "dl" => ElementCategory::List,
        "header" | "footer" | "nav" | "aside" => ElementCategory::Landmark,
        "form" => ElementCategory::InteractiveChrome,
        t if EMBED_TAGS.contains(&t) => ElementCategory::Embed,
        t if INTERACTIVE_TAGS.contains(&t) => ElementCategory::InteractiveChrome,
        _ => ElementCategory::Other,
    }
}

fn has_block_child(tree: &DomTree, id: NodeId) -> bool {
    tree.element_children(id)
        .into_iter()
        .any(|c| tree.tag_name(c).is_some_and(is_block_tag))
}

fn has_media(tree: &DomTree, id: NodeId) -> bool {
    visible_descendants(tree, id)
        .into_iter()
        .any(|d| tree.tag_name(d).is_some_and(|t| MEDIA_TAGS.contains(&t)))
}

fn is_presentational(tree: &DomTree, id: NodeId) -> bool {
    tree.attr(id, "role")
        .is_some_and(|role| role.trim().eq_ignore_ascii_case("presentation"))
}

/// Whether an embed belongs to the allow-list.
pub fn is_allowed_embed(tree: &DomTree, id: NodeId) -> bool {
    let Some(tag) = tree.tag_name(id) else {
        return false;
    };
    let matches_host = |value: Option<&str>| value.is_some_and(|v| VIDEO_HOSTS.is_match(v));

    match tag {
        "iframe" | "embed" => matches_host(tree.attr(id, "src")),
        "object" => {
            matches_host(tree.attr(id, "data"))
                || tree
                    .descendants(id)
                    .into_iter()
                    .any(|d| matches_host(tree.attr(d, "src")) || matches_host(tree.attr(d, "value")))
        }
        "video" | "audio" => {
            if is_presentational(tree, id) {
                return false;
            }
            let has_src = tree.attr(id, "src").is_some_and(|s| !s.trim().is_empty());
            has_src
                || tree
                    .element_children(id)
                    .into_iter()
                    .any(|c| tree.is_tag(c, "source") && tree.attr(c, "src").is_some_and(|s| !s.trim().is_empty()))
        }
        _ => false,
    }
}

fn parse_dimension(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").trim().parse::<f64>().ok()
}

/// 1x1 images and well-known beacon filenames.
pub fn is_tracking_pixel(tree: &DomTree, id: NodeId) -> bool {
    let tiny = |name: &str| tree.attr(id, name).and_then(parse_dimension).is_some_and(|v| v <= 1.0);
    if tiny("width") || tiny("height") {
        return true;
    }
    tree.attr(id, "src").is_some_and(|src| {
        let file = src.rsplit('/').next().unwrap_or(src);
        TRACKING_SRC.is_match(file)
    })
}

fn has_image_source(tree: &DomTree, id: NodeId) -> bool {
    let usable = |name: &str| tree.attr(id, name).is_some_and(|v| !v.trim().is_empty() && v.trim() != "about:blank");
    usable("src") || usable("srcset")
}

/// The only content of its parent, ignoring blank text and preserved blocks.
fn is_sole_content(tree: &DomTree, id: NodeId) -> bool {
    let Some(parent) = tree.parent(id) else {
        return false;
    };
    tree.children(parent).iter().all(|&sibling| {
        sibling == id
            || tree.is_preserved(sibling)
            || tree.text(sibling).is_some_and(|t| t.trim().is_empty())
    })
}

fn is_protected(tree: &DomTree, id: NodeId) -> bool {
    visible_descendants(tree, id).into_iter().any(|d| match tree.tag_name(d) {
        Some("table") => table_kind(tree, d) == TableKind::Data,
        Some("ul" | "ol" | "dl" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => true,
        Some(tag) => MEDIA_TAGS.contains(&tag),
        None => false,
    })
}

fn is_nav_item(tree: &DomTree, item: NodeId, keywords: &ClassKeywords) -> bool {
    let metrics = NodeMetrics::compute(tree, item, keywords);
    let plain = metrics.text_length as f64 * (1.0 - metrics.link_density);
    plain < 10.0 && metrics.link_density > 0.5
}

/// Apply the rule for `category` to one element.
pub fn decide(tree: &DomTree, id: NodeId, category: ElementCategory, config: &PostProcessConfig) -> Decision {
    use ElementCategory::*;

    if matches!(category, Text | Other) {
        return Decision::Keep;
    }
    if category == InteractiveChrome {
        return Decision::Remove;
    }

    let metrics = NodeMetrics::compute(tree, id, &config.keywords);
    let strongly_negative = metrics.class_weight <= -CLASS_WEIGHT;

    match category {
        Table => {
            if table_kind(tree, id) == TableKind::Data {
                Decision::Keep
            } else if strongly_negative {
                Decision::Remove
            } else {
                Decision::Rewrite
            }
        }
        _ if strongly_negative => Decision::Remove,
        Heading => {
            if metrics.class_weight < 0.0 || metrics.text_length == 0 {
                Decision::Remove
            } else {
                Decision::Keep
            }
        }
        Paragraph => {
            if metrics.text_length == 0 && !has_media(tree, id) {
                Decision::Remove
            } else {
                Decision::Keep
            }
        }
        Embed => {
            if is_allowed_embed(tree, id) {
                Decision::Keep
            } else {
                Decision::Remove
            }
        }
        Image => {
            if is_tracking_pixel(tree, id) {
                Decision::Remove
            } else if has_image_source(tree, id) || is_sole_content(tree, id) {
                Decision::Keep
            } else {
                Decision::Remove
            }
        }
        List => {
            let items: Vec<NodeId> = tree
                .element_children(id)
                .into_iter()
                .filter(|&c| matches!(tree.tag_name(c), Some("li" | "dt" | "dd")))
                .collect();
            if items.is_empty() {
                if metrics.text_length == 0 && !has_media(tree, id) { Decision::Remove } else { Decision::Keep }
            } else if items.iter().all(|&item| is_nav_item(tree, item, &config.keywords)) {
                Decision::Remove
            } else {
                Decision::Keep
            }
        }
        Landmark => {
            let titled_header = tree.is_tag(id, "header")
                && visible_descendants(tree, id)
                    .into_iter()
                    .any(|d| matches!(tree.tag_name(d), Some("h1" | "h2")))
                && metrics.link_density < config.max_protected_link_density;
            if titled_header { Decision::Keep } else { Decision::Remove }
        }
        Container => {
            let dense_enough = paragraph_count(tree, id) >= 1
                && metrics.link_density < config.max_link_density
                && metrics.text_length > config.min_text_length
                && metrics.class_weight >= 0.0;
            let protected = metrics.class_weight >= 0.0
                && metrics.link_density < config.max_protected_link_density
                && is_protected(tree, id);
            if dense_enough || protected { Decision::Keep } else { Decision::Remove }
        }
        Text | Other | InteractiveChrome => Decision::Keep,
    }
}

/// Remove interactive chrome and disallowed embeds across the container.
///
/// Forms survive only when they hold primary content (two or more
/// paragraphs).
pub fn clean_tags(tree: &mut DomTree, root: NodeId) -> usize {
    let mut removed = 0;
    for id in visible_descendants(tree, root) {
        if !tree.contains(id) {
            continue;
        }
        let Some(tag) = tree.tag_name(id) else {
            continue;
        };
        let doomed = if INTERACTIVE_TAGS.contains(&tag) {
            true
        } else if tag == "form" {
            paragraph_count(tree, id) < 2
        } else if EMBED_TAGS.contains(&tag) {
            !is_allowed_embed(tree, id)
        } else {
            false
        };
        if doomed {
            trace!(tag, "removed by tag-wide pass");
            tree.remove(id);
            removed += 1;
        }
    }
    removed
}

/// Post-order over `root`'s descendants, not entering data tables or
/// preserved blocks. Data tables themselves are listed; preserved blocks
/// are not.
fn cleanup_order(tree: &DomTree, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<(NodeId, bool)> = tree.children(root).iter().rev().map(|&c| (c, false)).collect();
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            out.push(id);
            continue;
        }
        if tree.is_preserved(id) {
            continue;
        }
        stack.push((id, true));
        let opaque = tree.is_tag(id, "table") && table_kind(tree, id) == TableKind::Data;
        if !opaque {
            stack.extend(tree.children(id).iter().rev().map(|&c| (c, false)));
        }
    }
    out
}

/// Drop presentational attributes, and classes unless asked to keep them.
pub fn strip_attributes(tree: &mut DomTree, root: NodeId, keep_classes: bool) {
    let mut targets = tree.descendants(root);
    targets.push(root);
    for id in targets {
        let sized = tree.tag_name(id).is_some_and(|t| SIZED_TAGS.contains(&t));
        tree.retain_attrs(id, |key, _| {
            if PRESENTATIONAL_ATTRS.contains(&key) {
                return false;
            }
            if sized && (key == "width" || key == "height") {
                return false;
            }
            keep_classes || key != "class"
        });
    }
}

/// Remove phrasing wrappers left with neither text nor child elements.
fn remove_empty_wrappers(tree: &mut DomTree, root: NodeId) -> usize {
    let mut removed = 0;
    for id in tree.post_order(root) {
        if !tree.contains(id) {
            continue;
        }
        let wrapper = tree.tag_name(id).is_some_and(|t| PHRASING_WRAPPERS.contains(&t));
        if wrapper && tree.element_children(id).is_empty() && normalize_text(&tree.text_content(id)).is_empty() {
            tree.remove(id);
            removed += 1;
        }
    }
    removed
}

/// Whether the container still has anything worth returning.
pub fn has_content(tree: &DomTree, root: NodeId) -> bool {
    !normalize_text(&tree.text_content(root)).is_empty()
        || tree
            .descendants(root)
            .into_iter()
            .any(|d| tree.tag_name(d).is_some_and(|t| MEDIA_TAGS.contains(&t)))
}

/// Clean the extracted container in place.
///
/// The container root and the winning candidate are never judged
/// themselves; everything below them is.
///
/// # Errors
///
/// Returns [`FolioError::EmptyDocument`] when nothing readable remains.
pub fn postprocess_content(
    tree: &mut DomTree, content: &ExtractedContent, config: &PostProcessConfig,
) -> Result<CleanupReport> {
    let root = content.root;
    let mut report = CleanupReport { removed: clean_tags(tree, root), ..Default::default() };

    for id in cleanup_order(tree, root) {
        if !tree.contains(id) || Some(id) == content.candidate {
            continue;
        }
        let category = categorize(tree, id);
        match decide(tree, id, category, config) {
            Decision::Keep => {}
            Decision::Rewrite => {
                flatten_layout_table(tree, id);
                report.rewritten += 1;
            }
            Decision::Remove => {
                trace!(?category, tag = tree.tag_name(id).unwrap_or_default(), "removed");
                report.removed += 1;
                if config.preserve_important_links {
                    if remove_preserving_links(tree, id, &config.link_matcher).is_some() {
                        report.preserved += 1;
                    }
                } else {
                    tree.remove(id);
                }
            }
        }
    }

    report.removed += remove_empty_wrappers(tree, root);
    strip_attributes(tree, root, config.keep_classes);

    debug!(
        removed = report.removed,
        rewritten = report.rewritten,
        preserved = report.preserved,
        "cleaned content"
    );

    if !has_content(tree, root) {
        return Err(FolioError::EmptyDocument);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::classify_tables;
    use rstest::rstest;

    const LONG: &str = "A real paragraph of prose with enough words, commas, and length to count as content.";

    fn first(tree: &DomTree, tag: &str) -> NodeId {
        tree.find_first(tree.root(), tag).unwrap()
    }

    /// Treat the body as the container, the way extraction hands it over.
    fn clean(html: &str, config: &PostProcessConfig) -> (DomTree, Result<CleanupReport>) {
        let mut tree = DomTree::parse(html);
        let root = tree.root();
        classify_tables(&mut tree, root);
        let body = tree.body().unwrap();
        let content =
            ExtractedContent { root: body, candidate: None, merged: Vec::new(), preserved: Vec::new(), top_score: 0.0 };
        let result = postprocess_content(&mut tree, &content, config);
        (tree, result)
    }

    fn text_of(tree: &DomTree) -> String {
        normalize_text(&tree.text_content(tree.root()))
    }

    #[rstest]
    #[case("<h2>t</h2>", "h2", ElementCategory::Heading)]
    #[case("<p>t</p>", "p", ElementCategory::Paragraph)]
    #[case("<section>t</section>", "section", ElementCategory::Container)]
    #[case("<span><div>t</div></span>", "span", ElementCategory::Container)]
    #[case("<p><span>t</span></p>", "span", ElementCategory::Other)]
    #[case("<table><tr><td>t</td></tr></table>", "table", ElementCategory::Table)]
    #[case("<iframe src='x'></iframe>", "iframe", ElementCategory::Embed)]
    #[case("<img src='x'>", "img", ElementCategory::Image)]
    #[case("<ol><li>t</li></ol>", "ol", ElementCategory::List)]
    #[case("<aside>t</aside>", "aside", ElementCategory::Landmark)]
    #[case("<button>t</button>", "button", ElementCategory::InteractiveChrome)]
    fn test_categorize(#[case] html: &str, #[case] tag: &str, #[case] expected: ElementCategory) {
        let tree = DomTree::parse(html);
        assert_eq!(categorize(&tree, first(&tree, tag)), expected);
    }

    #[rstest]
    #[case("https://www.youtube.com/embed/abc", true)]
    #[case("https://player.vimeo.com/video/1", true)]
    #[case("https://ads.example.com/frame", false)]
    fn test_iframe_allow_list(#[case] src: &str, #[case] expected: bool) {
        let tree = DomTree::parse(&format!("<iframe src='{src}'></iframe>"));
        assert_eq!(is_allowed_embed(&tree, first(&tree, "iframe")), expected);
    }

    #[test]
    fn test_audio_allow_list() {
        let tree = DomTree::parse("<audio controls><source src='/ep1.mp3'></audio><audio role='presentation' src='/x.mp3'></audio>");
        let audios = tree.find_all(tree.root(), "audio");
        assert!(is_allowed_embed(&tree, audios[0]));
        assert!(!is_allowed_embed(&tree, audios[1]));
    }

    #[rstest]
    #[case("<img src='/a.jpg' width='1' height='1'>", true)]
    #[case("<img src='/a.jpg' width='1px'>", true)]
    #[case("<img src='/track/pixel.gif'>", true)]
    #[case("<img src='/photos/harbor.jpg' width='640'>", false)]
    fn test_tracking_pixel(#[case] html: &str, #[case] expected: bool) {
        let tree = DomTree::parse(html);
        assert_eq!(is_tracking_pixel(&tree, first(&tree, "img")), expected);
    }

    #[test]
    fn test_container_rule() {
        let html = format!(
            "<html><body>\
             <div id='keep'><p>{LONG}</p></div>\
             <div id='links'><p><a href='/a'>{LONG}</a></p></div>\
             <div id='short'><p>Tiny</p></div>\
             <div id='bare'>{LONG}</div>\
             <div class='comments'><p>{LONG}</p></div>\
             </body></html>"
        );
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();

        let ids: Vec<&str> = tree
            .descendants(tree.root())
            .into_iter()
            .filter_map(|id| tree.attr(id, "id"))
            .collect();
        assert_eq!(ids, vec!["keep"]);
    }

    #[test]
    fn test_container_with_media_is_protected() {
        let html = format!("<html><body><p>{LONG}</p><div id='fig'><img src='/photo.jpg'></div></body></html>");
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        assert!(tree.find_first(tree.root(), "img").is_some());
    }

    #[test]
    fn test_nav_and_footer_removed() {
        let html = format!(
            "<html><body><nav><a href='/'>Home</a></nav><p>{LONG}</p><footer>Copyright</footer></body></html>"
        );
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        assert!(tree.find_first(tree.root(), "nav").is_none());
        assert!(tree.find_first(tree.root(), "footer").is_none());
        assert!(text_of(&tree).contains("real paragraph"));
    }

    #[test]
    fn test_titled_header_kept() {
        let html = format!("<html><body><header><h1>Headline</h1></header><p>{LONG}</p></body></html>");
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        assert!(tree.find_first(tree.root(), "h1").is_some());
    }

    #[test]
    fn test_titled_header_kept_with_link_preservation() {
        let html = format!(
            "<html><body><header><h1>A Much Longer Headline Here</h1><a href='/x'>Read more</a></header><nav><a href='/'>Home</a></nav><p>{LONG}</p></body></html>"
        );
        let config = PostProcessConfig { preserve_important_links: true, ..Default::default() };
        let (tree, result) = clean(&html, &config);
        result.unwrap();
        assert!(tree.find_first(tree.root(), "header").is_some());
        assert!(tree.find_first(tree.root(), "nav").is_none());
    }

    #[test]
    fn test_footer_links_preserved() {
        let html = format!(
            "<html><body><p>{LONG}</p><footer>Copyright 2024. <span>Legal</span><a href='/x'>Read more</a></footer></body></html>"
        );
        let config = PostProcessConfig { preserve_important_links: true, ..Default::default() };
        let (tree, result) = clean(&html, &config);

        assert_eq!(result.unwrap().preserved, 1);
        assert!(tree.find_first(tree.root(), "footer").is_none());
        let link = first(&tree, "a");
        assert_eq!(tree.attr(link, "href"), Some("/x"));
        assert!(!text_of(&tree).contains("Copyright"));
    }

    #[test]
    fn test_nav_list_removed_content_list_kept() {
        let html = format!(
            "<html><body><p>{LONG}</p>\
             <ul id='menu'><li><a href='/a'>Home</a></li><li><a href='/b'>About</a></li></ul>\
             <ul id='facts'><li>Rust has no garbage collector</li><li>Cargo builds crates</li></ul>\
             </body></html>"
        );
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        let lists = tree.find_all(tree.root(), "ul");
        assert_eq!(lists.len(), 1);
        assert!(text_of(&tree).contains("garbage collector"));
    }

    #[test]
    fn test_data_table_untouched() {
        let html = format!(
            "<html><body><p>{LONG}</p><table class='sidebar'><tr><th>Name</th><th>Age</th></tr>\
             <tr><td><div>Ann</div></td><td>31</td></tr><tr><td>Bob</td><td>42</td></tr></table></body></html>"
        );
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        let table = first(&tree, "table");
        assert_eq!(tree.find_all(table, "tr").len(), 3);
        assert!(tree.find_first(table, "div").is_some());
    }

    #[test]
    fn test_layout_table_flattened() {
        let html = format!("<html><body><table><tr><td><p>{LONG}</p></td></tr></table></body></html>");
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        assert_eq!(result.unwrap().rewritten, 1);
        assert!(tree.find_first(tree.root(), "table").is_none());
        assert!(text_of(&tree).contains("real paragraph"));
    }

    #[test]
    fn test_tag_wide_pass() {
        let html = format!(
            "<html><body><p>{LONG}</p><form><input name='q'><p>Search</p></form><button>Share</button>\
             <iframe src='https://ads.example.com/x'></iframe><iframe src='https://www.youtube.com/embed/v'></iframe></body></html>"
        );
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        assert!(tree.find_first(tree.root(), "form").is_none());
        assert!(tree.find_first(tree.root(), "button").is_none());
        let frames = tree.find_all(tree.root(), "iframe");
        assert_eq!(frames.len(), 1);
        assert!(tree.attr(frames[0], "src").unwrap().contains("youtube"));
    }

    #[test]
    fn test_headings_and_empty_paragraphs() {
        let html = format!("<html><body><h2 class='share'>Share this</h2><h2>Body</h2><p> </p><p>{LONG}</p></body></html>");
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        assert_eq!(tree.find_all(tree.root(), "h2").len(), 1);
        assert_eq!(tree.find_all(tree.root(), "p").len(), 1);
    }

    #[test]
    fn test_image_rules() {
        let html = format!(
            "<html><body><p>{LONG}<img src='/beacon.gif' width='1' height='1'><img src='/photo.jpg'></p>\
             <p><img></p><p>{LONG}<img></p></body></html>"
        );
        let (tree, result) = clean(&html, &PostProcessConfig::default());
        result.unwrap();
        let images = tree.find_all(tree.root(), "img");
        assert_eq!(images.len(), 2);
        assert_eq!(tree.attr(images[0], "src"), Some("/photo.jpg"));
        assert!(tree.attr(images[1], "src").is_none());
    }

    #[test]
    fn test_attributes_stripped() {
        let html = format!("<html><body><p class='lead' style='color:red' align='center'>{LONG}</p></body></html>");
        let (tree, _) = clean(&html, &PostProcessConfig::default());
        let p = first(&tree, "p");
        assert!(tree.attrs(p).is_empty());

        let config = PostProcessConfig { keep_classes: true, ..Default::default() };
        let (tree, _) = clean(&html, &config);
        let p = first(&tree, "p");
        assert_eq!(tree.attr(p, "class"), Some("lead"));
        assert!(tree.attr(p, "style").is_none());
    }

    #[test]
    fn test_empty_result_is_error() {
        let (_, result) = clean("<html><body><nav><a href='/'>Home</a></nav></body></html>", &PostProcessConfig::default());
        assert!(matches!(result, Err(FolioError::EmptyDocument)));
    }

    #[test]
    fn test_candidate_is_not_judged() {
        let mut tree = DomTree::parse("<html><body><div class='sidebar'><p>Short</p></div></body></html>");
        let body = tree.body().unwrap();
        let div = first(&tree, "div");
        let content =
            ExtractedContent { root: body, candidate: Some(div), merged: Vec::new(), preserved: Vec::new(), top_score: 0.0 };

        postprocess_content(&mut tree, &content, &PostProcessConfig::default()).unwrap();
        assert!(tree.contains(div));
    }
}
