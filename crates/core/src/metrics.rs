//! Per-node text statistics shared by scoring, selection and cleanup.
//!
//! Metrics are computed on demand from the current tree state and never
//! cached. Subtrees flagged as preserved link blocks are invisible here, so
//! re-inserted links never change a density decision.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom_tree::{DomTree, NodeId};

/// Class/id fragments that suggest main content.
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "article", "body", "content", "entry", "hentry", "h-entry", "main", "page", "post", "text", "blog", "story",
];

/// Class/id fragments that suggest boilerplate.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "ad", "ads", "advert", "agegate", "banner", "breadcrumb", "combx", "comment", "community", "contact", "disqus",
    "footer", "gdpr", "masthead", "menu", "nav", "navbar", "navigation", "outbrain", "pager", "pagination", "popup",
    "promo", "related", "remark", "rss", "share", "shoutbox", "sidebar", "skyscraper", "social", "sponsor", "tags",
    "widget",
];

/// Keywords this short only match a whole class/id token.
const SHORT_KEYWORD_LEN: usize = 3;

const COMMAS: &[char] = &[',', '\u{060C}', '\u{FE50}', '\u{FE10}', '\u{FE11}', '\u{2E41}', '\u{2E34}', '\u{2E32}', '\u{FF0C}'];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[\w'-]+\b").expect("valid word regex"));

/// Positive and negative class/id keyword sets.
///
/// Defaults to [`POSITIVE_KEYWORDS`] and [`NEGATIVE_KEYWORDS`]; pass a custom
/// set through configuration to override them.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassKeywords {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for ClassKeywords {
    fn default() -> Self {
        Self {
            positive: POSITIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            negative: NEGATIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClassKeywords {
    /// Class weight for a combined class/id string: +25 on a positive
    /// match, -25 on a negative match, both applied independently.
    pub fn weight(&self, class_and_id: &str) -> f64 {
        let haystack = class_and_id.to_lowercase();
        let mut weight = 0.0;
        if self.positive.iter().any(|k| keyword_matches(&haystack, k)) {
            weight += CLASS_WEIGHT;
        }
        if self.negative.iter().any(|k| keyword_matches(&haystack, k)) {
            weight -= CLASS_WEIGHT;
        }
        weight
    }
}

/// Magnitude of a single keyword match.
pub const CLASS_WEIGHT: f64 = 25.0;

fn keyword_matches(haystack: &str, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    if keyword.is_empty() {
        return false;
    }
    if keyword.chars().count() <= SHORT_KEYWORD_LEN {
        haystack
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .any(|token| token == keyword)
    } else {
        haystack.contains(&keyword)
    }
}

/// Statistics for one element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeMetrics {
    /// Characters of whitespace-collapsed descendant text.
    pub text_length: usize,
    /// Share of `text_length` that sits inside `<a>` elements.
    pub link_density: f64,
    /// Sum of keyword adjustments, in -25..=25.
    pub class_weight: f64,
    /// Commas in the element's own text children.
    pub comma_count: usize,
}

impl NodeMetrics {
    pub fn compute(tree: &DomTree, id: NodeId, keywords: &ClassKeywords) -> Self {
        let text_length = text_length(tree, id);
        Self {
            text_length,
            link_density: link_density_with_length(tree, id, text_length),
            class_weight: class_weight(tree, id, keywords),
            comma_count: comma_count(tree, id),
        }
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Descendants of `id` in document order, skipping preserved subtrees.
pub fn visible_descendants(tree: &DomTree, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(id).iter().rev().copied().collect();
    while let Some(next) = stack.pop() {
        if tree.is_preserved(next) {
            continue;
        }
        out.push(next);
        stack.extend(tree.children(next).iter().rev().copied());
    }
    out
}

/// Raw text of `id`, ignoring preserved subtrees.
pub fn visible_text(tree: &DomTree, id: NodeId) -> String {
    if let Some(text) = tree.text(id) {
        return text.to_string();
    }
    visible_descendants(tree, id)
        .into_iter()
        .filter_map(|d| tree.text(d))
        .collect()
}

pub fn text_length(tree: &DomTree, id: NodeId) -> usize {
    normalize_text(&visible_text(tree, id)).chars().count()
}

pub fn link_density(tree: &DomTree, id: NodeId) -> f64 {
    link_density_with_length(tree, id, text_length(tree, id))
}

fn link_density_with_length(tree: &DomTree, id: NodeId, text_length: usize) -> f64 {
    if text_length == 0 {
        return 0.0;
    }
    if tree.is_tag(id, "a") {
        return 1.0;
    }

    let mut link_length = 0;
    let mut stack: Vec<NodeId> = tree.children(id).to_vec();
    while let Some(next) = stack.pop() {
        if tree.is_preserved(next) {
            continue;
        }
        if tree.is_tag(next, "a") {
            link_length += text_length_of(tree, next);
        } else {
            stack.extend(tree.children(next).iter().copied());
        }
    }

    (link_length as f64 / text_length as f64).min(1.0)
}

fn text_length_of(tree: &DomTree, id: NodeId) -> usize {
    normalize_text(&visible_text(tree, id)).chars().count()
}

pub fn class_weight(tree: &DomTree, id: NodeId, keywords: &ClassKeywords) -> f64 {
    let class = tree.attr(id, "class").unwrap_or("");
    let element_id = tree.attr(id, "id").unwrap_or("");
    if class.is_empty() && element_id.is_empty() {
        return 0.0;
    }
    keywords.weight(&format!("{class} {element_id}"))
}

/// Commas in direct text children only.
pub fn comma_count(tree: &DomTree, id: NodeId) -> usize {
    tree.children(id)
        .iter()
        .filter_map(|&c| tree.text(c))
        .map(|text| text.chars().filter(|c| COMMAS.contains(c)).count())
        .sum()
}

/// Paragraph-like descendants: `p`, `pre` and `blockquote`.
pub fn paragraph_count(tree: &DomTree, id: NodeId) -> usize {
    visible_descendants(tree, id)
        .into_iter()
        .filter(|&d| matches!(tree.tag_name(d), Some("p" | "pre" | "blockquote")))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn element_with_id(tree: &DomTree, value: &str) -> NodeId {
        tree.descendants(tree.root())
            .into_iter()
            .find(|&id| tree.attr(id, "id") == Some(value))
            .unwrap()
    }

    #[test]
    fn test_text_length_normalizes_whitespace() {
        let tree = DomTree::parse("<div id='t'>  Hello \n\n   world  <span>again</span></div>");
        let div = element_with_id(&tree, "t");
        assert_eq!(text_length(&tree, div), "Hello world again".len());
    }

    #[test]
    fn test_link_density() {
        let tree = DomTree::parse("<div id='t'>Some text <a href='/x'>link</a></div>");
        let div = element_with_id(&tree, "t");
        let density = link_density(&tree, div);
        assert!((density - 4.0 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_link_density_empty_is_zero() {
        let tree = DomTree::parse("<div id='t'>   </div>");
        let div = element_with_id(&tree, "t");
        assert_eq!(link_density(&tree, div), 0.0);
    }

    #[test]
    fn test_link_density_all_links() {
        let tree = DomTree::parse("<ul id='t'><li><a href='/a'>Home</a></li><li><a href='/b'>About</a></li></ul>");
        let list = element_with_id(&tree, "t");
        assert!(link_density(&tree, list) > 0.99);
    }

    #[rstest]
    #[case::positive("article-body", 25.0)]
    #[case::negative("sidebar", -25.0)]
    #[case::both("content sidebar", 0.0)]
    #[case::neutral("wrapper", 0.0)]
    #[case::short_token("top-ad", -25.0)]
    #[case::short_inside_word("shadow", 0.0)]
    #[case::case_insensitive("MainContent", 25.0)]
    fn test_class_weight(#[case] class: &str, #[case] expected: f64) {
        let html = format!("<div id='t' class='{class}'>x</div>");
        let tree = DomTree::parse(&html);
        let div = element_with_id(&tree, "t");
        assert_eq!(class_weight(&tree, div, &ClassKeywords::default()), expected);
    }

    #[test]
    fn test_class_weight_uses_id() {
        let tree = DomTree::parse("<div id='comments'>x</div>");
        let div = element_with_id(&tree, "comments");
        assert_eq!(class_weight(&tree, div, &ClassKeywords::default()), -25.0);
    }

    #[test]
    fn test_custom_keywords() {
        let keywords = ClassKeywords { positive: vec!["prose".into()], negative: vec!["chrome".into()] };
        assert_eq!(keywords.weight("prose-block"), 25.0);
        assert_eq!(keywords.weight("chrome"), -25.0);
        assert_eq!(keywords.weight("sidebar"), 0.0);
    }

    #[test]
    fn test_comma_count_direct_text_only() {
        let tree = DomTree::parse("<div id='t'>a, b, c<p>d, e</p></div>");
        let div = element_with_id(&tree, "t");
        assert_eq!(comma_count(&tree, div), 2);
    }

    #[test]
    fn test_comma_count_unicode() {
        let tree = DomTree::parse("<p id='t'>一，二، three</p>");
        let p = element_with_id(&tree, "t");
        assert_eq!(comma_count(&tree, p), 2);
    }

    #[test]
    fn test_preserved_subtree_is_invisible() {
        let mut tree = DomTree::parse("<div id='t'>Plain words here</div>");
        let div = element_with_id(&tree, "t");
        let before = NodeMetrics::compute(&tree, div, &ClassKeywords::default());

        let block = tree.create_element("p");
        let link = tree.create_element("a");
        let text = tree.create_text("Read more");
        tree.append_child(link, text);
        tree.append_child(block, link);
        tree.append_child(div, block);
        tree.get_mut(block).unwrap().preserved = true;

        let after = NodeMetrics::compute(&tree, div, &ClassKeywords::default());
        assert_eq!(before, after);
        assert_eq!(paragraph_count(&tree, div), 0);
    }

    #[test]
    fn test_paragraph_count() {
        let tree = DomTree::parse("<div id='t'><p>a</p><pre>b</pre><blockquote><p>c</p></blockquote></div>");
        let div = element_with_id(&tree, "t");
        assert_eq!(paragraph_count(&tree, div), 4);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("Hello, world! It's a test-case."), 5);
    }
}
