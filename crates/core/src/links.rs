//! Important link detection and re-insertion.
//!
//! When boilerplate such as a footer is removed, "read more" style anchors
//! inside it can still point at the rest of the story. With link
//! preservation enabled those anchors are lifted out, together with one
//! preceding text node for context, into a small `<p>` block that takes the
//! removed element's place.

use tracing::debug;

use crate::dom_tree::{DomTree, NodeId};
use crate::metrics::{normalize_text, visible_descendants};

/// Anchor texts that mark an important link.
pub const IMPORTANT_LINK_PHRASES: &[&str] = &[
    "more",
    "read more",
    "more information",
    "continue reading",
    "see more",
    "view more",
    "read full",
    "see also",
    "\u{2026}",
];

const TRAILING_DECORATION: &[char] = &['\u{bb}', '\u{203a}', '\u{2192}', '>', ':', '.', '!', '\u{2014}', '-'];

/// Classifier for important anchor text.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkMatcher {
    phrases: Vec<String>,
}

impl Default for LinkMatcher {
    fn default() -> Self {
        Self::new(IMPORTANT_LINK_PHRASES.iter().map(|s| s.to_string()))
    }
}

impl LinkMatcher {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { phrases: phrases.into_iter().map(|p| normalize_text(&p.into()).to_lowercase()).collect() }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Whether anchor text reads like a "read more" link.
    pub fn is_important_text(&self, text: &str) -> bool {
        let text = normalize_text(text).to_lowercase();
        if text.is_empty() {
            return false;
        }
        if text.ends_with('\u{2026}') || text.ends_with("...") {
            return true;
        }

        let stripped = text.trim_end_matches(TRAILING_DECORATION).trim_end();
        if stripped.is_empty() {
            return false;
        }

        for phrase in &self.phrases {
            if stripped == phrase {
                return true;
            }
            if phrase.contains(' ') && stripped.starts_with(phrase.as_str()) {
                let rest = &stripped[phrase.len()..];
                if rest.starts_with([' ', ':']) {
                    return true;
                }
            }
        }

        let words: Vec<&str> = stripped
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .collect();
        words.len() <= 3 && words.contains(&"more")
    }

    /// Whether an `<a>` element is important and has somewhere to go.
    pub fn is_important(&self, tree: &DomTree, anchor: NodeId) -> bool {
        tree.is_tag(anchor, "a") && has_usable_href(tree, anchor) && self.is_important_text(&tree.text_content(anchor))
    }

    /// Important anchors under `id`, in document order.
    pub fn find_important_links(&self, tree: &DomTree, id: NodeId) -> Vec<NodeId> {
        let mut candidates = vec![id];
        candidates.extend(visible_descendants(tree, id));
        candidates
            .into_iter()
            .filter(|&node| self.is_important(tree, node))
            .collect()
    }
}

fn has_usable_href(tree: &DomTree, anchor: NodeId) -> bool {
    match tree.attr(anchor, "href").map(str::trim) {
        Some(href) => !href.is_empty() && href != "#" && !href.to_ascii_lowercase().starts_with("javascript:"),
        None => false,
    }
}

/// Build a detached, preserved `<p>` holding copies of the important links
/// under `id` and their context. Returns `None` when nothing qualifies.
pub fn build_link_block(tree: &mut DomTree, id: NodeId, matcher: &LinkMatcher) -> Option<NodeId> {
    let anchors = matcher.find_important_links(tree, id);
    if anchors.is_empty() {
        return None;
    }

    let block = tree.create_element("p");
    for (i, anchor) in anchors.into_iter().enumerate() {
        if i > 0 {
            let gap = tree.create_text(" ");
            tree.append_child(block, gap);
        }

        let context = tree
            .previous_sibling(anchor)
            .and_then(|prev| tree.text(prev))
            .map(normalize_text)
            .filter(|text| !text.is_empty());
        if let Some(context) = context {
            let text = tree.create_text(&format!("{context} "));
            tree.append_child(block, text);
        }

        if let Some(copy) = tree.clone_subtree(anchor) {
            tree.append_child(block, copy);
        }
    }

    if let Some(node) = tree.get_mut(block) {
        node.preserved = true;
    }
    Some(block)
}

/// Remove `id`, leaving a preserved link block in its place when it holds
/// important links. Returns the inserted block.
pub fn remove_preserving_links(tree: &mut DomTree, id: NodeId, matcher: &LinkMatcher) -> Option<NodeId> {
    let block = build_link_block(tree, id, matcher);
    match block {
        Some(block) => {
            debug!(tag = tree.tag_name(id).unwrap_or_default(), "kept important links from removed element");
            tree.replace_with(id, block);
        }
        None => tree.remove(id),
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Read more", true)]
    #[case("  READ MORE  ", true)]
    #[case("Read more \u{bb}", true)]
    #[case("Continue reading", true)]
    #[case("Continue reading: The full story", true)]
    #[case("More", true)]
    #[case("Learn more", true)]
    #[case("See also", true)]
    #[case("Full coverage\u{2026}", true)]
    #[case("The rest of the article...", true)]
    #[case("\u{2026}", true)]
    #[case("Home", false)]
    #[case("Privacy policy", false)]
    #[case("Why we need more housing in cities", false)]
    #[case("", false)]
    #[case("readmore", false)]
    fn test_is_important_text(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(LinkMatcher::default().is_important_text(text), expected);
    }

    #[test]
    fn test_custom_phrases() {
        let matcher = LinkMatcher::new(["Full story"]);
        assert!(matcher.is_important_text("full story"));
        assert!(!matcher.is_important_text("continue reading"));
        assert!(matcher.is_important_text("more"));
    }

    #[rstest]
    #[case(r#"<a href="/x">Read more</a>"#, true)]
    #[case(r##"<a href="#">Read more</a>"##, false)]
    #[case(r#"<a href="javascript:void(0)">Read more</a>"#, false)]
    #[case(r#"<a>Read more</a>"#, false)]
    fn test_is_important_requires_href(#[case] html: &str, #[case] expected: bool) {
        let tree = DomTree::parse(html);
        let anchor = tree.find_first(tree.root(), "a").unwrap();
        assert_eq!(LinkMatcher::default().is_important(&tree, anchor), expected);
    }

    #[test]
    fn test_block_keeps_preceding_text() {
        let html = r#"<html><body><footer>Copyright. <span>x</span>Read the full story: <a href="/s">Read more</a></footer></body></html>"#;
        let mut tree = DomTree::parse(html);
        let footer = tree.find_first(tree.root(), "footer").unwrap();

        let block = build_link_block(&mut tree, footer, &LinkMatcher::default()).unwrap();

        assert!(tree.is_preserved(block));
        assert_eq!(normalize_text(&tree.text_content(block)), "Read the full story: Read more");
        let copy = tree.find_first(block, "a").unwrap();
        assert_eq!(tree.attr(copy, "href"), Some("/s"));
    }

    #[test]
    fn test_remove_without_links() {
        let mut tree = DomTree::parse("<html><body><nav><a href='/'>Home</a></nav><p>Body</p></body></html>");
        let nav = tree.find_first(tree.root(), "nav").unwrap();

        let block = remove_preserving_links(&mut tree, nav, &LinkMatcher::default());

        assert!(block.is_none());
        assert!(tree.find_first(tree.root(), "nav").is_none());
        assert!(tree.find_first(tree.root(), "a").is_none());
    }

    #[test]
    fn test_remove_splices_block_in_place() {
        let html = r#"<html><body><p>Before</p><footer>Legal<a href="/x">Read more</a></footer><p>After</p></body></html>"#;
        let mut tree = DomTree::parse(html);
        let footer = tree.find_first(tree.root(), "footer").unwrap();

        let block = remove_preserving_links(&mut tree, footer, &LinkMatcher::default()).unwrap();

        let body = tree.body().unwrap();
        let children = tree.element_children(body);
        assert_eq!(children.len(), 3);
        assert_eq!(children[1], block);
        assert!(tree.find_first(tree.root(), "footer").is_none());
    }
}
