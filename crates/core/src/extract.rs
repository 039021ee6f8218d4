use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dom_tree::{DomTree, NodeId};
use crate::links::{LinkMatcher, build_link_block};
use crate::metrics::{link_density, normalize_text, text_length};
use crate::scoring::{is_scorable, score_of};
use crate::tables::is_data_table;
use crate::{FolioError, Result};

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Sibling score threshold (multiplier of the candidate score)
    pub sibling_threshold: f64,
    /// Floor for the sibling score threshold
    pub min_sibling_score: f64,
    /// A parent scoring at least candidate minus this is preferred
    pub parent_tolerance: f64,
    /// Minimum text for a paragraph-like sibling to join
    pub min_paragraph_chars: usize,
    /// Maximum link density for a paragraph-like sibling to join
    pub max_sibling_link_density: f64,
    /// Lift important links out of rejected siblings
    pub preserve_important_links: bool,
    /// Classifier for important links
    pub link_matcher: LinkMatcher,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            sibling_threshold: 0.2,
            min_sibling_score: 10.0,
            parent_tolerance: 2.0,
            min_paragraph_chars: 80,
            max_sibling_link_density: 0.25,
            preserve_important_links: false,
            link_matcher: LinkMatcher::default(),
        }
    }
}

/// A scored element considered as the content root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub node: NodeId,
    pub score: f64,
}

/// The detached container produced by selection.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Root of the detached content subtree
    pub root: NodeId,
    /// The winning candidate, `None` when the whole body was wrapped
    pub candidate: Option<NodeId>,
    /// Siblings merged next to the candidate, in document order
    pub merged: Vec<NodeId>,
    /// Link blocks lifted out of rejected siblings
    pub preserved: Vec<NodeId>,
    /// Candidate score after parent preference
    pub top_score: f64,
}

/// Tags that can stand as the output container without a wrapper.
const CONTENT_ROOT_TAGS: &[&str] = &["div", "article", "section", "main"];

/// Table and list parts that make no sense outside their parent.
const RENAME_TO_DIV_TAGS: &[&str] = &["td", "th", "tr", "tbody", "thead", "tfoot", "li", "dd", "dt"];

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.( |$)").expect("valid sentence regex"));

/// Highest scoring eligible element under `scope`; ties go to the first in
/// document order.
pub fn top_candidate(tree: &DomTree, scope: NodeId) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for id in tree.descendants(scope) {
        let Some(tag) = tree.tag_name(id) else {
            continue;
        };
        if !is_scorable(tag) {
            continue;
        }
        let Some(score) = score_of(tree, id) else {
            continue;
        };
        if best.is_none_or(|b| score > b.score) {
            best = Some(Candidate { node: id, score });
        }
    }
    best
}

/// Climb to the parent while it scores within `parent_tolerance` of the
/// current candidate, stopping below `body`.
pub fn prefer_parent(tree: &DomTree, candidate: Candidate, config: &ExtractConfig) -> Candidate {
    let mut current = candidate;
    while let Some(parent) = tree.parent(current.node) {
        let Some(tag) = tree.tag_name(parent) else {
            break;
        };
        if matches!(tag, "body" | "html") || !is_scorable(tag) {
            break;
        }
        match score_of(tree, parent) {
            Some(score) if score >= current.score - config.parent_tolerance => {
                current = Candidate { node: parent, score };
            }
            _ => break,
        }
    }
    current
}

/// Move a candidate sitting inside a data table up to the outermost such
/// table, so the table is carried whole. The score is kept.
pub fn lift_out_of_data_table(tree: &DomTree, candidate: Candidate) -> Candidate {
    match tree.ancestors(candidate.node).filter(|&a| is_data_table(tree, a)).last() {
        Some(table) => Candidate { node: table, score: candidate.score },
        None => candidate,
    }
}

/// A `<p>`, or an element whose text sits mostly in one descendant `<p>`.
fn is_mostly_paragraph(tree: &DomTree, id: NodeId) -> bool {
    if tree.is_tag(id, "p") {
        return true;
    }
    let total = text_length(tree, id);
    if total == 0 {
        return false;
    }
    let paragraphs = tree.find_all(id, "p");
    paragraphs.len() == 1 && text_length(tree, paragraphs[0]) as f64 >= total as f64 * 0.8
}

fn same_class(tree: &DomTree, a: NodeId, b: NodeId) -> bool {
    match (tree.attr(a, "class"), tree.attr(b, "class")) {
        (Some(x), Some(y)) => !x.trim().is_empty() && x == y,
        _ => false,
    }
}

/// Whether a sibling of the candidate belongs with the content.
pub fn should_merge_sibling(tree: &DomTree, sibling: NodeId, candidate: Candidate, config: &ExtractConfig) -> bool {
    let threshold = config.min_sibling_score.max(candidate.score * config.sibling_threshold);
    let bonus = if same_class(tree, sibling, candidate.node) { candidate.score * config.sibling_threshold } else { 0.0 };

    if let Some(score) = score_of(tree, sibling)
        && score + bonus >= threshold
    {
        return true;
    }

    let length = text_length(tree, sibling);
    let density = link_density(tree, sibling);

    if is_mostly_paragraph(tree, sibling) && density < config.max_sibling_link_density && length > config.min_paragraph_chars
    {
        return true;
    }

    tree.is_tag(sibling, "p")
        && length > 0
        && length <= config.min_paragraph_chars
        && density == 0.0
        && SENTENCE_END.is_match(&normalize_text(&tree.text_content(sibling)))
}

/// Select the main content and move it into a detached container.
///
/// Scores must already be on the tree. The candidate itself becomes the
/// container when it is a content root and nothing joins it; otherwise a
/// `<div>` wraps the candidate, merged siblings and any preserved link blocks
/// in document order. With no scored candidate, the body's children are
/// wrapped instead.
pub fn extract_content(tree: &mut DomTree, config: &ExtractConfig) -> Result<ExtractedContent> {
    let body = tree.body().ok_or(FolioError::EmptyDocument)?;

    let Some(initial) = top_candidate(tree, body) else {
        if tree.children(body).is_empty() {
            return Err(FolioError::EmptyDocument);
        }
        debug!("no scored candidate, using whole body");
        let wrapper = tree.create_element("div");
        for child in tree.children(body).to_vec() {
            tree.append_child(wrapper, child);
        }
        return Ok(ExtractedContent {
            root: wrapper,
            candidate: None,
            merged: Vec::new(),
            preserved: Vec::new(),
            top_score: 0.0,
        });
    };

    let candidate = prefer_parent(tree, lift_out_of_data_table(tree, initial), config);
    debug!(
        tag = tree.tag_name(candidate.node).unwrap_or_default(),
        score = candidate.score,
        "selected top candidate"
    );

    let (before, after) = tree.element_siblings(candidate.node);
    let mut items = Vec::new();
    let mut merged = Vec::new();
    let mut preserved = Vec::new();

    for sibling in before.into_iter().chain([candidate.node]).chain(after) {
        if sibling == candidate.node {
            items.push(sibling);
        } else if should_merge_sibling(tree, sibling, candidate, config) {
            items.push(sibling);
            merged.push(sibling);
        } else if config.preserve_important_links
            && let Some(block) = build_link_block(tree, sibling, &config.link_matcher)
        {
            items.push(block);
            preserved.push(block);
        }
    }

    for &item in &items {
        if tree.tag_name(item).is_some_and(|tag| RENAME_TO_DIV_TAGS.contains(&tag)) {
            tree.rename(item, "div");
        }
    }

    let is_content_root = tree
        .tag_name(candidate.node)
        .is_some_and(|tag| CONTENT_ROOT_TAGS.contains(&tag));

    let root = if is_content_root && merged.is_empty() && preserved.is_empty() {
        tree.detach(candidate.node);
        candidate.node
    } else {
        let wrapper = tree.create_element("div");
        for item in items {
            tree.append_child(wrapper, item);
        }
        wrapper
    };

    debug!(merged = merged.len(), preserved = preserved.len(), "built content container");
    Ok(ExtractedContent { root, candidate: Some(candidate.node), merged, preserved, top_score: candidate.score })
}
