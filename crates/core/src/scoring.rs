use tracing::trace;

use crate::dom_tree::{DomTree, NodeId};
use crate::metrics::{ClassKeywords, class_weight, comma_count, text_length};
use crate::tables::{TableKind, table_kind};

/// Configuration for content scoring algorithm
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Class/id keyword sets used for class weight
    pub keywords: ClassKeywords,
    /// Number of ancestor levels that receive a share of each score
    pub propagation_depth: usize,
    /// Characters per point for content length scoring
    pub chars_per_point: usize,
    /// Maximum content length score
    pub max_length_score: f64,
    /// Base score given to layout tables so their wrappers rank lower
    pub layout_table_penalty: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            keywords: ClassKeywords::default(),
            propagation_depth: 3,
            chars_per_point: 100,
            max_length_score: 3.0,
            layout_table_penalty: -5.0,
        }
    }
}

/// Tags that receive a base score of their own.
pub const SCORABLE_TAGS: &[&str] = &[
    "article", "section", "main", "div", "p", "pre", "td", "blockquote", "header", "footer", "nav", "aside", "address",
];

pub fn is_scorable(tag: &str) -> bool {
    SCORABLE_TAGS.contains(&tag)
}

/// Components of a node's base score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub tag_score: f64,
    pub class_weight: f64,
    pub comma_score: f64,
    pub length_score: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.tag_score + self.class_weight + self.comma_score + self.length_score
    }
}

/// Calculate the base score for an element based on its tag name
///
/// - ARTICLE, SECTION: +25
/// - DIV: +5
/// - PRE, TD, BLOCKQUOTE: +3
/// - HEADER, FOOTER, NAV, ASIDE, ADDRESS: -3
pub fn base_tag_score(tag: &str) -> f64 {
    match tag {
        "article" | "section" => 25.0,
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "header" | "footer" | "nav" | "aside" | "address" => -3.0,
        _ => 0.0,
    }
}

/// Base score of one element before propagation.
///
/// Returns `None` for tags outside [`SCORABLE_TAGS`] and for elements without
/// any text. Link density is deliberately absent; cleanup filters on it.
pub fn score_breakdown(tree: &DomTree, id: NodeId, config: &ScoreConfig) -> Option<ScoreBreakdown> {
    let tag = tree.tag_name(id)?;
    if !is_scorable(tag) {
        return None;
    }

    let length = text_length(tree, id);
    if length == 0 {
        return None;
    }

    let per_point = config.chars_per_point.max(1);
    Some(ScoreBreakdown {
        tag_score: base_tag_score(tag),
        class_weight: class_weight(tree, id, &config.keywords),
        comma_score: comma_count(tree, id) as f64,
        length_score: ((length / per_point) as f64).min(config.max_length_score),
    })
}

/// Share of a base score credited to the ancestor `level` steps up.
pub fn propagation_share(score: f64, level: usize) -> f64 {
    match level {
        0 => 0.0,
        1 => score,
        2 => score / 2.0,
        n => score / (2.0 * n as f64),
    }
}

fn stops_propagation(tree: &DomTree, id: NodeId) -> bool {
    matches!(tree.tag_name(id), None | Some("body" | "html"))
}

fn add_score(tree: &mut DomTree, id: NodeId, amount: f64) {
    if let Some(node) = tree.get_mut(id) {
        node.score = Some(node.score.unwrap_or(0.0) + amount);
    }
}

/// Score every element under `root`, children before parents, and credit
/// each base score to up to `propagation_depth` ancestors.
///
/// Scores are stored on the nodes. Returns the number of elements that
/// received a base score.
pub fn score_tree(tree: &mut DomTree, root: NodeId, config: &ScoreConfig) -> usize {
    let mut scored = 0;

    for id in tree.post_order(root) {
        let base = if tree.is_tag(id, "table") && table_kind(tree, id) == TableKind::Layout {
            Some(config.layout_table_penalty)
        } else {
            score_breakdown(tree, id, config).map(|b| b.total())
        };
        let Some(base) = base else {
            continue;
        };

        scored += 1;
        add_score(tree, id, base);

        let ancestors: Vec<NodeId> = tree
            .ancestors(id)
            .take_while(|&a| !stops_propagation(tree, a))
            .take(config.propagation_depth)
            .collect();
        for (i, ancestor) in ancestors.into_iter().enumerate() {
            add_score(tree, ancestor, propagation_share(base, i + 1));
        }
    }

    trace!(scored, "scored elements");
    scored
}

pub fn score_of(tree: &DomTree, id: NodeId) -> Option<f64> {
    tree.get(id).and_then(|n| n.score)
}
