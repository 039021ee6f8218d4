//! HTML rendering and plain-text blocks for the cleaned content.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::dom_tree::{DomTree, NodeData, NodeId};
use crate::metrics::normalize_text;

/// Attribute carrying the hex SHA-256 of an element's normalized text
pub const DIGEST_ATTR: &str = "data-content-digest";
/// Attribute carrying an element's dot-path position
pub const NODE_INDEX_ATTR: &str = "data-node-index";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];
const TEXT_BLOCK_TAGS: &[&str] = &["p", "li", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Annotations added while rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeConfig {
    pub add_content_digests: bool,
    pub add_node_indexes: bool,
}

/// One paragraph-level piece of plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_index: Option<String>,
}

/// Hex SHA-256 of the element's whitespace-normalized text.
pub fn content_digest(tree: &DomTree, id: NodeId) -> String {
    let text = normalize_text(&tree.text_content(id));
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Dot-path index for every element under and including `root`.
///
/// The root is `"0"`; each element child appends its position among its
/// element siblings.
pub fn node_indexes(tree: &DomTree, root: NodeId) -> HashMap<NodeId, String> {
    let mut indexes = HashMap::new();
    let mut stack = vec![(root, "0".to_string())];
    while let Some((id, path)) = stack.pop() {
        for (position, child) in tree.element_children(id).into_iter().enumerate() {
            stack.push((child, format!("{path}.{position}")));
        }
        indexes.insert(id, path);
    }
    indexes
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            _ => escape_text(c.encode_utf8(&mut [0; 4]), out),
        }
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_attr(value, out);
    out.push('"');
}

struct Renderer<'a> {
    tree: &'a DomTree,
    config: SerializeConfig,
    indexes: Option<HashMap<NodeId, String>>,
    out: String,
}

impl Renderer<'_> {
    fn render(&mut self, id: NodeId, raw_text: bool) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Document => {
                for &child in self.tree.children(id) {
                    self.render(child, false);
                }
            }
            NodeData::Text(text) => {
                if raw_text {
                    self.out.push_str(text);
                } else {
                    escape_text(text, &mut self.out);
                }
            }
            NodeData::Comment(_) => {}
            NodeData::Element { name, attrs } => {
                self.out.push('<');
                self.out.push_str(name);
                for (key, value) in attrs {
                    if key == DIGEST_ATTR || key == NODE_INDEX_ATTR {
                        continue;
                    }
                    push_attr(&mut self.out, key, value);
                }
                if self.config.add_content_digests {
                    let digest = content_digest(self.tree, id);
                    push_attr(&mut self.out, DIGEST_ATTR, &digest);
                }
                if let Some(index) = self.indexes.as_ref().and_then(|m| m.get(&id)) {
                    push_attr(&mut self.out, NODE_INDEX_ATTR, index);
                }
                self.out.push('>');

                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&name.as_str());
                for &child in self.tree.children(id) {
                    self.render(child, raw);
                }
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
        }
    }
}

/// Render `root` and its subtree to an HTML string.
pub fn serialize_html(tree: &DomTree, root: NodeId, config: &SerializeConfig) -> String {
    let indexes = config.add_node_indexes.then(|| node_indexes(tree, root));
    let mut renderer = Renderer { tree, config: *config, indexes, out: String::new() };
    renderer.render(root, false);
    renderer.out
}

/// Paragraph-level text blocks in document order.
///
/// Only the innermost `p`, `li` and heading elements produce blocks, so a
/// list item wrapping a paragraph yields one block. Empty blocks are skipped
/// and adjacent duplicates collapse into one.
pub fn text_blocks(tree: &DomTree, root: NodeId, with_indexes: bool) -> Vec<TextBlock> {
    let indexes = with_indexes.then(|| node_indexes(tree, root));
    let is_block = |id: NodeId| tree.tag_name(id).is_some_and(|t| TEXT_BLOCK_TAGS.contains(&t));

    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut candidates = vec![root];
    candidates.extend(tree.descendants(root));
    for id in candidates {
        if !is_block(id) || tree.descendants(id).into_iter().any(is_block) {
            continue;
        }
        let text = normalize_text(&tree.text_content(id));
        if text.is_empty() || blocks.last().is_some_and(|prev| prev.text == text) {
            continue;
        }
        let node_index = indexes.as_ref().and_then(|m| m.get(&id).cloned());
        blocks.push(TextBlock { text, node_index });
    }
    blocks
}

/// Text blocks joined by blank lines.
pub fn plain_text(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
