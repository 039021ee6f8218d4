//! Mutable arena tree used by the extraction pipeline.
//!
//! `scraper` builds an immutable tree; the scoring and cleanup stages need to
//! rename, move and drop nodes, so the parsed document is copied into a
//! [`DomTree`]. Nodes live in a vector of slots and refer to each other by
//! [`NodeId`]. A node owns its ordered child list; the parent link is only
//! used for upward lookups. Removing a node detaches it and frees every slot
//! in its subtree.

use scraper::{Html, Node};

use crate::tables::TableKind;

/// Handle to a node slot in a [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Slot index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element { name: String, attrs: Vec<(String, String)> },
    Text(String),
    Comment(String),
}

/// A node in the DOM tree
#[derive(Debug, Clone)]
pub struct DomNode {
    pub data: NodeData,
    /// Parent node ID (if attached)
    pub parent: Option<NodeId>,
    /// Child node IDs in document order
    pub children: Vec<NodeId>,
    /// Content score, absent until the scorer reaches this node
    pub score: Option<f64>,
    /// Classification recorded by the table pre-pass
    pub table_kind: Option<TableKind>,
    /// Set on link blocks re-inserted by link preservation
    pub preserved: bool,
}

impl DomNode {
    fn new(data: NodeData) -> Self {
        Self { data, parent: None, children: Vec::new(), score: None, table_kind: None, preserved: false }
    }
}

/// Arena-backed document tree.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Option<DomNode>>,
    root: NodeId,
}

impl DomTree {
    /// Create a tree holding only a document node.
    pub fn new() -> Self {
        Self { nodes: vec![Some(DomNode::new(NodeData::Document))], root: NodeId(0) }
    }

    /// Parse markup with html5ever and copy the result into an arena.
    ///
    /// Tree construction never fails; malformed markup is recovered the way
    /// browsers do.
    pub fn parse(html: &str) -> Self {
        Self::from_html(&Html::parse_document(html))
    }

    /// Copy an already parsed `scraper` document.
    pub fn from_html(html: &Html) -> Self {
        let mut tree = Self::new();
        let root = tree.root;
        let mut stack: Vec<_> = html.tree.root().children().rev().map(|child| (child, root)).collect();

        while let Some((node_ref, parent)) = stack.pop() {
            let data = match node_ref.value() {
                Node::Element(el) => NodeData::Element {
                    name: el.name().to_lowercase(),
                    attrs: el
                        .attrs()
                        .map(|(name, value)| (name.to_lowercase(), value.to_string()))
                        .collect(),
                },
                Node::Text(text) => NodeData::Text(text.text.to_string()),
                Node::Comment(comment) => NodeData::Comment(comment.comment.to_string()),
                _ => continue,
            };

            let id = tree.push(DomNode::new(data));
            tree.attach(parent, id, None);
            stack.extend(node_ref.children().rev().map(|child| (child, id)));
        }

        tree
    }

    fn push(&mut self, node: DomNode) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID, `None` once it has been removed.
    pub fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Whether the slot still holds a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowercase tag name for element nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some()
    }

    /// Whether `id` is an element with tag `name`.
    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id) == Some(name)
    }

    /// Raw payload of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.get(id).map(|n| &n.data), Some(NodeData::Comment(_)))
    }

    pub fn is_preserved(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.preserved)
    }

    /// Attributes of an element, empty for other node kinds.
    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(DomNode { data: NodeData::Element { attrs, .. }, .. }) = self.get_mut(id) {
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.retain_attrs(id, |key, _| key != name);
    }

    /// Keep only the attributes for which `keep` returns true.
    pub fn retain_attrs<F>(&mut self, id: NodeId, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        if let Some(DomNode { data: NodeData::Element { attrs, .. }, .. }) = self.get_mut(id) {
            attrs.retain(|(key, value)| keep(key, value));
        }
    }

    /// Change an element's tag name, keeping attributes and children.
    pub fn rename(&mut self, id: NodeId, new_name: &str) {
        if let Some(DomNode { data: NodeData::Element { name, .. }, .. }) = self.get_mut(id) {
            *name = new_name.to_string();
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    /// Element siblings before and after `id`, in document order.
    pub fn element_siblings(&self, id: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
        let Some(parent) = self.parent(id) else {
            return (Vec::new(), Vec::new());
        };
        let siblings = self.element_children(parent);
        match siblings.iter().position(|&s| s == id) {
            Some(pos) => (siblings[..pos].to_vec(), siblings[pos + 1..].to_vec()),
            None => (Vec::new(), Vec::new()),
        }
    }

    /// The sibling node immediately before `id`, of any kind.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&s| s == id)?;
        pos.checked_sub(1).map(|prev| siblings[prev])
    }

    /// The sibling node immediately after `id`, of any kind.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&s| s == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Iterate parent, grandparent, and so on up to the document node.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// All descendants of `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Descendants of `id` in post-order (children before parents),
    /// excluding `id` itself.
    pub fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, bool)> = self.children(id).iter().rev().map(|&c| (c, false)).collect();
        while let Some((next, expanded)) = stack.pop() {
            if expanded {
                out.push(next);
            } else {
                stack.push((next, true));
                stack.extend(self.children(next).iter().rev().map(|&c| (c, false)));
            }
        }
        out
    }

    /// Descendant elements of `id` with the given tag, in document order.
    pub fn find_all(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&d| self.is_tag(d, tag))
            .collect()
    }

    pub fn find_first(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(id).into_iter().find(|&d| self.is_tag(d, tag))
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        self.find_first(self.root, "body")
    }

    /// Concatenated raw text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.text(d))
            .collect()
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(DomNode::new(NodeData::Element { name: name.to_string(), attrs: Vec::new() }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(DomNode::new(NodeData::Text(text.to_string())))
    }

    /// Deep-copy a subtree into new detached slots.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let source = self.get(id)?;
        let mut copy = DomNode::new(source.data.clone());
        copy.preserved = source.preserved;
        copy.table_kind = source.table_kind;
        let children = source.children.clone();

        let new_id = self.push(copy);
        for child in children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.attach(new_id, child_copy, None);
            }
        }
        Some(new_id)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) {
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            match position {
                Some(pos) if pos <= node.children.len() => node.children.insert(pos, child),
                _ => node.children.push(child),
            }
        }
    }

    /// Unlink `id` from its parent; the subtree stays alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if child == parent || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        self.attach(parent, child, None);
    }

    /// Move `node` so it sits immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if node == reference || self.is_ancestor(node, parent) || node == parent {
            return;
        }
        self.detach(node);
        let pos = self.children(parent).iter().position(|&c| c == reference);
        self.attach(parent, node, pos);
    }

    /// Put `replacement` where `id` is and drop `id`'s subtree.
    pub fn replace_with(&mut self, id: NodeId, replacement: NodeId) {
        self.insert_before(id, replacement);
        self.remove(id);
    }

    /// Detach `id` and free every slot in its subtree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for slot in doomed {
            if let Some(entry) = self.nodes.get_mut(slot.0) {
                *entry = None;
            }
        }
    }

    /// Replace an element with its own children.
    pub fn unwrap(&mut self, id: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        for child in self.children(id).to_vec() {
            self.insert_before(id, child);
        }
        self.remove(id);
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Tags that start a new block when they appear as a child.
pub const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "ul",
];

pub fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}
