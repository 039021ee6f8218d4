//! Data vs. layout table classification and layout table flattening.

use tracing::trace;

use crate::dom_tree::{DomTree, NodeId, is_block_tag};

/// What a `<table>` is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Genuine tabular data; kept verbatim.
    Data,
    /// Visual positioning only; flattened during cleanup.
    Layout,
}

const SECTION_TAGS: &[&str] = &["thead", "tbody", "tfoot"];

/// Rows belonging to this table, not to a nested one.
fn own_rows(tree: &DomTree, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    for child in tree.element_children(table) {
        match tree.tag_name(child) {
            Some("tr") => rows.push(child),
            Some(tag) if SECTION_TAGS.contains(&tag) => {
                rows.extend(tree.element_children(child).into_iter().filter(|&r| tree.is_tag(r, "tr")));
            }
            _ => {}
        }
    }
    rows
}

fn row_cells(tree: &DomTree, row: NodeId) -> Vec<NodeId> {
    tree.element_children(row)
        .into_iter()
        .filter(|&c| matches!(tree.tag_name(c), Some("td" | "th")))
        .collect()
}

/// Column count of a row, honoring `colspan`. Unparsable spans count as one.
fn column_count(tree: &DomTree, row: NodeId) -> usize {
    row_cells(tree, row)
        .into_iter()
        .map(|cell| {
            tree.attr(cell, "colspan")
                .and_then(|span| span.trim().parse::<usize>().ok())
                .filter(|&span| span > 0)
                .unwrap_or(1)
        })
        .sum()
}

/// Decide whether a table carries data or only layout.
///
/// A caption or a header cell always means data. Otherwise a table is data
/// when it is not marked presentational and either has a `summary` or forms a
/// regular grid (no nested tables, two or more rows, two or more columns,
/// column counts differing by at most one).
pub fn classify_table(tree: &DomTree, table: NodeId) -> TableKind {
    let rows = own_rows(tree, table);

    let has_caption = tree.element_children(table).into_iter().any(|c| tree.is_tag(c, "caption"));
    let has_header_cell = rows
        .iter()
        .any(|&row| row_cells(tree, row).into_iter().any(|cell| tree.is_tag(cell, "th")));
    if has_caption || has_header_cell {
        return TableKind::Data;
    }

    let presentational = tree
        .attr(table, "role")
        .is_some_and(|role| role.trim().eq_ignore_ascii_case("presentation"));
    if presentational {
        return TableKind::Layout;
    }

    if tree.attr(table, "summary").is_some_and(|s| !s.trim().is_empty()) {
        return TableKind::Data;
    }

    if tree.find_first(table, "table").is_some() || rows.len() < 2 {
        return TableKind::Layout;
    }

    let counts: Vec<usize> = rows.iter().map(|&row| column_count(tree, row)).collect();
    let min = counts.iter().copied().min().unwrap_or(0);
    let max = counts.iter().copied().max().unwrap_or(0);

    if min >= 2 && max - min <= 1 { TableKind::Data } else { TableKind::Layout }
}

/// Classify every table under `root` and record the result on the node.
pub fn classify_tables(tree: &mut DomTree, root: NodeId) {
    for table in tree.find_all(root, "table") {
        let kind = classify_table(tree, table);
        trace!(?kind, "classified table");
        if let Some(node) = tree.get_mut(table) {
            node.table_kind = Some(kind);
        }
    }
}

/// Recorded kind, classifying on the spot for tables created after the pre-pass.
pub fn table_kind(tree: &DomTree, table: NodeId) -> TableKind {
    tree.get(table)
        .and_then(|n| n.table_kind)
        .unwrap_or_else(|| classify_table(tree, table))
}

pub fn is_data_table(tree: &DomTree, id: NodeId) -> bool {
    tree.is_tag(id, "table") && table_kind(tree, id) == TableKind::Data
}

/// Rewrite a layout table into plain block markup.
///
/// Rows become `<div>`s and cells become `<span>`s (or `<div>`s when they
/// hold block content) separated by a space, so text order survives while
/// grid semantics go away. Nested layout tables are flattened first; data
/// tables are left alone.
pub fn flatten_layout_table(tree: &mut DomTree, table: NodeId) {
    if !tree.is_tag(table, "table") || table_kind(tree, table) == TableKind::Data {
        return;
    }

    let nested: Vec<NodeId> = tree.find_all(table, "table");
    for inner in nested.into_iter().rev() {
        if tree.contains(inner) && table_kind(tree, inner) == TableKind::Layout {
            flatten_layout_table(tree, inner);
        }
    }

    for child in tree.element_children(table) {
        match tree.tag_name(child) {
            Some("colgroup" | "col") => tree.remove(child),
            Some(tag) if SECTION_TAGS.contains(&tag) => {
                for inner in tree.element_children(child) {
                    if matches!(tree.tag_name(inner), Some("colgroup" | "col")) {
                        tree.remove(inner);
                    }
                }
                tree.unwrap(child);
            }
            _ => {}
        }
    }

    for row in own_rows(tree, table) {
        let cells = row_cells(tree, row);
        for (i, cell) in cells.iter().copied().enumerate() {
            let has_block = tree
                .element_children(cell)
                .into_iter()
                .any(|c| tree.tag_name(c).is_some_and(is_block_tag));
            tree.rename(cell, if has_block { "div" } else { "span" });
            tree.retain_attrs(cell, |key, _| !matches!(key, "colspan" | "rowspan" | "headers" | "scope"));

            if i + 1 < cells.len() {
                let space = tree.create_text(" ");
                if let Some(&next) = cells.get(i + 1) {
                    tree.insert_before(next, space);
                }
            }
        }
        tree.rename(row, "div");
    }

    tree.rename(table, "div");
    tree.retain_attrs(table, |key, _| {
        !matches!(key, "cellpadding" | "cellspacing" | "border" | "width" | "summary" | "role")
    });
    if let Some(node) = tree.get_mut(table) {
        node.table_kind = None;
    }
    trace!("flattened layout table");
}
