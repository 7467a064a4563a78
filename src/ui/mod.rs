//! Presentation tree built from a mirror snapshot.
//!
//! Construction is a post-order walk: children are converted first, then the
//! parent decides its own shape from its role and the flow of its converted
//! children. Ignored nodes and pure-layout roles splice their children into
//! the parent's list.

pub mod node;
pub mod renderers;

use std::sync::Arc;

use tracing::debug;

use crate::protocol::RemoteNode;
use crate::tree::mirror::{Mirror, MirrorNode};
use node::{flow_max, Flow, UiNode, UiNodeKind};
use renderers::*;

/// Build the presentation subtree rooted at `node`.
///
/// Returns a list because spliced roles dissolve into their children.
pub fn build_ui_tree(mirror: &Mirror, node: &MirrorNode) -> Vec<UiNode> {
    let mut children = Vec::new();
    for child_id in &node.children {
        if let Some(child) = mirror.node(child_id) {
            children.extend(build_ui_tree(mirror, child));
        }
    }
    convert(node, children)
}

/// Build a single root node for the whole mirror, if it has one.
///
/// A splice at the top level (more than one surviving node) is grouped under
/// a synthetic container so callers always hold one tree.
pub fn build_root(mirror: &Mirror) -> Option<UiNode> {
    let root = mirror.root_node()?;
    let mut nodes = build_ui_tree(mirror, root);
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => Some(UiNode::new(
            UiNodeKind::Wrapper {
                header: generic_header,
                indent: supplemental_indent,
                preformatted: false,
            },
            Flow::Block,
            None,
            align_flow(nodes),
        )),
    }
}

fn convert(node: &MirrorNode, children: Vec<UiNode>) -> Vec<UiNode> {
    let raw = Arc::clone(&node.raw);
    if raw.ignored {
        return children;
    }
    match node.role.as_str() {
        // Pure layout, no presentation of their own.
        "none" | "presentation" | "InlineTextBox" => children,
        "StaticText" | "ListMarker" => one(inline(text_inline, raw, children)),
        "heading" => one(block_or_wrapper(
            heading_inline,
            heading_header,
            heading_indent,
            raw,
            children,
        )),
        "paragraph" | "generic" | "RootWebArea" => one(block_or_wrapper(
            generic_inline,
            generic_header,
            supplemental_indent,
            raw,
            children,
        )),
        "link" => {
            if flow_max(&children) == Flow::Inline {
                one(inline(link_inline, raw, children))
            } else {
                one(wrapper(link_header, link_indent, false, raw, children))
            }
        }
        "button" => one(inline(button_inline, raw, children)),
        "image" | "img" => one(inline(image_inline, raw, children)),
        "combobox" | "textbox" | "searchbox" => one(inline(input_inline, raw, children)),
        "code" => one(inline(code_inline, raw, children)),
        // Preformatted text block; whitespace inside is kept verbatim.
        "Pre" => one(wrapper(generic_header, supplemental_indent, true, raw, children)),
        "list" => one(wrapper(list_header, structure_indent, false, raw, children)),
        "listitem" => one(list_item(raw, children)),
        "navigation" | "banner" | "complementary" | "contentinfo" => {
            one(wrapper(landmark_header, structure_indent, false, raw, children))
        }
        "table" | "grid" => one(table(raw, children)),
        "row" => one(UiNode::new(UiNodeKind::Row, Flow::Block, Some(raw), children)),
        "cell" | "gridcell" | "columnheader" | "rowheader" => one(UiNode::new(
            UiNodeKind::Cell,
            Flow::Inline,
            Some(raw),
            children,
        )),
        other => {
            debug!(role = other, id = %raw.id, "no mapping for role, degrading to generic");
            one(block_or_wrapper(
                generic_inline,
                generic_header,
                supplemental_indent,
                raw,
                children,
            ))
        }
    }
}

fn one(node: UiNode) -> Vec<UiNode> {
    vec![node]
}

fn inline(compose: node::InlineRenderer, raw: Arc<RemoteNode>, children: Vec<UiNode>) -> UiNode {
    UiNode::new(UiNodeKind::Inline { compose }, Flow::Inline, Some(raw), children)
}

fn wrapper(
    header: node::HeaderRenderer,
    indent: node::MarkerRenderer,
    preformatted: bool,
    raw: Arc<RemoteNode>,
    children: Vec<UiNode>,
) -> UiNode {
    UiNode::new(
        UiNodeKind::Wrapper {
            header,
            indent,
            preformatted,
        },
        Flow::Block,
        Some(raw),
        align_flow(children),
    )
}

/// Single line when all children are inline, indented container otherwise.
fn block_or_wrapper(
    compose: node::InlineRenderer,
    header: node::HeaderRenderer,
    indent: node::MarkerRenderer,
    raw: Arc<RemoteNode>,
    children: Vec<UiNode>,
) -> UiNode {
    if flow_max(&children) == Flow::Inline {
        UiNode::new(
            UiNodeKind::Block { compose, join: "" },
            Flow::Block,
            Some(raw),
            children,
        )
    } else {
        wrapper(header, indent, false, raw, children)
    }
}

fn list_item(raw: Arc<RemoteNode>, children: Vec<UiNode>) -> UiNode {
    // A leading ListMarker child already carries the bullet glyph.
    let marker_suppressed = children
        .first()
        .and_then(|c| c.raw.as_deref())
        .map(|r| r.role == "ListMarker")
        .unwrap_or(false);
    let children = if flow_max(&children) == Flow::Inline {
        children
    } else {
        align_flow(children)
    };
    UiNode::new(
        UiNodeKind::ListItem {
            marker: list_marker,
            marker_suppressed,
        },
        Flow::Block,
        Some(raw),
        children,
    )
}

fn table(raw: Arc<RemoteNode>, children: Vec<UiNode>) -> UiNode {
    let mut gathered = Vec::new();
    for child in children {
        match child.kind {
            UiNodeKind::Row => gathered.push(collapse_row(child)),
            UiNodeKind::Cell => {
                // A cell with no enclosing row has no place on the grid.
                if let Some(raw) = child.raw.as_deref() {
                    debug!(id = %raw.id, "dropping table cell outside a row");
                }
            }
            _ => gathered.push(child),
        }
    }
    UiNode::new(
        UiNodeKind::Table {
            header: table_header,
            indent: structure_indent,
        },
        Flow::Block,
        Some(raw),
        align_flow(gathered),
    )
}

/// One row becomes one line: its cells joined by single spaces.
fn collapse_row(row: UiNode) -> UiNode {
    let cells: Vec<UiNode> = row
        .children
        .into_iter()
        .map(|child| match child.kind {
            UiNodeKind::Cell => UiNode::new(
                UiNodeKind::Inline {
                    compose: passthrough_inline,
                },
                Flow::Inline,
                child.raw,
                child.children,
            ),
            _ => child,
        })
        .collect();
    if flow_max(&cells) == Flow::Inline {
        UiNode::new(
            UiNodeKind::Block {
                compose: passthrough_inline,
                join: " ",
            },
            Flow::Block,
            row.raw,
            cells,
        )
    } else {
        // Block content inside a cell; fall back to an indented container.
        UiNode::new(
            UiNodeKind::Wrapper {
                header: generic_header,
                indent: structure_indent,
                preformatted: false,
            },
            Flow::Block,
            row.raw,
            align_flow(cells),
        )
    }
}

/// Normalize a mixed sibling list so blocks never sit next to loose inline
/// runs: consecutive inline siblings are grouped under a synthetic block.
///
/// Uniform lists (all inline, or all block) pass through unchanged, which
/// makes the operation idempotent.
pub fn align_flow(children: Vec<UiNode>) -> Vec<UiNode> {
    if flow_max(&children) == Flow::Inline {
        return children;
    }
    if children.iter().all(|c| !c.is_inline()) {
        return children;
    }
    let mut out = Vec::new();
    let mut run: Vec<UiNode> = Vec::new();
    for child in children {
        if child.is_inline() {
            run.push(child);
        } else {
            flush_inline_run(&mut run, &mut out);
            out.push(child);
        }
    }
    flush_inline_run(&mut run, &mut out);
    out
}

fn flush_inline_run(run: &mut Vec<UiNode>, out: &mut Vec<UiNode>) {
    if run.is_empty() {
        return;
    }
    out.push(UiNode::new(
        UiNodeKind::Block {
            compose: passthrough_inline,
            join: "",
        },
        Flow::Block,
        None,
        std::mem::take(run),
    ));
}
