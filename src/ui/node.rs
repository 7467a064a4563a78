//! Typed presentation nodes.
//!
//! A UI tree is an immutable snapshot computed from a mirror snapshot. The
//! only field written after construction is `rendered_span`, bookkeeping the
//! renderer stores back for scroll-to-focus; it lives in a `Cell` so the
//! tree can be walked by shared reference.

use std::cell::Cell;
use std::sync::Arc;

use crate::protocol::RemoteNode;
use crate::render::context::RenderStyle;

/// Whether content occupies its own line(s) or participates in a running
/// line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Inline,
    Block,
}

/// Inclusive range of rendered content lines, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: u32,
    pub end: u32,
}

/// Composes a node's own text from the already-rendered child text.
pub type InlineRenderer = fn(&RenderStyle, Option<&RemoteNode>, &str) -> String;
/// Renders the header line of a multi-line container.
pub type HeaderRenderer = fn(&RenderStyle, Option<&RemoteNode>) -> String;
/// Renders a short glyph (indent bar, list marker).
pub type MarkerRenderer = fn(&RenderStyle) -> String;

#[derive(Debug, Clone, PartialEq)]
pub enum UiNodeKind {
    /// Multi-line container: header line, then indented block children.
    Wrapper {
        header: HeaderRenderer,
        indent: MarkerRenderer,
        preformatted: bool,
    },
    /// Single-line block; children are inline and composed eagerly.
    Block {
        compose: InlineRenderer,
        /// Separator between composed children ("" except for collapsed
        /// table rows).
        join: &'static str,
    },
    Inline {
        compose: InlineRenderer,
    },
    ListItem {
        marker: MarkerRenderer,
        /// A child brings its own marker glyph; don't double it.
        marker_suppressed: bool,
    },
    Table {
        header: HeaderRenderer,
        indent: MarkerRenderer,
    },
    /// Intermediate: collapsed into a block once its table gathers it.
    Row,
    /// Intermediate: collapsed into inline content by its row; dropped when
    /// not directly under a recognized row.
    Cell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiNode {
    pub kind: UiNodeKind,
    pub focused: bool,
    /// Remote snapshot this node was derived from. Lookup only; synthetic
    /// nodes (flow-alignment groups) have none.
    pub raw: Option<Arc<RemoteNode>>,
    /// Flow this node prefers for itself.
    pub self_flow: Flow,
    /// Flow of its children.
    pub intrinsic_flow: Flow,
    pub children: Vec<UiNode>,
    /// Populated by the renderer on every pass.
    pub rendered_span: Cell<Option<LineSpan>>,
}

impl UiNode {
    pub fn new(
        kind: UiNodeKind,
        self_flow: Flow,
        raw: Option<Arc<RemoteNode>>,
        children: Vec<UiNode>,
    ) -> UiNode {
        let intrinsic_flow = flow_max(&children);
        let focused = raw.as_deref().map(RemoteNode::is_focused).unwrap_or(false);
        UiNode {
            kind,
            focused,
            raw,
            self_flow,
            intrinsic_flow,
            children,
            rendered_span: Cell::new(None),
        }
    }

    /// Fully inline: renders within a running line of text.
    pub fn is_inline(&self) -> bool {
        self.self_flow == Flow::Inline && self.intrinsic_flow == Flow::Inline
    }
}

/// Resulting flow of a sibling group: block as soon as any member is block.
pub fn flow_max(nodes: &[UiNode]) -> Flow {
    for node in nodes {
        if node.self_flow == Flow::Block || node.intrinsic_flow == Flow::Block {
            return Flow::Block;
        }
    }
    Flow::Inline
}
