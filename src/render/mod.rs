//! Streaming text renderer.
//!
//! [`Renderer`] walks a UI tree with an explicit work stack and yields text
//! chunks, one per output line. Indentation is not applied here: containers
//! emit marker lines (noncharacter sentinels) that push and pop indent
//! strings, and the downstream [`wrap`] pass turns those into actual
//! indentation and width-wraps the content lines between them.

pub mod context;
pub mod theme;
pub mod wrap;

use crate::ui::node::{Flow, LineSpan, UiNode, UiNodeKind};
use context::RenderContext;

/// First character of a marker line that pushes the rest of the line as an
/// indent string.
pub const INDENT_START: char = '\u{FDD0}';
/// First character of a marker line that pops the innermost indent string.
pub const INDENT_END: char = '\u{FDD1}';

enum Step<'t> {
    Enter(&'t UiNode),
    Marker(String),
    SetPre(bool),
    Close(&'t UiNode),
}

/// One render pass over a UI tree.
///
/// Yields one `String` per line (content lines end in `\n`, marker lines
/// too). Content line numbers are tracked in the context and stored back
/// into each node's `rendered_span`; marker lines do not count because the
/// wrapper consumes them.
pub struct Renderer<'t> {
    ctx: RenderContext,
    stack: Vec<Step<'t>>,
}

impl<'t> Renderer<'t> {
    pub fn new(root: &'t UiNode, ctx: RenderContext) -> Self {
        Renderer {
            ctx,
            stack: vec![Step::Enter(root)],
        }
    }

    fn fire_focus(&mut self, node: &'t UiNode) {
        if let Some(cb) = self.ctx.on_focus.as_mut() {
            cb(node);
        }
    }

    fn focus_wrap(&self, text: String) -> String {
        let focused = self.ctx.theme.focused;
        format!("{}{text}{}", focused("["), focused("]"))
    }

    /// Compose a node into a single piece of inline text, recording spans
    /// and firing the focus callback along the way.
    fn compose(&mut self, node: &'t UiNode) -> String {
        let line = self.ctx.line;
        let text = match &node.kind {
            UiNodeKind::Inline { compose } => {
                let inner = self.compose_children(&node.children, "");
                compose(&self.ctx.style(), node.raw.as_deref(), &inner)
            }
            UiNodeKind::Block { compose, join } => {
                let inner = self.compose_children(&node.children, join);
                compose(&self.ctx.style(), node.raw.as_deref(), &inner)
            }
            UiNodeKind::ListItem {
                marker,
                marker_suppressed,
            } => {
                let prefix = if *marker_suppressed {
                    String::new()
                } else {
                    marker(&self.ctx.style())
                };
                format!("{prefix}{}", self.compose_children(&node.children, " "))
            }
            // Containers only reach here through malformed trees; render
            // their header and content on one line rather than lose them.
            UiNodeKind::Wrapper { header, .. } | UiNodeKind::Table { header, .. } => {
                let head = header(&self.ctx.style(), node.raw.as_deref());
                let inner = self.compose_children(&node.children, " ");
                if head.is_empty() {
                    inner
                } else if inner.is_empty() {
                    head
                } else {
                    format!("{head} {inner}")
                }
            }
            UiNodeKind::Row | UiNodeKind::Cell => self.compose_children(&node.children, " "),
        };
        let text = if node.focused {
            self.focus_wrap(text)
        } else {
            text
        };
        node.rendered_span.set(Some(LineSpan {
            start: line,
            end: line,
        }));
        if node.focused {
            self.fire_focus(node);
        }
        text
    }

    fn compose_children(&mut self, children: &'t [UiNode], join: &str) -> String {
        let mut out = String::new();
        for child in children {
            let piece = self.compose(child);
            if piece.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push_str(join);
            }
            out.push_str(&piece);
        }
        out
    }

    /// Emit `text` as content, counting its lines.
    fn emit(&mut self, mut text: String) -> Option<String> {
        text.push('\n');
        self.ctx.line += text.matches('\n').count() as u32;
        Some(text)
    }

    fn open_container(&mut self, node: &'t UiNode, indent: String, preformatted: bool) {
        self.stack.push(Step::Close(node));
        self.stack.push(Step::Marker(format!("{INDENT_END}\n")));
        if preformatted {
            self.stack.push(Step::SetPre(false));
        }
        for child in node.children.iter().rev() {
            self.stack.push(Step::Enter(child));
        }
        if preformatted {
            self.stack.push(Step::SetPre(true));
        }
        self.stack
            .push(Step::Marker(format!("{INDENT_START}{indent}\n")));
    }

    /// Process one node. Returns the text to yield, or `None` when the node
    /// only pushed further work.
    fn enter(&mut self, node: &'t UiNode) -> Option<String> {
        if node.self_flow == Flow::Block && self.ctx.separator_pending {
            // Blank line between adjacent blocks, emitted lazily so the
            // document never ends in one.
            self.ctx.separator_pending = false;
            self.stack.push(Step::Enter(node));
            self.ctx.line += 1;
            return Some("\n".to_string());
        }
        match &node.kind {
            UiNodeKind::Wrapper {
                header,
                indent,
                preformatted,
            } => {
                node.rendered_span.set(Some(LineSpan {
                    start: self.ctx.line,
                    end: self.ctx.line,
                }));
                if node.focused {
                    self.fire_focus(node);
                }
                let style = self.ctx.style();
                let head = header(&style, node.raw.as_deref());
                let indent = indent(&style);
                self.open_container(node, indent, *preformatted);
                if head.is_empty() {
                    return None;
                }
                let head = if node.focused {
                    self.focus_wrap(head)
                } else {
                    head
                };
                self.emit(head)
            }
            UiNodeKind::Table { header, indent } => {
                node.rendered_span.set(Some(LineSpan {
                    start: self.ctx.line,
                    end: self.ctx.line,
                }));
                if node.focused {
                    self.fire_focus(node);
                }
                let style = self.ctx.style();
                let head = header(&style, node.raw.as_deref());
                let indent = indent(&style);
                self.open_container(node, indent, false);
                let head = if node.focused {
                    self.focus_wrap(head)
                } else {
                    head
                };
                self.emit(head)
            }
            UiNodeKind::ListItem {
                marker,
                marker_suppressed,
            } if node.intrinsic_flow == Flow::Block => {
                node.rendered_span.set(Some(LineSpan {
                    start: self.ctx.line,
                    end: self.ctx.line,
                }));
                if node.focused {
                    self.fire_focus(node);
                }
                let head = marker(&self.ctx.style()).trim_end().to_string();
                self.open_container(node, "  ".to_string(), false);
                if *marker_suppressed || head.is_empty() {
                    return None;
                }
                self.emit(head)
            }
            // Everything else renders as a single composed line (which may
            // contain embedded newlines inside preformatted text).
            _ => {
                let start = self.ctx.line;
                let text = self.compose(node);
                let out = self.emit(text);
                if self.ctx.line > start + 1 {
                    node.rendered_span.set(Some(LineSpan {
                        start,
                        end: self.ctx.line - 1,
                    }));
                }
                if node.self_flow == Flow::Block {
                    self.ctx.separator_pending = true;
                }
                out
            }
        }
    }

    fn close(&mut self, node: &'t UiNode) {
        if let Some(mut span) = node.rendered_span.get() {
            span.end = self.ctx.line.saturating_sub(1).max(span.start);
            node.rendered_span.set(Some(span));
        }
        self.ctx.separator_pending = true;
    }
}

impl<'t> Iterator for Renderer<'t> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.stack.pop()? {
                Step::Marker(s) => return Some(s),
                Step::SetPre(v) => self.ctx.preformatted = v,
                Step::Close(node) => self.close(node),
                Step::Enter(node) => {
                    if let Some(text) = self.enter(node) {
                        return Some(text);
                    }
                }
            }
        }
    }
}

/// Render a whole tree into one string. Marker lines are included; pass the
/// result through [`wrap::wrap_frame`] to resolve them.
pub fn render_to_string(root: &UiNode, ctx: RenderContext) -> String {
    Renderer::new(root, ctx).collect()
}
