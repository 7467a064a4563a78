//! Per-pass mutable render state.

use crate::render::theme::Theme;
use crate::ui::node::UiNode;

/// Immutable view of the context handed to node render callbacks.
pub struct RenderStyle<'a> {
    pub theme: &'a Theme,
    /// Inside a preformatted subtree whitespace is kept verbatim.
    pub preformatted: bool,
}

/// State for one render pass. Created fresh per pass, consumed by the
/// renderer, discarded afterwards; never shared across passes.
pub struct RenderContext {
    pub theme: Theme,
    /// Next content line the renderer will emit, 0-based. Marker lines do
    /// not count; they are consumed by the line wrapper.
    pub(crate) line: u32,
    /// A blank separator line is due before the next block.
    pub(crate) separator_pending: bool,
    pub(crate) preformatted: bool,
    /// Invoked once for the focused node when the renderer reaches it.
    pub(crate) on_focus: Option<Box<dyn FnMut(&UiNode)>>,
}

impl RenderContext {
    pub fn new(theme: Theme) -> Self {
        RenderContext {
            theme,
            line: 0,
            separator_pending: false,
            preformatted: false,
            on_focus: None,
        }
    }

    pub fn with_focus_callback(theme: Theme, on_focus: Box<dyn FnMut(&UiNode)>) -> Self {
        RenderContext {
            on_focus: Some(on_focus),
            ..RenderContext::new(theme)
        }
    }

    /// Current content line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    pub(crate) fn style(&self) -> RenderStyle<'_> {
        RenderStyle {
            theme: &self.theme,
            preformatted: self.preformatted,
        }
    }
}
