//! Text decoration tables for rendered output.

use crossterm::style::Stylize;

/// Decorates a piece of text for one semantic role.
pub type StyleFn = fn(&str) -> String;

/// Role → decoration table used by the renderer and the node render
/// callbacks.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub link: StyleFn,
    pub heading: StyleFn,
    pub button: StyleFn,
    pub image: StyleFn,
    /// Generic page structure (lists, landmarks, tables).
    pub structure: StyleFn,
    /// Supplemental information such as accessible-name annotations.
    pub supplemental: StyleFn,
    /// Marker around the focused node.
    pub focused: StyleFn,
    pub code: StyleFn,
    pub url: StyleFn,
}

fn identity(s: &str) -> String {
    s.to_string()
}

impl Theme {
    /// No decoration at all. Used by snapshot output and tests.
    pub fn plain() -> Theme {
        Theme {
            link: identity,
            heading: identity,
            button: identity,
            image: identity,
            structure: identity,
            supplemental: identity,
            focused: identity,
            code: identity,
            url: identity,
        }
    }

    /// ANSI colors for interactive terminals.
    pub fn ansi() -> Theme {
        Theme {
            link: |s| s.blue().underlined().to_string(),
            heading: |s| s.cyan().bold().to_string(),
            button: |s| s.grey().to_string(),
            image: |s| s.yellow().to_string(),
            structure: |s| s.green().to_string(),
            supplemental: |s| s.grey().to_string(),
            focused: |s| s.red().bold().to_string(),
            code: |s| s.magenta().to_string(),
            url: |s| s.dark_cyan().underlined().to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::ansi()
    }
}
