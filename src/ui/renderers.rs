//! Render callbacks attached to UI nodes.
//!
//! Each callback composes a node's own text from its remote snapshot and
//! the already-rendered child text. They are plain `fn` pointers so UI
//! trees stay cheap to clone and compare.

use crate::protocol::RemoteNode;
use crate::render::context::RenderStyle;

fn node_name(raw: Option<&RemoteNode>) -> Option<&str> {
    raw.and_then(RemoteNode::trimmed_name)
}

/// Applies prefix and suffix when the string is present and non-empty.
fn maybe(s: Option<&str>, prefix: &str, suffix: &str) -> String {
    match s {
        Some(s) if !s.is_empty() => format!("{prefix}{s}{suffix}"),
        _ => String::new(),
    }
}

/// Collapse whitespace runs (including newlines) to single spaces.
pub(crate) fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn text_inline(style: &RenderStyle, raw: Option<&RemoteNode>, _child: &str) -> String {
    let value = raw.and_then(|r| r.name.as_deref()).unwrap_or("");
    if style.preformatted {
        value.to_string()
    } else {
        normalize_ws(value)
    }
}

/// Child text unchanged; used by synthetic flow-alignment groups.
pub fn passthrough_inline(_style: &RenderStyle, _raw: Option<&RemoteNode>, child: &str) -> String {
    child.to_string()
}

/// Annotates content with the accessible name when it adds information.
pub fn generic_inline(style: &RenderStyle, raw: Option<&RemoteNode>, child: &str) -> String {
    if let Some(name) = node_name(raw) {
        if name != child {
            return format!(
                "{}{child}{}",
                (style.theme.supplemental)(&format!("({name}: ")),
                (style.theme.supplemental)(")")
            );
        }
    }
    child.to_string()
}

pub fn generic_header(style: &RenderStyle, raw: Option<&RemoteNode>) -> String {
    match node_name(raw) {
        Some(name) => (style.theme.supplemental)(&format!("({name})")),
        None => String::new(),
    }
}

fn heading_mark(raw: Option<&RemoteNode>) -> String {
    let level = raw.map(RemoteNode::heading_level).unwrap_or(0);
    if level <= 0 {
        "#?".to_string()
    } else {
        "#".repeat(level as usize)
    }
}

pub fn heading_inline(style: &RenderStyle, raw: Option<&RemoteNode>, child: &str) -> String {
    format!("{} {child}", (style.theme.heading)(&heading_mark(raw)))
}

pub fn heading_header(style: &RenderStyle, raw: Option<&RemoteNode>) -> String {
    format!(
        "{}{}",
        (style.theme.heading)(&heading_mark(raw)),
        maybe(node_name(raw), " ", "")
    )
}

pub fn link_inline(style: &RenderStyle, raw: Option<&RemoteNode>, child: &str) -> String {
    let name = node_name(raw).filter(|name| *name != child);
    let sep = match name {
        Some(_) if !child.is_empty() => " ",
        _ => "",
    };
    (style.theme.link)(&format!("<Link:{}{sep}{child}>", name.unwrap_or("")))
}

pub fn link_header(style: &RenderStyle, raw: Option<&RemoteNode>) -> String {
    (style.theme.link)(&format!("<Link:{}>", node_name(raw).unwrap_or("")))
}

pub fn button_inline(style: &RenderStyle, raw: Option<&RemoteNode>, child: &str) -> String {
    let name = node_name(raw).filter(|name| *name != child);
    (style.theme.button)(&format!(
        "[Button{}{}]",
        maybe(name, "(", ")"),
        maybe(Some(child), ": ", "")
    ))
}

pub fn image_inline(style: &RenderStyle, raw: Option<&RemoteNode>, _child: &str) -> String {
    match node_name(raw) {
        Some(name) => (style.theme.image)(&format!("[Image: {name}]")),
        None => (style.theme.image)("[Unknown Image]"),
    }
}

pub fn input_inline(style: &RenderStyle, raw: Option<&RemoteNode>, child: &str) -> String {
    (style.theme.button)(&format!(
        "[Input{} {child}]",
        maybe(node_name(raw), "(", ")")
    ))
}

pub fn code_inline(style: &RenderStyle, _raw: Option<&RemoteNode>, child: &str) -> String {
    (style.theme.code)(child)
}

pub fn list_header(style: &RenderStyle, raw: Option<&RemoteNode>) -> String {
    (style.theme.structure)(&format!("List{}", maybe(node_name(raw), ": ", "")))
}

pub fn table_header(style: &RenderStyle, raw: Option<&RemoteNode>) -> String {
    (style.theme.structure)(&format!("Table{}", maybe(node_name(raw), ": ", "")))
}

/// Landmark header: role name with a leading capital, plus the accessible
/// name when present.
pub fn landmark_header(style: &RenderStyle, raw: Option<&RemoteNode>) -> String {
    let role = raw.map(|r| r.role.as_str()).unwrap_or("");
    let mut label: String = role.to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    (style.theme.structure)(&format!("{label}{}", maybe(node_name(raw), " ", "")))
}

pub fn list_marker(style: &RenderStyle) -> String {
    (style.theme.structure)("- ")
}

pub fn structure_indent(style: &RenderStyle) -> String {
    format!("{} ", (style.theme.structure)("|"))
}

pub fn heading_indent(style: &RenderStyle) -> String {
    format!("{} ", (style.theme.heading)("|"))
}

pub fn link_indent(style: &RenderStyle) -> String {
    format!("{} ", (style.theme.link)("|"))
}

pub fn supplemental_indent(style: &RenderStyle) -> String {
    format!("{} ", (style.theme.supplemental)("|"))
}
