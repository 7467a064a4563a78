//! Width wrapping and indentation.
//!
//! Consumes the chunk stream produced by the renderer. Marker lines (see
//! [`INDENT_START`]/[`INDENT_END`](super::INDENT_END)) push and pop indent
//! strings and produce no output; every other line is prefixed with one
//! space plus the active indents and hard-wrapped to the terminal width.
//! Widths are measured on visible characters: ANSI escape sequences pass
//! through unmeasured.

use std::collections::VecDeque;

use unicode_width::UnicodeWidthChar;

use super::{INDENT_END, INDENT_START};

/// Wrap a stream of renderer chunks to `width` columns. `None` disables
/// wrapping (indentation is still applied).
pub fn wrap_frame<I>(source: I, width: Option<usize>) -> LineWrapper<I>
where
    I: Iterator<Item = String>,
{
    LineWrapper {
        source,
        width,
        buf: String::new(),
        source_done: false,
        indents: Vec::new(),
        pending: VecDeque::new(),
    }
}

pub struct LineWrapper<I> {
    source: I,
    width: Option<usize>,
    /// Partial line carried between chunks.
    buf: String,
    source_done: bool,
    indents: Vec<String>,
    pending: VecDeque<String>,
}

impl<I> LineWrapper<I>
where
    I: Iterator<Item = String>,
{
    fn process_line(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix(INDENT_START) {
            self.indents.push(rest.to_string());
            return;
        }
        if line.starts_with(INDENT_END) {
            self.indents.pop();
            return;
        }
        let indent: String = self.indents.concat();
        let indent_width: usize = visible_width(&indent) + 1;
        match self.width {
            None => self.pending.push_back(format!(" {indent}{line}")),
            Some(width) => {
                let avail = width.saturating_sub(indent_width + 1).max(1);
                for piece in split_visible(line, avail) {
                    self.pending.push_back(format!(" {indent}{piece}"));
                }
            }
        }
    }
}

impl<I> Iterator for LineWrapper<I>
where
    I: Iterator<Item = String>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(line);
            }
            if self.source_done {
                return None;
            }
            match self.source.next() {
                Some(chunk) => {
                    self.buf.push_str(&chunk);
                    while let Some(pos) = self.buf.find('\n') {
                        let line: String = self.buf.drain(..=pos).collect();
                        let line = line.trim_end_matches('\n').to_string();
                        self.process_line(&line);
                    }
                }
                None => {
                    self.source_done = true;
                    if !self.buf.is_empty() {
                        let line = std::mem::take(&mut self.buf);
                        self.process_line(&line);
                    }
                }
            }
        }
    }
}

/// Columns the string occupies on screen; ANSI CSI sequences count zero.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip over "ESC [ ... final-byte".
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        width += c.width().unwrap_or(0);
    }
    width
}

/// Hard-split a line into pieces of at most `max` visible columns.
///
/// Splits mid-word; escape sequences stay attached to the piece they start
/// in. An empty line yields one empty piece.
fn split_visible(line: &str, max: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            current.push(c);
            if chars.peek() == Some(&'[') {
                for c in chars.by_ref() {
                    current.push(c);
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        let w = c.width().unwrap_or(0);
        if used + w > max && used > 0 {
            pieces.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += w;
    }
    pieces.push(current);
    pieces
}
