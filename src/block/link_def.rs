//! Link reference definitions at the start of a paragraph.

use crate::escape::unescape;
use crate::inline::links::{scan_link_destination, scan_link_label, scan_link_title};
use crate::lexer::is_space_or_tab;

/// A definition recognized at the front of paragraph text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefinition<'a> {
    /// Raw label, not yet normalized.
    pub label: &'a str,
    pub destination: String,
    pub title: Option<String>,
    /// Number of whole lines the definition occupies.
    pub lines: usize,
    /// Bytes consumed, including the final line ending.
    pub consumed: usize,
}

fn skip_spaces(text: &[u8], mut pos: usize) -> usize {
    while pos < text.len() && is_space_or_tab(text[pos]) {
        pos += 1;
    }
    pos
}

/// Spaces, tabs and at most one line ending.
fn skip_ws_one_newline(text: &[u8], pos: usize) -> usize {
    let pos = skip_spaces(text, pos);
    if text.get(pos) == Some(&b'\n') {
        skip_spaces(text, pos + 1)
    } else {
        pos
    }
}

/// Offset after the line ending if only spaces remain on the line.
fn line_end(text: &[u8], pos: usize) -> Option<usize> {
    let pos = skip_spaces(text, pos);
    match text.get(pos) {
        None => Some(pos),
        Some(b'\n') => Some(pos + 1),
        Some(_) => None,
    }
}

/// Parse one definition at the start of `text`, whose lines are joined
/// with `\n`.
pub fn parse_link_definition(text: &str) -> Option<LinkDefinition<'_>> {
    let bytes = text.as_bytes();
    let (label_start, label_end, after_label) = scan_link_label(bytes, 0)?;
    if bytes.get(after_label) != Some(&b':') {
        return None;
    }

    let dest_pos = skip_ws_one_newline(bytes, after_label + 1);
    let dest = scan_link_destination(bytes, dest_pos)?;
    if dest.start == dest.end && bytes[dest_pos] != b'<' {
        return None;
    }
    let destination = unescape(&text[dest.start..dest.end]);

    // A title must be separated from the destination by whitespace; if it
    // is malformed, the definition may still end at the destination line.
    let title_pos = skip_ws_one_newline(bytes, dest.next);
    let mut result = None;
    if title_pos > dest.next {
        if let Some((ts, te, after_title)) = scan_link_title(bytes, title_pos) {
            if let Some(end) = line_end(bytes, after_title) {
                result = Some((Some(unescape(&text[ts..te])), end));
            }
        }
    }
    let (title, consumed) = match result {
        Some(found) => found,
        None => (None, line_end(bytes, dest.next)?),
    };

    let lines = bytes[..consumed].iter().filter(|&&b| b == b'\n').count()
        + usize::from(consumed == bytes.len() && !text[..consumed].ends_with('\n'));
    Some(LinkDefinition {
        label: &text[label_start..label_end],
        destination,
        title,
        lines,
        consumed,
    })
}
