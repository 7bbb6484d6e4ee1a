//! Link syntax scanners: destinations, titles, labels and `<...>`
//! autolinks.
//!
//! These are shared by the inline bracket resolver and by link reference
//! definitions. All offsets are absolute indices into `text`; contents are
//! returned raw, with backslash escapes and entities still in place.

use crate::limits::{MAX_LINK_LABEL_LEN, MAX_LINK_PAREN_DEPTH};

/// Result of scanning a link destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    /// Content span, angle brackets excluded.
    pub start: usize,
    pub end: usize,
    /// Offset just past the destination.
    pub next: usize,
}

/// The parenthesized tail of an inline link: `(dest "title")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineLinkTail {
    pub destination: Option<(usize, usize)>,
    pub title: Option<(usize, usize)>,
    /// Offset just past the closing `)`.
    pub end: usize,
}

#[inline]
fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n')
}

pub(crate) fn skip_ws(text: &[u8], mut pos: usize) -> usize {
    while pos < text.len() && is_ws(text[pos]) {
        pos += 1;
    }
    pos
}

/// Scan a destination at `pos`: `<...>` or a run of non-space bytes with
/// balanced parentheses.
pub fn scan_link_destination(text: &[u8], pos: usize) -> Option<Destination> {
    if text.get(pos) == Some(&b'<') {
        let mut i = pos + 1;
        while i < text.len() {
            match text[i] {
                b'>' => {
                    return Some(Destination {
                        start: pos + 1,
                        end: i,
                        next: i + 1,
                    });
                }
                b'\\' if i + 1 < text.len() => i += 2,
                b'<' | b'\n' => return None,
                _ => i += 1,
            }
        }
        return None;
    }

    let mut depth = 0usize;
    let mut i = pos;
    while i < text.len() {
        let b = text[i];
        match b {
            b'\\' if text.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
            b'(' => {
                depth += 1;
                if depth > MAX_LINK_PAREN_DEPTH {
                    return None;
                }
                i += 1;
            }
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                i += 1;
            }
            _ if b <= b' ' || b == 0x7F => break,
            _ => i += 1,
        }
    }
    if i == pos || depth != 0 {
        return None;
    }
    Some(Destination {
        start: pos,
        end: i,
        next: i,
    })
}

/// Scan a title at `pos`: `"..."`, `'...'` or `(...)`. Returns the content
/// span and the offset after the closing delimiter.
pub fn scan_link_title(text: &[u8], pos: usize) -> Option<(usize, usize, usize)> {
    let open = *text.get(pos)?;
    let close = match open {
        b'"' | b'\'' => open,
        b'(' => b')',
        _ => return None,
    };
    let mut i = pos + 1;
    while i < text.len() {
        let b = text[i];
        if b == b'\\' && i + 1 < text.len() {
            i += 2;
        } else if b == close {
            return Some((pos + 1, i, i + 1));
        } else if open == b'(' && b == b'(' {
            return None;
        } else {
            i += 1;
        }
    }
    None
}

/// Scan a link label `[...]` at `pos`. Returns the inner span and the
/// offset after `]`. Labels must contain a non-whitespace byte, may not
/// contain unescaped brackets and are limited in length.
pub fn scan_link_label(text: &[u8], pos: usize) -> Option<(usize, usize, usize)> {
    if text.get(pos) != Some(&b'[') {
        return None;
    }
    let start = pos + 1;
    let mut i = start;
    while i < text.len() {
        match text[i] {
            b'\\' if i + 1 < text.len() => i += 2,
            b'[' => return None,
            b']' => {
                let inner = &text[start..i];
                if inner.len() > MAX_LINK_LABEL_LEN || inner.iter().all(|&b| is_ws(b)) {
                    return None;
                }
                return Some((start, i, i + 1));
            }
            _ => i += 1,
        }
        if i - start > MAX_LINK_LABEL_LEN {
            return None;
        }
    }
    None
}

/// Scan `(dest "title")` starting at the `(` at `pos`.
pub fn scan_inline_link_tail(text: &[u8], pos: usize) -> Option<InlineLinkTail> {
    if text.get(pos) != Some(&b'(') {
        return None;
    }
    let mut i = skip_ws(text, pos + 1);
    if text.get(i) == Some(&b')') {
        return Some(InlineLinkTail {
            destination: None,
            title: None,
            end: i + 1,
        });
    }

    let destination = scan_link_destination(text, i)?;
    i = destination.next;
    let after_dest = skip_ws(text, i);
    let mut title = None;
    if after_dest > i {
        if let Some((s, e, next)) = scan_link_title(text, after_dest) {
            title = Some((s, e));
            i = skip_ws(text, next);
        } else {
            i = after_dest;
        }
    }
    if text.get(i) != Some(&b')') {
        return None;
    }
    Some(InlineLinkTail {
        destination: Some((destination.start, destination.end)),
        title,
        end: i + 1,
    })
}

/// Kind of a `<...>` autolink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkKind {
    Uri,
    Email,
}

/// Recognize `<scheme:...>` or `<user@host>` at `lt`. Returns the kind and
/// the offset after `>`.
pub fn scan_autolink(text: &[u8], lt: usize) -> Option<(AutolinkKind, usize)> {
    if text.get(lt) != Some(&b'<') {
        return None;
    }
    let start = lt + 1;
    let close = start + memchr::memchr(b'>', text.get(start..)?)?;
    let content = &text[start..close];
    if is_uri(content) {
        Some((AutolinkKind::Uri, close + 1))
    } else if is_email(content) {
        Some((AutolinkKind::Email, close + 1))
    } else {
        None
    }
}

fn is_uri(content: &[u8]) -> bool {
    let Some(colon) = memchr::memchr(b':', content) else {
        return false;
    };
    let scheme = &content[..colon];
    if !(2..=32).contains(&scheme.len()) || !scheme[0].is_ascii_alphabetic() {
        return false;
    }
    if !scheme
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
    {
        return false;
    }
    content[colon + 1..]
        .iter()
        .all(|&b| b > b' ' && b != 0x7F && b != b'<' && b != b'>')
}

fn is_email(content: &[u8]) -> bool {
    let Some(at) = memchr::memchr(b'@', content) else {
        return false;
    };
    let (local, domain) = (&content[..at], &content[at + 1..]);
    if local.is_empty()
        || !local
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || b".!#$%&'*+/=?^_`{|}~-".contains(&b))
    {
        return false;
    }
    !domain.is_empty() && domain.split(|&b| b == b'.').all(is_domain_label)
}

fn is_domain_label(label: &[u8]) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && label[0].is_ascii_alphanumeric()
        && label[label.len() - 1].is_ascii_alphanumeric()
        && label.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'-')
}
