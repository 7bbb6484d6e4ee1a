//! List marker recognition.
//!
//! The container bookkeeping (continuation, tightness) lives in the
//! parser; this module only answers "does a list item start here".

use crate::ast::ListKind;
use crate::limits::MAX_LIST_MARKER_DIGITS;

/// A recognized list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    pub kind: ListKind,
    /// Marker width in bytes (`-` is 1, `10.` is 3).
    pub width: usize,
}

/// Recognize a list marker at the start of `rest`.
///
/// When the marker would interrupt a paragraph, ordered lists must start
/// at 1 and the item may not be empty.
pub fn scan_list_marker(rest: &[u8], interrupts_paragraph: bool) -> Option<ListMarker> {
    let first = *rest.first()?;
    let marker = match first {
        b'-' | b'+' | b'*' => ListMarker {
            kind: ListKind::Bullet { marker: first },
            width: 1,
        },
        b'0'..=b'9' => {
            let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > MAX_LIST_MARKER_DIGITS {
                return None;
            }
            let delimiter = *rest.get(digits)?;
            if delimiter != b'.' && delimiter != b')' {
                return None;
            }
            let start = rest[..digits]
                .iter()
                .fold(0u32, |n, &d| n * 10 + (d - b'0') as u32);
            if interrupts_paragraph && start != 1 {
                return None;
            }
            ListMarker {
                kind: ListKind::Ordered { start, delimiter },
                width: digits + 1,
            }
        }
        _ => return None,
    };

    match rest.get(marker.width) {
        None | Some(b' ' | b'\t') => {}
        Some(_) => return None,
    }
    if interrupts_paragraph
        && rest[marker.width..]
            .iter()
            .all(|&b| b == b' ' || b == b'\t')
    {
        return None;
    }
    Some(marker)
}

/// Whether an item with `kind` continues a list of `list_kind`.
pub fn same_list(list_kind: ListKind, kind: ListKind) -> bool {
    match (list_kind, kind) {
        (ListKind::Bullet { marker: a }, ListKind::Bullet { marker: b }) => a == b,
        (ListKind::Ordered { delimiter: a, .. }, ListKind::Ordered { delimiter: b, .. }) => a == b,
        _ => false,
    }
}
