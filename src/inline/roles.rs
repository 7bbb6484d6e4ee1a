//! Role syntax: `` {name}`content` `` and `` {name key=value}`content` ``.

use super::code_span::{BacktickIndex, match_code_span, run_length};
use crate::block::is_name_byte;

/// Byte spans of a role occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSpan {
    pub name: (usize, usize),
    /// Options inside the braces after the name, possibly empty.
    pub options: (usize, usize),
    pub content: (usize, usize),
    pub end: usize,
}

/// Scan a role at `pos`, which must hold `{`.
pub fn scan_role(text: &[u8], pos: usize, backticks: &BacktickIndex) -> Option<RoleSpan> {
    if text.get(pos) != Some(&b'{') {
        return None;
    }
    let name_start = pos + 1;
    let mut i = name_start;
    while i < text.len() && is_name_byte(text[i]) {
        i += 1;
    }
    if i == name_start || !text[name_start].is_ascii_alphanumeric() {
        return None;
    }
    let name = (name_start, i);

    let options = match text.get(i)? {
        b'}' => (i, i),
        b' ' => {
            let start = i + 1;
            let close = start + text[start..].iter().position(|&b| b == b'}')?;
            if text[start..close]
                .iter()
                .any(|&b| matches!(b, b'{' | b'`' | b'\n'))
            {
                return None;
            }
            i = close;
            (start, close)
        }
        _ => return None,
    };

    let tick = i + 1;
    if text.get(tick) != Some(&b'`') {
        return None;
    }
    let len = run_length(text, tick);
    let (content_start, content_end, end) = match_code_span(text, tick, len, backticks)?;
    Some(RoleSpan {
        name,
        options,
        content: (content_start, content_end),
        end,
    })
}
