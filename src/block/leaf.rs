//! Scanners for single-line block starts.
//!
//! Each function looks at the rest of a line from its first non-space
//! byte and answers with offsets relative to that slice.

use crate::lexer::is_space_or_tab;
use crate::limits::MAX_LINK_LABEL_LEN;

#[inline]
fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| is_space_or_tab(b))
}

/// ATX heading: `#{1,6}` followed by a space, tab or end of line.
/// Returns the level and the content span with the closing sequence
/// removed.
pub fn scan_atx_heading(rest: &[u8]) -> Option<(u8, usize, usize)> {
    let level = rest.iter().take_while(|&&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    match rest.get(level) {
        None => return Some((level as u8, level, level)),
        Some(&b) if is_space_or_tab(b) => {}
        Some(_) => return None,
    }

    let mut start = level;
    while start < rest.len() && is_space_or_tab(rest[start]) {
        start += 1;
    }
    let mut end = rest.len();
    while end > start && is_space_or_tab(rest[end - 1]) {
        end -= 1;
    }
    // Optional closing sequence: spaces then `#`s, or nothing but `#`s.
    let mut hashes = end;
    while hashes > start && rest[hashes - 1] == b'#' {
        hashes -= 1;
    }
    if hashes == start {
        end = start;
    } else if hashes < end && is_space_or_tab(rest[hashes - 1]) {
        end = hashes;
        while end > start && is_space_or_tab(rest[end - 1]) {
            end -= 1;
        }
    }
    Some((level as u8, start, end))
}

/// Opening code fence: three or more backticks or tildes. Backtick fences
/// may not have a backtick in their info string. Returns fence byte,
/// fence length and the trimmed info span.
pub fn scan_open_fence(rest: &[u8]) -> Option<(u8, usize, usize, usize)> {
    let ch = *rest.first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let len = rest.iter().take_while(|&&b| b == ch).count();
    if len < 3 {
        return None;
    }
    let info = &rest[len..];
    if ch == b'`' && memchr::memchr(b'`', info).is_some() {
        return None;
    }
    let mut start = len;
    while start < rest.len() && is_space_or_tab(rest[start]) {
        start += 1;
    }
    let mut end = rest.len();
    while end > start && is_space_or_tab(rest[end - 1]) {
        end -= 1;
    }
    Some((ch, len, start, end))
}

/// Closing fence of at least `min_len` `ch` bytes, then only whitespace.
pub fn is_closing_fence(rest: &[u8], ch: u8, min_len: usize) -> bool {
    let len = rest.iter().take_while(|&&b| b == ch).count();
    len >= min_len && is_blank(&rest[len..])
}

/// Thematic break: three or more `*`, `-` or `_`, optionally spaced.
pub fn is_thematic_break(rest: &[u8]) -> bool {
    let Some(&ch) = rest.first() else {
        return false;
    };
    if ch != b'*' && ch != b'-' && ch != b'_' {
        return false;
    }
    let mut count = 0;
    for &b in rest {
        if b == ch {
            count += 1;
        } else if !is_space_or_tab(b) {
            return false;
        }
    }
    count >= 3
}

/// Setext underline: `=` gives level 1, `-` level 2.
pub fn scan_setext_underline(rest: &[u8]) -> Option<u8> {
    let ch = *rest.first()?;
    let level = match ch {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let len = rest.iter().take_while(|&&b| b == ch).count();
    is_blank(&rest[len..]).then_some(level)
}

/// A `$$` line opening or closing a math block.
pub fn is_math_fence(rest: &[u8]) -> bool {
    rest.starts_with(b"$$") && is_blank(&rest[2..])
}

/// Opening directive fence `:::{name} info`. Returns the colon count,
/// the name span and the trimmed info span.
pub fn scan_directive_open(rest: &[u8]) -> Option<(usize, (usize, usize), (usize, usize))> {
    let colons = rest.iter().take_while(|&&b| b == b':').count();
    if colons < 3 || rest.get(colons) != Some(&b'{') {
        return None;
    }
    let name_start = colons + 1;
    let mut i = name_start;
    while i < rest.len() && is_name_byte(rest[i]) {
        i += 1;
    }
    if i == name_start || rest.get(i) != Some(&b'}') || !rest[name_start].is_ascii_alphanumeric() {
        return None;
    }
    let name = (name_start, i);
    let mut start = i + 1;
    while start < rest.len() && is_space_or_tab(rest[start]) {
        start += 1;
    }
    let mut end = rest.len();
    while end > start && is_space_or_tab(rest[end - 1]) {
        end -= 1;
    }
    Some((colons, name, (start, end)))
}

/// Closing directive fence: only colons. Returns the colon count.
pub fn scan_directive_close(rest: &[u8]) -> Option<usize> {
    let colons = rest.iter().take_while(|&&b| b == b':').count();
    (colons >= 3 && is_blank(&rest[colons..])).then_some(colons)
}

/// Footnote definition start `[^label]:`. Returns the label span and the
/// offset after the colon.
pub fn scan_footnote_def(rest: &[u8]) -> Option<(usize, usize, usize)> {
    if !rest.starts_with(b"[^") {
        return None;
    }
    let start = 2;
    let mut i = start;
    while i < rest.len() && rest[i] != b']' {
        match rest[i] {
            b'[' => return None,
            b if b.is_ascii_whitespace() => return None,
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    if i == start || i >= rest.len() || i - start > MAX_LINK_LABEL_LEN {
        return None;
    }
    (rest.get(i + 1) == Some(&b':')).then_some((start, i, i + 2))
}

#[inline]
pub fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':' | b'+')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atx(s: &str) -> Option<(u8, &str)> {
        scan_atx_heading(s.as_bytes()).map(|(l, a, b)| (l, &s[a..b]))
    }

    #[test]
    fn atx_headings() {
        assert_eq!(atx("# foo"), Some((1, "foo")));
        assert_eq!(atx("###### foo"), Some((6, "foo")));
        assert_eq!(atx("####### foo"), None);
        assert_eq!(atx("#5 bolt"), None);
        assert_eq!(atx("#"), Some((1, "")));
        assert_eq!(atx("## foo ##  "), Some((2, "foo")));
        assert_eq!(atx("# foo#"), Some((1, "foo#")));
        assert_eq!(atx("### foo \\###"), Some((3, "foo \\###")));
        assert_eq!(atx("### ###"), Some((3, "")));
        assert_eq!(atx("#\tfoo"), Some((1, "foo")));
    }

    #[test]
    fn fences() {
        assert_eq!(scan_open_fence(b"```rust "), Some((b'`', 3, 3, 7)));
        assert_eq!(scan_open_fence(b"``"), None);
        assert_eq!(scan_open_fence(b"``` a`b"), None);
        assert_eq!(scan_open_fence(b"~~~ a`b"), Some((b'~', 3, 4, 7)));
        assert!(is_closing_fence(b"````  ", b'`', 3));
        assert!(!is_closing_fence(b"``", b'`', 3));
        assert!(!is_closing_fence(b"``` x", b'`', 3));
    }

    #[test]
    fn breaks_and_underlines() {
        assert!(is_thematic_break(b"* * *"));
        assert!(is_thematic_break(b"_____"));
        assert!(!is_thematic_break(b"--a"));
        assert!(!is_thematic_break(b"*-*"));
        assert_eq!(scan_setext_underline(b"===  "), Some(1));
        assert_eq!(scan_setext_underline(b"-"), Some(2));
        assert_eq!(scan_setext_underline(b"= ="), None);
    }

    #[test]
    fn directive_fences() {
        let line = b":::{note} Title here ";
        let (colons, name, info) = scan_directive_open(line).unwrap();
        assert_eq!(colons, 3);
        assert_eq!(&line[name.0..name.1], b"note");
        assert_eq!(&line[info.0..info.1], b"Title here");
        assert!(scan_directive_open(b"::{note}").is_none());
        assert!(scan_directive_open(b":::{}").is_none());
        assert!(scan_directive_open(b":::note").is_none());
        assert_eq!(scan_directive_close(b"::::  "), Some(4));
        assert_eq!(scan_directive_close(b"::: x"), None);
    }

    #[test]
    fn footnote_definitions() {
        assert_eq!(scan_footnote_def(b"[^1]: text"), Some((2, 3, 5)));
        assert_eq!(scan_footnote_def(b"[^note]:"), Some((2, 6, 8)));
        assert_eq!(scan_footnote_def(b"[^]: x"), None);
        assert_eq!(scan_footnote_def(b"[^a b]: x"), None);
        assert_eq!(scan_footnote_def(b"[^a] x"), None);
        assert_eq!(scan_footnote_def(b"[a]: x"), None);
    }

    #[test]
    fn math_fence() {
        assert!(is_math_fence(b"$$  "));
        assert!(!is_math_fence(b"$$x$$"));
    }
}
