//! Raw HTML recognition (tags, comments, processing instructions,
//! declarations, CDATA).
//!
//! Every scanner takes the text and the offset of a `<` and returns the
//! offset just past the construct. They are shared with HTML block start
//! condition 7.

use memchr::memmem;

#[inline]
fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C)
}

fn skip_ws(text: &[u8], mut i: usize) -> usize {
    while i < text.len() && is_ws(text[i]) {
        i += 1;
    }
    i
}

fn scan_tag_name(text: &[u8], start: usize) -> Option<usize> {
    if !text.get(start)?.is_ascii_alphabetic() {
        return None;
    }
    let mut i = start + 1;
    while i < text.len() && (text[i].is_ascii_alphanumeric() || text[i] == b'-') {
        i += 1;
    }
    Some(i)
}

/// `<tag attr="v" ...>` or `<tag/>`.
pub fn scan_open_tag(text: &[u8], lt: usize) -> Option<usize> {
    let mut i = scan_tag_name(text, lt + 1)?;
    loop {
        let after_ws = skip_ws(text, i);
        match text.get(after_ws)? {
            b'>' => return Some(after_ws + 1),
            b'/' => return (text.get(after_ws + 1) == Some(&b'>')).then_some(after_ws + 2),
            _ => {}
        }
        // Attributes must be preceded by whitespace.
        if after_ws == i {
            return None;
        }
        i = scan_attribute(text, after_ws)?;
    }
}

fn scan_attribute(text: &[u8], start: usize) -> Option<usize> {
    let first = *text.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_' || first == b':') {
        return None;
    }
    let mut i = start + 1;
    while i < text.len()
        && (text[i].is_ascii_alphanumeric() || matches!(text[i], b'_' | b'.' | b':' | b'-'))
    {
        i += 1;
    }
    let after_ws = skip_ws(text, i);
    if text.get(after_ws) != Some(&b'=') {
        return Some(i);
    }
    let value = skip_ws(text, after_ws + 1);
    match *text.get(value)? {
        q @ (b'"' | b'\'') => {
            let close = memchr::memchr(q, &text[value + 1..])?;
            Some(value + 1 + close + 1)
        }
        _ => {
            let mut j = value;
            while j < text.len()
                && !is_ws(text[j])
                && !matches!(text[j], b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
            {
                j += 1;
            }
            (j > value).then_some(j)
        }
    }
}

/// `</tag >`.
pub fn scan_closing_tag(text: &[u8], lt: usize) -> Option<usize> {
    if text.get(lt + 1) != Some(&b'/') {
        return None;
    }
    let i = skip_ws(text, scan_tag_name(text, lt + 2)?);
    (text.get(i) == Some(&b'>')).then_some(i + 1)
}

/// Any inline raw HTML construct starting at `lt`.
pub fn scan_raw_html(text: &[u8], lt: usize) -> Option<usize> {
    match text.get(lt + 1)? {
        b'!' => {
            let rest = &text[lt + 2..];
            if rest.starts_with(b"--") {
                scan_comment(text, lt)
            } else if rest.starts_with(b"[CDATA[") {
                find_end(text, lt + 9, b"]]>")
            } else if rest.first().is_some_and(u8::is_ascii_alphabetic) {
                memchr::memchr(b'>', rest).map(|p| lt + 2 + p + 1)
            } else {
                None
            }
        }
        b'?' => find_end(text, lt + 2, b"?>"),
        b'/' => scan_closing_tag(text, lt),
        _ => scan_open_tag(text, lt),
    }
}

fn scan_comment(text: &[u8], lt: usize) -> Option<usize> {
    let body = lt + 4;
    let rest = &text[body..];
    if rest.starts_with(b">") {
        return Some(body + 1);
    }
    if rest.starts_with(b"->") {
        return Some(body + 2);
    }
    find_end(text, body, b"-->")
}

fn find_end(text: &[u8], from: usize, terminator: &[u8]) -> Option<usize> {
    let rest = text.get(from..)?;
    memmem::find(rest, terminator).map(|p| from + p + terminator.len())
}
