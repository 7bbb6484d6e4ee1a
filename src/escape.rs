//! Escaping, unescaping and URL encoding.
//!
//! HTML escaping is fast-path optimized: scan for the first escapable
//! byte, then bulk-copy the segments between escapes.

use memchr::{memchr, memchr3};

/// Bytes that must be escaped in HTML text and attribute values.
const ESCAPE_TABLE: [bool; 256] = {
    let mut table = [false; 256];
    table[b'<' as usize] = true;
    table[b'>' as usize] = true;
    table[b'&' as usize] = true;
    table[b'"' as usize] = true;
    table
};

/// Escape HTML text content into output buffer.
///
/// Escapes `<`, `>`, `&` and `"` to their entity equivalents.
///
/// # Example
/// ```
/// use markloom::escape::escape_text_into;
///
/// let mut out = Vec::new();
/// escape_text_into(&mut out, b"<script>");
/// assert_eq!(out, b"&lt;script&gt;");
/// ```
#[inline]
pub fn escape_text_into(out: &mut Vec<u8>, input: &[u8]) {
    if input.is_empty() {
        return;
    }

    let mut pos = match first_escape(input) {
        Some(p) => p,
        None => {
            out.extend_from_slice(input);
            return;
        }
    };

    out.extend_from_slice(&input[..pos]);

    while pos < input.len() {
        let scan_start = pos;
        while pos < input.len() && !ESCAPE_TABLE[input[pos] as usize] {
            pos += 1;
        }
        if pos > scan_start {
            out.extend_from_slice(&input[scan_start..pos]);
        }
        if pos < input.len() {
            let seq: &[u8] = match input[pos] {
                b'<' => b"&lt;",
                b'>' => b"&gt;",
                b'&' => b"&amp;",
                _ => b"&quot;",
            };
            out.extend_from_slice(seq);
            pos += 1;
        }
    }
}

/// Escape an attribute value. Same byte set as text.
#[inline]
pub fn escape_attr_into(out: &mut Vec<u8>, input: &[u8]) {
    escape_text_into(out, input)
}

/// Check if a byte slice needs any escaping.
#[inline]
pub fn needs_escape(input: &[u8]) -> bool {
    first_escape(input).is_some()
}

#[inline]
fn first_escape(input: &[u8]) -> Option<usize> {
    let a = memchr3(b'<', b'>', b'&', input);
    let b = memchr(b'"', input);
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Escape and return as a String.
///
/// Prefer `escape_text_into` to reuse buffers.
pub fn escape_text_to_string(input: &str) -> String {
    let mut out = Vec::with_capacity(input.len() + input.len() / 8);
    escape_text_into(&mut out, input.as_bytes());
    // Only ASCII sequences were inserted between whole UTF-8 runs.
    String::from_utf8(out).unwrap_or_default()
}

/// ASCII punctuation: the characters a backslash can escape.
#[inline]
pub fn is_ascii_punctuation(b: u8) -> bool {
    b.is_ascii_punctuation()
}

/// Percent-encode a link destination and HTML-escape the result for use
/// in an `href` or `src` attribute.
///
/// Bytes that are safe in a URL pass through, existing `%XX` escapes are
/// kept, everything else (spaces, non-ASCII, `\`, `[`, `]`, `` ` ``...)
/// becomes `%XX`. `&` ends up as `&amp;`.
///
/// # Example
/// ```
/// use markloom::escape::encode_href_into;
///
/// let mut out = Vec::new();
/// encode_href_into(&mut out, "/föö?a=1&b=[2]".as_bytes());
/// assert_eq!(out, b"/f%C3%B6%C3%B6?a=1&amp;b=%5B2%5D");
/// ```
pub fn encode_href_into(out: &mut Vec<u8>, input: &[u8]) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut i = 0;
    while i < input.len() {
        let b = input[i];
        match b {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'%' if input.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && input.get(i + 2).is_some_and(u8::is_ascii_hexdigit) =>
            {
                out.push(b'%');
            }
            _ if is_url_safe(b) => out.push(b),
            _ => {
                out.push(b'%');
                out.push(HEX[(b >> 4) as usize]);
                out.push(HEX[(b & 0xF) as usize]);
            }
        }
        i += 1;
    }
}

#[inline]
fn is_url_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b';' | b'/'
                | b'?'
                | b':'
                | b'@'
                | b'='
                | b'+'
                | b'$'
                | b','
                | b'-'
                | b'_'
                | b'.'
                | b'!'
                | b'~'
                | b'*'
                | b'\''
                | b'('
                | b')'
                | b'#'
        )
}

/// HTML5 named references that expand to two code points. The general
/// table only carries their first one. Sorted by name.
static TWO_CODE_POINT_ENTITIES: [(&str, &str); 93] = [
    ("NotEqualTilde", "\u{2242}\u{0338}"),
    ("NotGreaterFullEqual", "\u{2267}\u{0338}"),
    ("NotGreaterGreater", "\u{226B}\u{0338}"),
    ("NotGreaterSlantEqual", "\u{2A7E}\u{0338}"),
    ("NotHumpDownHump", "\u{224E}\u{0338}"),
    ("NotHumpEqual", "\u{224F}\u{0338}"),
    ("NotLeftTriangleBar", "\u{29CF}\u{0338}"),
    ("NotLessLess", "\u{226A}\u{0338}"),
    ("NotLessSlantEqual", "\u{2A7D}\u{0338}"),
    ("NotNestedGreaterGreater", "\u{2AA2}\u{0338}"),
    ("NotNestedLessLess", "\u{2AA1}\u{0338}"),
    ("NotPrecedesEqual", "\u{2AAF}\u{0338}"),
    ("NotRightTriangleBar", "\u{29D0}\u{0338}"),
    ("NotSquareSubset", "\u{228F}\u{0338}"),
    ("NotSquareSuperset", "\u{2290}\u{0338}"),
    ("NotSubset", "\u{2282}\u{20D2}"),
    ("NotSucceedsEqual", "\u{2AB0}\u{0338}"),
    ("NotSucceedsTilde", "\u{227F}\u{0338}"),
    ("NotSuperset", "\u{2283}\u{20D2}"),
    ("ThickSpace", "\u{205F}\u{200A}"),
    ("acE", "\u{223E}\u{0333}"),
    ("bne", "=\u{20E5}"),
    ("bnequiv", "\u{2261}\u{20E5}"),
    ("caps", "\u{2229}\u{FE00}"),
    ("cups", "\u{222A}\u{FE00}"),
    ("fjlig", "fj"),
    ("gesl", "\u{22DB}\u{FE00}"),
    ("gvertneqq", "\u{2269}\u{FE00}"),
    ("gvnE", "\u{2269}\u{FE00}"),
    ("lates", "\u{2AAD}\u{FE00}"),
    ("lesg", "\u{22DA}\u{FE00}"),
    ("lvertneqq", "\u{2268}\u{FE00}"),
    ("lvnE", "\u{2268}\u{FE00}"),
    ("nGg", "\u{22D9}\u{0338}"),
    ("nGt", "\u{226B}\u{20D2}"),
    ("nGtv", "\u{226B}\u{0338}"),
    ("nLl", "\u{22D8}\u{0338}"),
    ("nLt", "\u{226A}\u{20D2}"),
    ("nLtv", "\u{226A}\u{0338}"),
    ("nang", "\u{2220}\u{20D2}"),
    ("napE", "\u{2A70}\u{0338}"),
    ("napid", "\u{224B}\u{0338}"),
    ("nbump", "\u{224E}\u{0338}"),
    ("nbumpe", "\u{224F}\u{0338}"),
    ("ncongdot", "\u{2A6D}\u{0338}"),
    ("nedot", "\u{2250}\u{0338}"),
    ("nesim", "\u{2242}\u{0338}"),
    ("ngE", "\u{2267}\u{0338}"),
    ("ngeqq", "\u{2267}\u{0338}"),
    ("ngeqslant", "\u{2A7E}\u{0338}"),
    ("nges", "\u{2A7E}\u{0338}"),
    ("nlE", "\u{2266}\u{0338}"),
    ("nleqq", "\u{2266}\u{0338}"),
    ("nleqslant", "\u{2A7D}\u{0338}"),
    ("nles", "\u{2A7D}\u{0338}"),
    ("notinE", "\u{22F9}\u{0338}"),
    ("notindot", "\u{22F5}\u{0338}"),
    ("nparsl", "\u{2AFD}\u{20E5}"),
    ("npart", "\u{2202}\u{0338}"),
    ("npre", "\u{2AAF}\u{0338}"),
    ("npreceq", "\u{2AAF}\u{0338}"),
    ("nrarrc", "\u{2933}\u{0338}"),
    ("nrarrw", "\u{219D}\u{0338}"),
    ("nsce", "\u{2AB0}\u{0338}"),
    ("nsubE", "\u{2AC5}\u{0338}"),
    ("nsubset", "\u{2282}\u{20D2}"),
    ("nsubseteqq", "\u{2AC5}\u{0338}"),
    ("nsucceq", "\u{2AB0}\u{0338}"),
    ("nsupE", "\u{2AC6}\u{0338}"),
    ("nsupset", "\u{2283}\u{20D2}"),
    ("nsupseteqq", "\u{2AC6}\u{0338}"),
    ("nvap", "\u{224D}\u{20D2}"),
    ("nvge", "\u{2265}\u{20D2}"),
    ("nvgt", ">\u{20D2}"),
    ("nvle", "\u{2264}\u{20D2}"),
    ("nvlt", "<\u{20D2}"),
    ("nvltrie", "\u{22B4}\u{20D2}"),
    ("nvrtrie", "\u{22B5}\u{20D2}"),
    ("nvsim", "\u{223C}\u{20D2}"),
    ("race", "\u{223D}\u{0331}"),
    ("smtes", "\u{2AAC}\u{FE00}"),
    ("sqcaps", "\u{2293}\u{FE00}"),
    ("sqcups", "\u{2294}\u{FE00}"),
    ("varsubsetneq", "\u{228A}\u{FE00}"),
    ("varsubsetneqq", "\u{2ACB}\u{FE00}"),
    ("varsupsetneq", "\u{228B}\u{FE00}"),
    ("varsupsetneqq", "\u{2ACC}\u{FE00}"),
    ("vnsub", "\u{2282}\u{20D2}"),
    ("vnsup", "\u{2283}\u{20D2}"),
    ("vsubnE", "\u{2ACB}\u{FE00}"),
    ("vsubne", "\u{228A}\u{FE00}"),
    ("vsupnE", "\u{2ACC}\u{FE00}"),
    ("vsupne", "\u{228B}\u{FE00}"),
];

/// Decode the character reference at the start of `input`, which must
/// begin with `&`. Returns the decoded text and the bytes consumed.
///
/// Numeric references outside the Unicode range, surrogates and `&#0;`
/// decode to U+FFFD. Named references are looked up in the HTML5 table.
pub fn decode_entity(input: &[u8]) -> Option<(String, usize)> {
    if input.first() != Some(&b'&') {
        return None;
    }
    if input.get(1) == Some(&b'#') {
        let (hex, digits_start) = match input.get(2) {
            Some(b'x' | b'X') => (true, 3),
            _ => (false, 2),
        };
        let max_digits = if hex { 6 } else { 7 };
        let mut end = digits_start;
        let mut value: u32 = 0;
        while end < input.len() && end - digits_start < max_digits {
            let d = match (hex, input[end]) {
                (true, c) if c.is_ascii_hexdigit() => (c as char).to_digit(16),
                (false, c) if c.is_ascii_digit() => Some((c - b'0') as u32),
                _ => None,
            };
            match d {
                Some(d) => value = value * if hex { 16 } else { 10 } + d,
                None => break,
            }
            end += 1;
        }
        if end == digits_start || input.get(end) != Some(&b';') {
            return None;
        }
        let ch = match value {
            0 => '\u{FFFD}',
            v => char::from_u32(v).unwrap_or('\u{FFFD}'),
        };
        return Some((ch.to_string(), end + 1));
    }

    // Named: `&` [A-Za-z][A-Za-z0-9]* `;`, longest HTML5 name is 31 bytes.
    let mut end = 1;
    while end < input.len() && end <= 32 && input[end].is_ascii_alphanumeric() {
        end += 1;
    }
    if end == 1 || !input[1].is_ascii_alphabetic() || input.get(end) != Some(&b';') {
        return None;
    }
    let candidate = std::str::from_utf8(&input[..=end]).ok()?;
    let name = &candidate[1..end];
    if let Ok(idx) = TWO_CODE_POINT_ENTITIES.binary_search_by(|(n, _)| (*n).cmp(name)) {
        return Some((TWO_CODE_POINT_ENTITIES[idx].1.to_string(), end + 1));
    }
    let decoded = html_escape::decode_html_entities(candidate);
    if decoded == candidate || (decoded.ends_with(';') && candidate != "&semi;") {
        return None;
    }
    Some((decoded.into_owned(), end + 1))
}

/// Resolve backslash escapes and character references.
///
/// Used for link destinations, titles and code block info strings.
pub fn unescape(input: &str) -> String {
    let bytes = input.as_bytes();
    if memchr::memchr2(b'\\', b'&', bytes).is_none() {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut copied = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1).is_some_and(|&b| is_ascii_punctuation(b)) => {
                out.push_str(&input[copied..i]);
                out.push(bytes[i + 1] as char);
                i += 2;
                copied = i;
            }
            b'&' => match decode_entity(&bytes[i..]) {
                Some((text, len)) => {
                    out.push_str(&input[copied..i]);
                    out.push_str(&text);
                    i += len;
                    copied = i;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    out.push_str(&input[copied..]);
    out
}
