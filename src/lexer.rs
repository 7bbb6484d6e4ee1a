//! Line lexer and block-start classification.
//!
//! `lex` splits the source into zero-copy line spans in a single
//! left-to-right pass. Block parsing then asks [`classify`] which block
//! starts are even possible at a position: a single table lookup on the
//! first non-space byte, so every line costs O(1) dispatch before any
//! bounded lookahead.

use memchr::memchr2;

/// One source line. Offsets index the source buffer; the line ending
/// (`\n`, `\r\n` or `\r`) lies between `end` and `next`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line {
    pub start: u32,
    pub end: u32,
    pub next: u32,
}

impl Line {
    #[inline]
    pub fn content<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.start as usize..self.end as usize]
    }
}

/// Split `input` into lines.
///
/// A trailing line ending does not produce an extra empty line.
pub fn lex(input: &[u8]) -> Vec<Line> {
    let mut lines = Vec::with_capacity(input.len() / 40 + 1);
    let mut pos = 0;
    while pos < input.len() {
        match memchr2(b'\n', b'\r', &input[pos..]) {
            Some(rel) => {
                let end = pos + rel;
                let next = if input[end] == b'\r' && input.get(end + 1) == Some(&b'\n') {
                    end + 2
                } else {
                    end + 1
                };
                lines.push(Line {
                    start: pos as u32,
                    end: end as u32,
                    next: next as u32,
                });
                pos = next;
            }
            None => {
                lines.push(Line {
                    start: pos as u32,
                    end: input.len() as u32,
                    next: input.len() as u32,
                });
                pos = input.len();
            }
        }
    }
    lines
}

/// Which block constructs may start with a given byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeadClass {
    /// Only a paragraph (or lazy continuation) can start here.
    Plain,
    /// `#`: ATX heading.
    Hash,
    /// `` ` `` or `~`: code fence.
    Fence,
    /// `>`: block quote.
    Quote,
    /// `-`: bullet, thematic break or setext underline.
    Dash,
    /// `*`: bullet or thematic break.
    Star,
    /// `+`: bullet.
    Plus,
    /// `_`: thematic break.
    Underscore,
    /// `=`: setext underline.
    Equals,
    /// `0-9`: ordered list marker.
    Digit,
    /// `<`: HTML block.
    Angle,
    /// `[`: footnote definition (link reference definitions are
    /// recognized when a paragraph closes).
    Bracket,
    /// `:`: fenced directive.
    Colon,
    /// `|`: table row.
    Pipe,
    /// `$`: math block.
    Dollar,
}

static LEAD_TABLE: [LeadClass; 256] = {
    let mut table = [LeadClass::Plain; 256];
    table[b'#' as usize] = LeadClass::Hash;
    table[b'`' as usize] = LeadClass::Fence;
    table[b'~' as usize] = LeadClass::Fence;
    table[b'>' as usize] = LeadClass::Quote;
    table[b'-' as usize] = LeadClass::Dash;
    table[b'*' as usize] = LeadClass::Star;
    table[b'+' as usize] = LeadClass::Plus;
    table[b'_' as usize] = LeadClass::Underscore;
    table[b'=' as usize] = LeadClass::Equals;
    let mut d = b'0';
    while d <= b'9' {
        table[d as usize] = LeadClass::Digit;
        d += 1;
    }
    table[b'<' as usize] = LeadClass::Angle;
    table[b'[' as usize] = LeadClass::Bracket;
    table[b':' as usize] = LeadClass::Colon;
    table[b'|' as usize] = LeadClass::Pipe;
    table[b'$' as usize] = LeadClass::Dollar;
    table
};

/// Classify the byte that begins a line's content.
#[inline]
pub fn classify(b: u8) -> LeadClass {
    LEAD_TABLE[b as usize]
}

/// ASCII whitespace as CommonMark defines it for line content.
#[inline]
pub fn is_space_or_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
