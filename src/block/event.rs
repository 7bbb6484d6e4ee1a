//! Block-level event types.

use crate::Range;
use crate::ast::{Alignment, ListKind};

/// Events emitted by the block parser.
///
/// Start events carry the byte offset where the block begins, end events
/// the offset where it ends, so the tree builder can attach locations
/// without re-reading lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEvent {
    /// Start of a paragraph.
    ParagraphStart,
    /// End of a paragraph.
    ParagraphEnd,

    HeadingStart {
        /// Heading level (1-6).
        level: u8,
        pos: u32,
    },
    HeadingEnd {
        pos: u32,
    },

    /// Start of a code block.
    CodeBlockStart {
        /// Info string of a fenced block, escapes not yet resolved.
        info: Option<Range>,
        fenced: bool,
        pos: u32,
    },
    CodeBlockEnd {
        pos: u32,
    },

    BlockQuoteStart {
        pos: u32,
    },
    BlockQuoteEnd {
        pos: u32,
    },

    /// Start of a list. `tight` is patched when the list closes.
    ListStart {
        kind: ListKind,
        tight: bool,
        pos: u32,
    },
    ListEnd {
        tight: bool,
        pos: u32,
    },

    ListItemStart {
        pos: u32,
    },
    ListItemEnd {
        pos: u32,
    },

    /// A thematic break (horizontal rule).
    ThematicBreak(Range),

    HtmlBlockStart {
        pos: u32,
    },
    HtmlBlockEnd {
        pos: u32,
    },

    MathBlockStart {
        pos: u32,
    },
    MathBlockEnd {
        pos: u32,
    },

    /// One line of inline content (paragraph or heading), or a table cell.
    Text(Range),

    /// One line of literal content (code, HTML or math), line ending excluded.
    Code(Range),

    /// Virtual spaces to prepend to the next `Code` line (from tab expansion).
    VirtualSpaces(u8),

    TableStart {
        pos: u32,
    },
    TableEnd {
        pos: u32,
    },
    TableHeadStart,
    TableHeadEnd,
    TableBodyStart,
    TableBodyEnd,
    TableRowStart {
        pos: u32,
    },
    TableRowEnd {
        pos: u32,
    },
    TableCellStart {
        alignment: Alignment,
    },
    TableCellEnd,

    /// Start of a footnote definition.
    FootnoteStart {
        /// Label between `[^` and `]`.
        label: Range,
        pos: u32,
    },
    FootnoteEnd {
        pos: u32,
    },

    /// A fenced directive; the index points into the parser's directive table.
    Directive(u32),
}

/// A `:::{name}` block captured verbatim for the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDirective {
    /// Directive name between the braces.
    pub name: Range,
    /// Rest of the opening fence line, trimmed.
    pub info: Range,
    /// Body lines with their leading virtual spaces.
    pub lines: Vec<(u8, Range)>,
    /// Start of the opening fence.
    pub start: u32,
    /// End of the closing fence, or of the last body line when unclosed.
    pub end: u32,
}

impl RawDirective {
    /// Reassemble the body as a string, one `\n` per line.
    pub fn body(&self, input: &str) -> String {
        let mut body = String::new();
        for &(spaces, line) in &self.lines {
            body.extend(std::iter::repeat_n(' ', spaces as usize));
            body.push_str(line.slice_str(input));
            body.push('\n');
        }
        body
    }

    /// Offset of the first body byte.
    pub fn body_offset(&self) -> u32 {
        self.lines.first().map_or(self.end, |(_, r)| r.start)
    }
}
