//! Inline tokens.
//!
//! The inline tokenizer turns a span of inline content into a flat list of
//! tokens. Tokens are never changed after they are pushed: emphasis
//! matching keeps its bookkeeping in a separate
//! [`MatchRegistry`](crate::inline::MatchRegistry), and a resolved link
//! replaces the tokens it spans with a single [`Token::PrebuiltNode`].
//!
//! Ranges are offsets into the joined inline text, not into the source.

use crate::Range;
use crate::ast::Inline;

/// A maximal run of `*`, `_` or `~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterRun {
    pub ch: u8,
    pub range: Range,
    pub can_open: bool,
    pub can_close: bool,
}

impl DelimiterRun {
    /// Length of the run as written.
    #[inline]
    pub fn len(&self) -> u32 {
        self.range.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text. `decoded` holds the value when it differs from the
    /// source slice (backslash escapes, character references).
    Text {
        range: Range,
        decoded: Option<Box<str>>,
    },
    DelimiterRun(DelimiterRun),
    /// A code span; `content` excludes the backtick fences.
    CodeSpan { range: Range, content: Range },
    RawHtml(Range),
    /// A `[` or `![` that may still open a link. Unmatched openers render
    /// as literal text.
    LinkRef { range: Range, image: bool },
    HardBreak(Range),
    SoftBreak(Range),
    /// A subtree built ahead of emphasis resolution: links, autolinks,
    /// roles and plugin matches.
    PrebuiltNode(Box<Inline>),
}

impl Token {
    pub fn text(range: Range) -> Self {
        Token::Text {
            range,
            decoded: None,
        }
    }

    pub fn decoded(range: Range, value: impl Into<Box<str>>) -> Self {
        Token::Text {
            range,
            decoded: Some(value.into()),
        }
    }

    /// Span in the inline text. Prebuilt nodes report their own location,
    /// which is already mapped to the source.
    pub fn range(&self) -> Option<Range> {
        match self {
            Token::Text { range, .. }
            | Token::CodeSpan { range, .. }
            | Token::LinkRef { range, .. }
            | Token::RawHtml(range)
            | Token::HardBreak(range)
            | Token::SoftBreak(range) => Some(*range),
            Token::DelimiterRun(run) => Some(run.range),
            Token::PrebuiltNode(_) => None,
        }
    }

    pub fn as_delimiter(&self) -> Option<&DelimiterRun> {
        match self {
            Token::DelimiterRun(run) => Some(run),
            _ => None,
        }
    }
}
