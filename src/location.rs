//! Source locations attached to every AST node.

use crate::Range;
use memchr::memchr_iter;

/// Where a node came from: its byte span plus the 1-based line and
/// column of its first byte. Columns count characters, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub start: u32,
    pub end: u32,
}

impl SourceLocation {
    #[inline]
    pub const fn span(&self) -> Range {
        Range::new(self.start, self.end)
    }

    /// Location spanning from the start of `self` to the end of `other`.
    pub fn through(&self, other: &SourceLocation) -> SourceLocation {
        if other.end <= self.end {
            return *self;
        }
        SourceLocation {
            end: other.end,
            ..*self
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets of one source buffer to line/column pairs.
///
/// Built once per parse; lookups are a binary search over line starts.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<u32>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = Vec::with_capacity(bytes.len() / 32 + 1);
        line_starts.push(0);
        for nl in memchr_iter(b'\n', bytes) {
            line_starts.push(nl as u32 + 1);
        }
        Self {
            source,
            line_starts,
        }
    }

    /// 0-based line containing `offset`.
    #[inline]
    pub fn line_of(&self, offset: u32) -> usize {
        self.line_starts.partition_point(|&s| s <= offset) - 1
    }

    /// Resolve a byte range to a location.
    pub fn locate(&self, span: Range) -> SourceLocation {
        let start = span.start.min(self.source.len() as u32);
        let line = self.line_of(start);
        let line_start = self.line_starts[line] as usize;
        let column = match self.source.get(line_start..start as usize) {
            Some(prefix) => prefix.chars().count() + 1,
            None => start as usize - line_start + 1,
        };
        SourceLocation {
            line: line as u32 + 1,
            column: column as u32,
            start: span.start,
            end: span.end,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_first_line() {
        let index = LineIndex::new("hello\nworld");
        let loc = index.locate(Range::new(2, 4));
        assert_eq!((loc.line, loc.column), (1, 3));
    }

    #[test]
    fn locate_later_line_counts_chars() {
        let index = LineIndex::new("a\nää x");
        // "ää " is 5 bytes; 'x' is the fourth character of line 2.
        let loc = index.locate(Range::new(7, 8));
        assert_eq!((loc.line, loc.column), (2, 4));
    }

    #[test]
    fn locate_at_line_start() {
        let index = LineIndex::new("a\n\nb");
        assert_eq!(index.locate(Range::new(3, 4)).line, 3);
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn through_extends_end() {
        let a = SourceLocation { line: 1, column: 1, start: 0, end: 4 };
        let b = SourceLocation { line: 2, column: 1, start: 6, end: 9 };
        assert_eq!(a.through(&b).end, 9);
        assert_eq!(a.through(&b).start, 0);
        assert_eq!(format!("{a}"), "1:1");
    }
}
