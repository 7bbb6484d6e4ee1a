//! Inline content as one contiguous buffer.
//!
//! A paragraph's lines are scattered through the source (container
//! prefixes sit between them). The inline tokenizer wants one string, so
//! the lines are joined with `\n` and a small segment table maps offsets
//! in the joined text back to source offsets. A single-line span borrows
//! the source directly.

use crate::Range;
use crate::lexer::is_space_or_tab;
use crate::location::{LineIndex, SourceLocation};
use smallvec::SmallVec;
use std::borrow::Cow;

pub struct InlineSource<'a> {
    text: Cow<'a, str>,
    /// `(offset in text, offset in source)` at the start of every line.
    segments: SmallVec<[(u32, u32); 4]>,
    index: &'a LineIndex<'a>,
}

impl<'a> InlineSource<'a> {
    /// Join `lines` of `source`. Leading whitespace of the first line and
    /// trailing whitespace of the last line are dropped. `base` is added to
    /// every source offset, for text parsed out of a directive body.
    pub fn from_lines(
        source: &'a str,
        lines: &[Range],
        base: u32,
        index: &'a LineIndex<'a>,
    ) -> Self {
        let bytes = source.as_bytes();
        let last = lines.len().saturating_sub(1);
        let mut trimmed: SmallVec<[Range; 4]> = SmallVec::with_capacity(lines.len());
        for (i, &line) in lines.iter().enumerate() {
            let (mut start, mut end) = (line.start_usize(), line.end_usize());
            if i == 0 {
                while start < end && is_space_or_tab(bytes[start]) {
                    start += 1;
                }
            }
            if i == last {
                while end > start && is_space_or_tab(bytes[end - 1]) {
                    end -= 1;
                }
            }
            trimmed.push(Range::from_usize(start, end));
        }

        let mut segments = SmallVec::new();
        let text = match trimmed.as_slice() {
            [] => Cow::Borrowed(""),
            [only] => {
                segments.push((0, only.start + base));
                Cow::Borrowed(only.slice_str(source))
            }
            many => {
                let len = many.iter().map(|r| r.len() as usize + 1).sum();
                let mut joined = String::with_capacity(len);
                for (i, r) in many.iter().enumerate() {
                    if i > 0 {
                        joined.push('\n');
                    }
                    segments.push((joined.len() as u32, r.start + base));
                    joined.push_str(r.slice_str(source));
                }
                Cow::Owned(joined)
            }
        };
        Self {
            text,
            segments,
            index,
        }
    }

    /// Text that does not come from the source verbatim, such as a
    /// directive title. All of it maps to offset `at`.
    pub fn detached(text: &'a str, at: u32, index: &'a LineIndex<'a>) -> Self {
        let mut segments = SmallVec::new();
        segments.push((0, at));
        Self {
            text: Cow::Borrowed(text.trim_matches(|c| c == ' ' || c == '\t' || c == '\n')),
            segments,
            index,
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    #[inline]
    pub fn slice(&self, range: Range) -> &str {
        range.slice_str(&self.text)
    }

    /// Source offset of a text offset.
    pub fn source_offset(&self, pos: u32) -> u32 {
        let i = self.segments.partition_point(|&(t, _)| t <= pos);
        match i.checked_sub(1).and_then(|i| self.segments.get(i)) {
            Some(&(t, s)) => s + (pos - t),
            None => pos,
        }
    }

    /// Map a text range to a source location.
    pub fn locate(&self, range: Range) -> SourceLocation {
        let start = self.source_offset(range.start);
        let end = if range.end > range.start {
            // The end maps through the segment of its last byte, so a span
            // ending at a line break does not leap into the next line.
            self.source_offset(range.end - 1) + 1
        } else {
            start
        };
        self.index.locate(Range::new(start, end.max(start)))
    }
}
