//! Column-aware cursor over a single source line.
//!
//! Block structure in CommonMark depends on columns, not bytes: a tab
//! advances to the next multiple of four and may be consumed only
//! partially (e.g. `>\tfoo` strips one column of the tab as the optional
//! space after the quote marker). The cursor tracks byte offset and column
//! together and remembers whether the tab under it is partially consumed.

use crate::lexer::Line;

/// Tab stop width.
pub const TAB_STOP: usize = 4;

/// A cursor for one line of the source buffer.
///
/// # Example
/// ```
/// use markloom::cursor::LineCursor;
/// use markloom::lexer::lex;
///
/// let src = b"  \t> quote";
/// let lines = lex(src);
/// let mut cursor = LineCursor::new(src, lines[0]);
/// cursor.find_next_nonspace();
/// assert_eq!(cursor.indent(), 4);
/// assert_eq!(cursor.peek_nonspace(), Some(b'>'));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LineCursor<'a> {
    input: &'a [u8],
    end: usize,
    offset: usize,
    column: usize,
    partial_tab: bool,
    next_nonspace: usize,
    next_nonspace_column: usize,
}

impl<'a> LineCursor<'a> {
    #[inline]
    pub fn new(input: &'a [u8], line: Line) -> Self {
        Self {
            input,
            end: line.end as usize,
            offset: line.start as usize,
            column: 0,
            partial_tab: false,
            next_nonspace: line.start as usize,
            next_nonspace_column: 0,
        }
    }

    /// Current byte offset into the source buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// End of the line content (line ending excluded).
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Whether the tab at the current offset has been partially consumed.
    #[inline]
    pub fn partial_tab(&self) -> bool {
        self.partial_tab
    }

    /// Byte at the current offset.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        if self.offset < self.end {
            Some(self.input[self.offset])
        } else {
            None
        }
    }

    /// Byte `n` positions after the current offset.
    #[inline]
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        let pos = self.offset + n;
        if pos < self.end {
            Some(self.input[pos])
        } else {
            None
        }
    }

    /// Rest of the line from the current offset.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.offset.min(self.end)..self.end]
    }

    /// Locate the next non-space character without moving.
    #[inline]
    pub fn find_next_nonspace(&mut self) {
        let mut i = self.offset;
        let mut cols = self.column;
        while i < self.end {
            match self.input[i] {
                b' ' => {
                    i += 1;
                    cols += 1;
                }
                b'\t' => {
                    i += 1;
                    cols += TAB_STOP - (cols % TAB_STOP);
                }
                _ => break,
            }
        }
        self.next_nonspace = i;
        self.next_nonspace_column = cols;
    }

    /// Indentation in columns from the current column to the next
    /// non-space character. Valid after [`find_next_nonspace`](Self::find_next_nonspace).
    #[inline]
    pub fn indent(&self) -> usize {
        self.next_nonspace_column - self.column
    }

    /// Offset of the next non-space character.
    #[inline]
    pub fn next_nonspace(&self) -> usize {
        self.next_nonspace
    }

    #[inline]
    pub fn next_nonspace_column(&self) -> usize {
        self.next_nonspace_column
    }

    /// Byte at the next non-space position.
    #[inline]
    pub fn peek_nonspace(&self) -> Option<u8> {
        if self.next_nonspace < self.end {
            Some(self.input[self.next_nonspace])
        } else {
            None
        }
    }

    /// The line has nothing but whitespace after the current offset.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.next_nonspace >= self.end
    }

    /// Jump to the next non-space character.
    #[inline]
    pub fn advance_next_nonspace(&mut self) {
        self.offset = self.next_nonspace;
        self.column = self.next_nonspace_column;
        self.partial_tab = false;
    }

    /// Advance by `count` bytes, or by `count` columns when `columns` is set.
    /// Counting columns may stop in the middle of a tab.
    pub fn advance(&mut self, mut count: usize, columns: bool) {
        while count > 0 && self.offset < self.end {
            if self.input[self.offset] == b'\t' {
                let to_tab = TAB_STOP - (self.column % TAB_STOP);
                if columns {
                    self.partial_tab = to_tab > count;
                    let step = count.min(to_tab);
                    self.column += step;
                    if !self.partial_tab {
                        self.offset += 1;
                    }
                    count -= step;
                } else {
                    self.partial_tab = false;
                    self.column += to_tab;
                    self.offset += 1;
                    count -= 1;
                }
            } else {
                self.partial_tab = false;
                self.offset += 1;
                self.column += 1;
                count -= 1;
            }
        }
    }

    /// Columns still owed by a partially consumed tab.
    #[inline]
    pub fn remaining_tab_columns(&self) -> usize {
        if self.partial_tab {
            TAB_STOP - (self.column % TAB_STOP)
        } else {
            0
        }
    }

    /// Advance to the end of the line.
    #[inline]
    pub fn advance_to_end(&mut self) {
        self.offset = self.end;
        self.partial_tab = false;
    }
}
