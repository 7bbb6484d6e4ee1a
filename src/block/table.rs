//! GFM table rows.
//!
//! A table is recognized when the last line of an open paragraph is
//! followed by a delimiter row with the same number of cells. Cell spans
//! are relative to the slice passed in.

use crate::ast::Alignment;
use crate::lexer::is_space_or_tab;
use crate::limits::MAX_TABLE_COLUMNS;
use smallvec::SmallVec;

pub type Cells = SmallVec<[(usize, usize); 8]>;

/// Split a row on unescaped pipes. A leading and a trailing pipe are
/// optional; cell contents are trimmed.
pub fn split_row(row: &[u8]) -> Cells {
    let mut end = row.len();
    while end > 0 && is_space_or_tab(row[end - 1]) {
        end -= 1;
    }
    let mut start = 0;
    while start < end && is_space_or_tab(row[start]) {
        start += 1;
    }
    if start < end && row[start] == b'|' {
        start += 1;
    }
    if end > start && row[end - 1] == b'|' && !is_escaped(row, end - 1) {
        end -= 1;
    }

    let mut cells = Cells::new();
    if start >= end && row.contains(&b'|') {
        // A lone pipe has no cells.
        return cells;
    }
    let mut cell_start = start;
    let mut i = start;
    while i < end {
        match row[i] {
            b'\\' => i += 2,
            b'|' => {
                cells.push(trim(row, cell_start, i));
                cell_start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    cells.push(trim(row, cell_start, end.max(cell_start)));
    cells
}

fn is_escaped(row: &[u8], pos: usize) -> bool {
    let backslashes = row[..pos].iter().rev().take_while(|&&b| b == b'\\').count();
    backslashes % 2 == 1
}

fn trim(row: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    end = end.min(row.len());
    while start < end && is_space_or_tab(row[start]) {
        start += 1;
    }
    while end > start && is_space_or_tab(row[end - 1]) {
        end -= 1;
    }
    (start, end)
}

/// Parse a delimiter row such as `| :--- | ---: |`. Returns one alignment
/// per column, or `None` when the line is not a delimiter row.
pub fn parse_delimiter_row(row: &[u8]) -> Option<Vec<Alignment>> {
    let first = row.iter().position(|&b| !is_space_or_tab(b))?;
    if !matches!(row[first], b'|' | b'-' | b':') {
        return None;
    }
    let cells = split_row(row);
    if cells.is_empty() || cells.len() > MAX_TABLE_COLUMNS {
        return None;
    }
    let has_pipe = memchr::memchr(b'|', row).is_some();
    if cells.len() == 1 && !has_pipe {
        return None;
    }
    cells
        .iter()
        .map(|&(s, e)| parse_alignment(&row[s..e]))
        .collect()
}

fn parse_alignment(cell: &[u8]) -> Option<Alignment> {
    let left = cell.first() == Some(&b':');
    let right = cell.len() > 1 && cell.last() == Some(&b':');
    let dashes = &cell[left as usize..cell.len() - right as usize];
    if dashes.is_empty() || !dashes.iter().all(|&b| b == b'-') {
        return None;
    }
    Some(match (left, right) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
    })
}
