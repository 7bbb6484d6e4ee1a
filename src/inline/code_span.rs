//! Code span matching.
//!
//! Code spans have the highest precedence among inline elements. A span
//! opens at a backtick run and closes at the next run of exactly the same
//! length; backslashes do not escape inside it.
//!
//! Closing runs are looked up in an index built on first use: one sorted
//! list of run starts per run length. Each lookup is a binary search, so a
//! line full of unmatched backticks stays linear-ish instead of rescanning
//! the rest of the text for every opener.

use memchr::memchr_iter;
use rustc_hash::FxHashMap;

/// Start offsets of every maximal backtick run, grouped by length.
#[derive(Debug, Default)]
pub struct BacktickIndex {
    runs: FxHashMap<usize, Vec<usize>>,
}

impl BacktickIndex {
    pub fn new(text: &[u8]) -> Self {
        let mut runs: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        let mut next = 0;
        for pos in memchr_iter(b'`', text) {
            if pos < next {
                continue;
            }
            let len = run_length(text, pos);
            runs.entry(len).or_default().push(pos);
            next = pos + len;
        }
        Self { runs }
    }

    /// First run of exactly `len` backticks starting at or after `from`.
    pub fn closer(&self, len: usize, from: usize) -> Option<usize> {
        let starts = self.runs.get(&len)?;
        let i = starts.partition_point(|&s| s < from);
        starts.get(i).copied()
    }
}

/// Number of backticks starting at `pos`.
#[inline]
pub fn run_length(text: &[u8], pos: usize) -> usize {
    text[pos..].iter().take_while(|&&b| b == b'`').count()
}

/// Match the opener of `len` backticks at `pos`. Returns the content span
/// and the offset after the closing run.
pub fn match_code_span(
    text: &[u8],
    pos: usize,
    len: usize,
    index: &BacktickIndex,
) -> Option<(usize, usize, usize)> {
    let content_start = pos + len;
    let close = index.closer(len, content_start)?;
    debug_assert!(run_length(text, close) == len);
    Some((content_start, close, close + len))
}

/// Normalize raw code span content: line endings become spaces, and one
/// space is stripped from both ends when both are present and the content
/// is not all spaces.
pub fn normalize_content(raw: &str) -> String {
    let mut content = raw.replace('\n', " ");
    let bytes = content.as_bytes();
    if bytes.len() >= 2
        && bytes[0] == b' '
        && bytes[bytes.len() - 1] == b' '
        && bytes.iter().any(|&b| b != b' ')
    {
        content.pop();
        content.remove(0);
    }
    content
}
