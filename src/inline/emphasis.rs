//! Emphasis, strong emphasis and strikethrough resolution.
//!
//! Implements the CommonMark delimiter-stack algorithm over an immutable
//! token list. All match state (remaining delimiters, partners, whether a
//! run can still take part) lives in a [`MatchRegistry`] owned by one
//! resolve call. The tree is then built from the tokens plus the registry
//! in a single left-to-right pass.
//!
//! Opener lookup is bounded by an "openers bottom" per delimiter character,
//! closer-can-open flag and original length modulo 3, as in the reference
//! implementation. The worst case is still quadratic in the number of
//! delimiter runs of one span.

use super::code_span::normalize_content;
use super::source::InlineSource;
use crate::Range;
use crate::ast::{Code, Inline, RawHtml, Styled, Text};
use crate::limits::MAX_INLINE_NESTING;
use crate::token::{DelimiterRun, Token};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Match state of one delimiter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterState {
    /// Length as written; the "multiple of 3" rule looks at this.
    pub original: u32,
    pub remaining: u32,
    /// False once the run can no longer open or close anything.
    pub active: bool,
    /// Matches where this run is the opener, innermost first.
    pub as_opener: SmallVec<[u32; 2]>,
    /// Matches where this run is the closer, innermost first.
    pub as_closer: SmallVec<[u32; 2]>,
}

impl DelimiterState {
    pub fn consumed(&self) -> u32 {
        self.original - self.remaining
    }
}

/// One matched opener/closer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmphasisMatch {
    /// Token index of the opening run.
    pub opener: u32,
    /// Token index of the closing run.
    pub closer: u32,
    /// Delimiters used from each side: 1 for emphasis, 2 for strong.
    pub count: u32,
    pub ch: u8,
}

/// Per-call match bookkeeping, keyed by token index.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    slots: FxHashMap<u32, DelimiterState>,
    matches: Vec<EmphasisMatch>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking the run at token index `token`.
    pub fn register(&mut self, token: u32, run: &DelimiterRun) {
        self.slots.insert(
            token,
            DelimiterState {
                original: run.len(),
                remaining: run.len(),
                active: true,
                as_opener: SmallVec::new(),
                as_closer: SmallVec::new(),
            },
        );
    }

    /// Record a match and consume `count` delimiters from both runs.
    /// Returns the match id.
    pub fn record(&mut self, opener: u32, closer: u32, count: u32, ch: u8) -> u32 {
        let id = self.matches.len() as u32;
        self.matches.push(EmphasisMatch {
            opener,
            closer,
            count,
            ch,
        });
        if let Some(slot) = self.slots.get_mut(&opener) {
            slot.remaining = slot.remaining.saturating_sub(count);
            slot.as_opener.push(id);
        }
        if let Some(slot) = self.slots.get_mut(&closer) {
            slot.remaining = slot.remaining.saturating_sub(count);
            slot.as_closer.push(id);
        }
        id
    }

    pub fn deactivate(&mut self, token: u32) {
        if let Some(slot) = self.slots.get_mut(&token) {
            slot.active = false;
        }
    }

    pub fn state(&self, token: u32) -> Option<&DelimiterState> {
        self.slots.get(&token)
    }

    pub fn get(&self, id: u32) -> Option<&EmphasisMatch> {
        self.matches.get(id as usize)
    }

    pub fn matches(&self) -> &[EmphasisMatch] {
        &self.matches
    }

    fn usable(&self, token: u32) -> Option<(u32, u32)> {
        self.slots
            .get(&token)
            .filter(|s| s.active && s.remaining > 0)
            .map(|s| (s.original, s.remaining))
    }
}

/// Left/right flanking classification of the run `text[start..end]` of
/// `ch`. Returns `(can_open, can_close)`.
pub fn classify_run(text: &str, start: usize, end: usize, ch: u8) -> (bool, bool) {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let before_space = before.is_none_or(char::is_whitespace);
    let after_space = after.is_none_or(char::is_whitespace);
    let before_punct = before.is_some_and(is_punctuation);
    let after_punct = after.is_some_and(is_punctuation);

    let left_flanking = !after_space && (!after_punct || before_space || before_punct);
    let right_flanking = !before_space && (!before_punct || after_space || after_punct);

    if ch == b'_' {
        (
            left_flanking && (!right_flanking || before_punct),
            right_flanking && (!left_flanking || after_punct),
        )
    } else {
        (left_flanking, right_flanking)
    }
}

/// Unicode punctuation: general categories P and S.
///
/// ASCII is exact. Outside ASCII the common punctuation and symbol blocks
/// are covered by range.
pub fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }
    matches!(c as u32,
        // Latin-1: everything in A1..BF except letters and digits
        0x00A1..=0x00A9 | 0x00AB | 0x00AC | 0x00AE..=0x00B1 | 0x00B4 | 0x00B6..=0x00B8
        | 0x00BB | 0x00BF | 0x00D7 | 0x00F7
        // Spacing modifiers that are symbols
        | 0x02C2..=0x02C5 | 0x02D2..=0x02DF
        // Greek, Armenian, Hebrew, Arabic punctuation
        | 0x037E | 0x0387 | 0x055A..=0x055F | 0x0589 | 0x058A | 0x05BE | 0x05C0 | 0x05C3
        | 0x05F3 | 0x05F4 | 0x060C | 0x060D | 0x061B | 0x061F | 0x066A..=0x066D | 0x06D4
        | 0x0964 | 0x0965 | 0x0E4F | 0x0E5A | 0x0E5B
        // General punctuation, super/subscript signs, currency, letterlike
        | 0x2010..=0x2027 | 0x2030..=0x205E | 0x207A..=0x207E | 0x208A..=0x208E
        | 0x20A0..=0x20C0 | 0x2100..=0x214F
        // Arrows, math, technical, shapes, dingbats, math symbols
        | 0x2190..=0x2426 | 0x2440..=0x244A | 0x2500..=0x2775 | 0x2794..=0x2BFF
        | 0x2CF9..=0x2CFC | 0x2CFE | 0x2CFF | 0x2E00..=0x2E5D
        // CJK symbols and punctuation
        | 0x3001..=0x3004 | 0x3008..=0x3020 | 0x3030 | 0x303D..=0x303F
        | 0x30A0 | 0x30FB
        // Vertical forms, small forms, fullwidth ASCII punctuation
        | 0xFE10..=0xFE19 | 0xFE30..=0xFE6B | 0xFF01..=0xFF0F | 0xFF1A..=0xFF20
        | 0xFF3B..=0xFF40 | 0xFF5B..=0xFF65 | 0xFFE0..=0xFFEE
        // Emoji and pictographs
        | 0x1F300..=0x1FAFF
    )
}

fn char_slot(ch: u8) -> usize {
    match ch {
        b'*' => 0,
        b'_' => 1,
        _ => 2,
    }
}

/// Run the delimiter algorithm over `tokens`, recording matches in
/// `registry`.
pub fn match_delimiters(tokens: &[Token], registry: &mut MatchRegistry) {
    let mut delims: Vec<u32> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(run) = token.as_delimiter() {
            registry.register(i as u32, run);
            delims.push(i as u32);
        }
    }
    if delims.len() < 2 {
        return;
    }

    // Lowest delimiter position worth searching, per closer class.
    let mut bottoms = [[0usize; 6]; 3];
    let mut ci = 0;
    while ci < delims.len() {
        let closer = delims[ci];
        let Some(run) = tokens[closer as usize].as_delimiter() else {
            ci += 1;
            continue;
        };
        let Some((closer_original, closer_remaining)) = registry.usable(closer) else {
            ci += 1;
            continue;
        };
        if !run.can_close {
            ci += 1;
            continue;
        }

        let class = usize::from(run.can_open) * 3 + (closer_original % 3) as usize;
        let bottom = bottoms[char_slot(run.ch)][class];
        let mut found = None;
        let mut oi = ci;
        while oi > bottom {
            oi -= 1;
            let opener = delims[oi];
            let Some(orun) = tokens[opener as usize].as_delimiter() else {
                continue;
            };
            if orun.ch != run.ch || !orun.can_open {
                continue;
            }
            let Some((opener_original, opener_remaining)) = registry.usable(opener) else {
                continue;
            };
            if run.ch == b'~' {
                if opener_remaining == closer_remaining {
                    found = Some((oi, opener_remaining));
                    break;
                }
                continue;
            }
            let odd_match = (orun.can_close || run.can_open)
                && closer_original % 3 != 0
                && (opener_original + closer_original) % 3 == 0;
            if !odd_match {
                found = Some((oi, opener_remaining));
                break;
            }
        }

        match found {
            Some((oi, opener_remaining)) => {
                let opener = delims[oi];
                let count = if run.ch == b'~' {
                    closer_remaining
                } else if opener_remaining >= 2 && closer_remaining >= 2 {
                    2
                } else {
                    1
                };
                registry.record(opener, closer, count, run.ch);
                for &between in &delims[oi + 1..ci] {
                    registry.deactivate(between);
                }
                if registry.usable(opener).is_none() {
                    registry.deactivate(opener);
                }
                if registry.usable(closer).is_none() {
                    registry.deactivate(closer);
                    ci += 1;
                }
            }
            None => {
                bottoms[char_slot(run.ch)][class] = ci;
                if !run.can_open {
                    registry.deactivate(closer);
                }
                ci += 1;
            }
        }
    }
}

/// Resolve emphasis over `tokens` and build the inline nodes.
///
/// Unmatched delimiters, unmatched link openers and runs nested deeper
/// than the inline nesting limit come out as literal text.
pub fn resolve_emphasis(
    tokens: Vec<Token>,
    registry: &mut MatchRegistry,
    source: &InlineSource<'_>,
) -> Vec<Inline> {
    match_delimiters(&tokens, registry);
    let mut tree = TreeBuilder::new(source, registry);
    for (i, token) in tokens.into_iter().enumerate() {
        tree.token(i as u32, token);
    }
    tree.finish()
}

struct Frame {
    match_id: u32,
    open: Range,
    children: Vec<Inline>,
}

struct TreeBuilder<'s, 'r> {
    source: &'s InlineSource<'s>,
    registry: &'r MatchRegistry,
    root: Vec<Inline>,
    stack: Vec<Frame>,
    /// Matches rendered as literal delimiters because of the nesting limit.
    flattened: Vec<u32>,
    text: Option<(String, Range)>,
}

impl<'s, 'r> TreeBuilder<'s, 'r> {
    fn new(source: &'s InlineSource<'s>, registry: &'r MatchRegistry) -> Self {
        Self {
            source,
            registry,
            root: Vec::new(),
            stack: Vec::new(),
            flattened: Vec::new(),
            text: None,
        }
    }

    fn children(&mut self) -> &mut Vec<Inline> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, value: &str, range: Range) {
        match &mut self.text {
            Some((text, span)) => {
                text.push_str(value);
                *span = span.cover(range);
            }
            None => self.text = Some((value.to_string(), range)),
        }
    }

    fn flush_text(&mut self) {
        if let Some((value, range)) = self.text.take() {
            let location = self.source.locate(range);
            self.children().push(Inline::Text(Text { value, location }));
        }
    }

    fn push_node(&mut self, node: Inline) {
        self.flush_text();
        self.children().push(node);
    }

    fn token(&mut self, index: u32, token: Token) {
        let source = self.source;
        match token {
            Token::Text { range, decoded } => match decoded {
                Some(value) => self.push_text(&value, range),
                None => self.push_text(source.slice(range), range),
            },
            Token::LinkRef { range, .. } => self.push_text(source.slice(range), range),
            Token::DelimiterRun(run) => self.delimiter(index, &run),
            Token::CodeSpan { range, content } => {
                let literal = normalize_content(self.source.slice(content));
                let location = self.source.locate(range);
                self.push_node(Inline::Code(Code { literal, location }));
            }
            Token::RawHtml(range) => {
                let literal = self.source.slice(range).to_string();
                let location = self.source.locate(range);
                self.push_node(Inline::RawHtml(RawHtml { literal, location }));
            }
            Token::HardBreak(range) => {
                let location = self.source.locate(range);
                self.push_node(Inline::LineBreak(location));
            }
            Token::SoftBreak(range) => {
                let location = self.source.locate(range);
                self.push_node(Inline::SoftBreak(location));
            }
            Token::PrebuiltNode(node) => self.push_node(*node),
        }
    }

    /// Expand one run: closes on its left side, leftover delimiters as
    /// text, opens on its right side.
    fn delimiter(&mut self, index: u32, run: &DelimiterRun) {
        let (source, registry) = (self.source, self.registry);
        let Some(state) = registry.state(index) else {
            self.push_text(source.slice(run.range), run.range);
            return;
        };
        let mut left = run.range.start;
        for &id in &state.as_closer {
            let count = registry.get(id).map_or(0, |m| m.count);
            self.close(id, Range::new(left, left + count));
            left += count;
        }

        let mut right = run.range.end;
        let mut opens: SmallVec<[(u32, Range); 2]> = SmallVec::new();
        for &id in &state.as_opener {
            let count = registry.get(id).map_or(0, |m| m.count);
            opens.push((id, Range::new(right - count, right)));
            right -= count;
        }
        if left < right {
            let literal = Range::new(left, right);
            self.push_text(source.slice(literal), literal);
        }
        for &(id, range) in opens.iter().rev() {
            self.open(id, range);
        }
    }

    fn open(&mut self, match_id: u32, range: Range) {
        if self.stack.len() >= MAX_INLINE_NESTING {
            let source = self.source;
            self.flattened.push(match_id);
            self.push_text(source.slice(range), range);
            return;
        }
        self.flush_text();
        self.stack.push(Frame {
            match_id,
            open: range,
            children: Vec::new(),
        });
    }

    fn close(&mut self, match_id: u32, range: Range) {
        let source = self.source;
        if self.flattened.contains(&match_id) || !self.stack.iter().any(|f| f.match_id == match_id)
        {
            self.push_text(source.slice(range), range);
            return;
        }
        self.flush_text();
        while let Some(frame) = self.stack.pop() {
            if frame.match_id == match_id {
                let node = self.styled(frame, range);
                self.children().push(node);
                return;
            }
            self.unwind(frame);
        }
    }

    fn styled(&self, frame: Frame, close: Range) -> Inline {
        let location = self.source.locate(frame.open.cover(close));
        let styled = Styled {
            children: frame.children,
            location,
        };
        let Some(m) = self.registry.get(frame.match_id) else {
            return Inline::Emphasis(styled);
        };
        match (m.ch, m.count) {
            (b'~', _) => Inline::Strikethrough(styled),
            (_, 2) => Inline::Strong(styled),
            _ => Inline::Emphasis(styled),
        }
    }

    /// Splice an unclosed frame into its parent, its opening delimiters
    /// turned back into text.
    fn unwind(&mut self, frame: Frame) {
        let location = self.source.locate(frame.open);
        let value = self.source.slice(frame.open).to_string();
        let parent = self.children();
        parent.push(Inline::Text(Text { value, location }));
        parent.extend(frame.children);
    }

    fn finish(mut self) -> Vec<Inline> {
        self.flush_text();
        while let Some(frame) = self.stack.pop() {
            self.unwind(frame);
        }
        merge_adjacent_text(&mut self.root);
        self.root
    }
}

/// Join neighbouring text nodes left behind by unwinding.
fn merge_adjacent_text(nodes: &mut Vec<Inline>) {
    let mut merged: Vec<Inline> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        if let (Some(Inline::Text(prev)), Inline::Text(next)) = (merged.last_mut(), &node) {
            prev.value.push_str(&next.value);
            prev.location = prev.location.through(&next.location);
            continue;
        }
        merged.push(node);
    }
    *nodes = merged;
}
