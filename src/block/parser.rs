//! Block parser implementation.
//!
//! Each line first walks the open containers (quotes, list items,
//! footnote definitions) and consumes their markers, then continues the
//! open leaf block, then looks for new block starts. Leaf content is
//! buffered and turned into events when the leaf closes: a paragraph can
//! still become a setext heading or a table header, and can shed link
//! reference definitions.

use crate::Range;
use crate::ast::{Alignment, ListKind};
use crate::cursor::LineCursor;
use crate::lexer::{LeadClass, Line, classify, is_space_or_tab, lex};
use crate::limits::MAX_BLOCK_NESTING;
use crate::link_ref::{LinkRefDef, LinkRefStore, normalize_label};

use super::event::{BlockEvent, RawDirective};
use super::html::HtmlBlockKind;
use super::leaf::{
    is_closing_fence, is_math_fence, is_thematic_break, scan_atx_heading, scan_directive_close,
    scan_directive_open, scan_footnote_def, scan_open_fence, scan_setext_underline,
};
use super::link_def::parse_link_definition;
use super::list::{same_list, scan_list_marker};
use super::table::{parse_delimiter_row, split_row};
use super::{BlockOptions, BlockOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Document,
    BlockQuote,
    List {
        kind: ListKind,
        tight: bool,
        /// Index of the `ListStart` event to patch on close.
        start_event: usize,
    },
    Item {
        content_indent: usize,
    },
    Footnote,
}

/// An open container block.
#[derive(Debug)]
struct Container {
    kind: ContainerKind,
    start_line: usize,
    /// End offset of the last non-blank line inside.
    end: u32,
    has_children: bool,
    /// Line on which the most recently closed child ended.
    last_child_end: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum LeafKind {
    Paragraph,
    /// The first buffered line is the header row.
    Table { alignments: Vec<Alignment> },
    Fenced {
        ch: u8,
        len: usize,
        indent: usize,
        info: Range,
    },
    Indented,
    Html(HtmlBlockKind),
    Math { indent: usize },
    Directive {
        colons: usize,
        /// Nested directive fences seen and not yet closed.
        depth: usize,
        name: Range,
        info: Range,
    },
}

/// The open leaf block, if any. There is at most one, always innermost.
#[derive(Debug)]
struct Leaf {
    kind: LeafKind,
    /// Buffered lines with their leading virtual spaces.
    lines: Vec<(u8, Range)>,
    start: u32,
    end: u32,
    last_line: usize,
}

impl Leaf {
    fn accepts_lines(&self) -> bool {
        !matches!(self.kind, LeafKind::Paragraph | LeafKind::Table { .. })
    }
}

enum LeafMatch {
    Matched,
    Unmatched,
    /// The line closed the leaf and nothing else is left on it.
    Closed,
}

enum Start {
    Container,
    Leaf { consumed: bool },
    None,
}

/// Per-line matching state.
struct LineState {
    /// Number of containers (document included) that matched this line.
    matched: usize,
    leaf_matched: bool,
    started: bool,
}

/// Block parser state.
pub struct BlockParser<'a> {
    source: &'a str,
    input: &'a [u8],
    options: BlockOptions,
    stack: Vec<Container>,
    leaf: Option<Leaf>,
    events: Vec<BlockEvent>,
    link_refs: LinkRefStore,
    directives: Vec<RawDirective>,
    line_no: usize,
}

impl<'a> BlockParser<'a> {
    pub fn new(source: &'a str, options: BlockOptions) -> Self {
        Self {
            source,
            input: source.as_bytes(),
            options,
            stack: vec![Container {
                kind: ContainerKind::Document,
                start_line: 0,
                end: 0,
                has_children: false,
                last_child_end: None,
            }],
            leaf: None,
            events: Vec::with_capacity(source.len() / 16 + 4),
            link_refs: LinkRefStore::new(),
            directives: Vec::new(),
            line_no: 0,
        }
    }

    /// Parse every line and close whatever is still open at the end.
    pub fn parse(mut self) -> BlockOutput {
        let lines = lex(self.input);
        for (i, &line) in lines.iter().enumerate() {
            self.line_no = i;
            self.process_line(line);
        }
        self.line_no = lines.len();
        self.close_leaf();
        while self.stack.len() > 1 {
            self.close_container();
        }
        BlockOutput {
            events: self.events,
            link_refs: self.link_refs,
            directives: self.directives,
        }
    }

    fn process_line(&mut self, line: Line) {
        let mut c = LineCursor::new(self.input, line);

        let mut matched = 1;
        while matched < self.stack.len() {
            c.find_next_nonspace();
            if !self.continue_container(matched, &mut c, line) {
                break;
            }
            matched += 1;
        }
        let containers_matched = matched == self.stack.len();

        let mut leaf_matched = false;
        if containers_matched && self.leaf.is_some() {
            c.find_next_nonspace();
            match self.continue_leaf(&mut c, line) {
                LeafMatch::Closed => {
                    self.touch_containers(line);
                    return;
                }
                LeafMatch::Matched => leaf_matched = true,
                LeafMatch::Unmatched => {}
            }
        }
        let all_closed = containers_matched && (self.leaf.is_none() || leaf_matched);
        let mut st = LineState {
            matched,
            leaf_matched,
            started: false,
        };

        let accepting = leaf_matched && self.leaf.as_ref().is_some_and(Leaf::accepts_lines);
        let mut skip_line = false;
        if !accepting {
            loop {
                c.find_next_nonspace();
                match self.try_start(&mut st, &mut c, line) {
                    Start::Container => continue,
                    Start::Leaf { consumed } => {
                        skip_line = consumed;
                        break;
                    }
                    Start::None => break,
                }
            }
        }
        c.find_next_nonspace();
        let blank = c.is_blank();

        if !st.started && !all_closed && !blank && self.leaf_is_paragraph() {
            // Lazy continuation line.
            self.add_paragraph_line(&c, line);
        } else {
            // A started block already closed what it displaced.
            if !st.started {
                self.close_unmatched(&mut st);
            }
            if !skip_line {
                self.add_line(&mut st, &c, line, blank);
            }
        }
        if !blank {
            self.touch_containers(line);
        }
    }

    fn touch_containers(&mut self, line: Line) {
        for container in &mut self.stack {
            container.end = line.end;
        }
    }

    fn leaf_is_paragraph(&self) -> bool {
        matches!(
            self.leaf,
            Some(Leaf {
                kind: LeafKind::Paragraph,
                ..
            })
        )
    }

    fn continue_container(&mut self, idx: usize, c: &mut LineCursor<'a>, line: Line) -> bool {
        let container = &mut self.stack[idx];
        match container.kind {
            ContainerKind::Document | ContainerKind::List { .. } => true,
            ContainerKind::BlockQuote => {
                if c.indent() <= 3 && c.peek_nonspace() == Some(b'>') {
                    c.advance_next_nonspace();
                    c.advance(1, false);
                    if c.peek().is_some_and(is_space_or_tab) {
                        c.advance(1, true);
                    }
                    container.end = line.end;
                    true
                } else {
                    false
                }
            }
            ContainerKind::Item { content_indent } => {
                if c.is_blank() {
                    if !container.has_children {
                        return false;
                    }
                    c.advance_next_nonspace();
                    true
                } else if c.indent() >= content_indent {
                    c.advance(content_indent, true);
                    true
                } else {
                    false
                }
            }
            ContainerKind::Footnote => {
                if c.is_blank() {
                    c.advance_next_nonspace();
                    true
                } else if c.indent() >= 4 {
                    c.advance(4, true);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn continue_leaf(&mut self, c: &mut LineCursor<'a>, line: Line) -> LeafMatch {
        let line_no = self.line_no;
        let input = self.input;
        let Some(leaf) = self.leaf.as_mut() else {
            return LeafMatch::Unmatched;
        };
        let indent = c.indent();
        let rest = &input[c.next_nonspace()..c.end()];
        let blank = c.is_blank();

        let closes = match &mut leaf.kind {
            LeafKind::Paragraph | LeafKind::Table { .. } => {
                return if blank {
                    LeafMatch::Unmatched
                } else {
                    LeafMatch::Matched
                };
            }
            LeafKind::Fenced {
                ch,
                len,
                indent: fence_indent,
                ..
            } => {
                if indent <= 3 && is_closing_fence(rest, *ch, *len) {
                    true
                } else {
                    skip_indent(c, *fence_indent);
                    false
                }
            }
            LeafKind::Indented => {
                return if indent >= 4 {
                    c.advance(4, true);
                    LeafMatch::Matched
                } else if blank {
                    c.advance_next_nonspace();
                    LeafMatch::Matched
                } else {
                    LeafMatch::Unmatched
                };
            }
            LeafKind::Html(kind) => {
                return if blank && kind.ends_at_blank() {
                    LeafMatch::Unmatched
                } else {
                    LeafMatch::Matched
                };
            }
            LeafKind::Math {
                indent: fence_indent,
            } => {
                if indent <= 3 && is_math_fence(rest) {
                    true
                } else {
                    skip_indent(c, *fence_indent);
                    false
                }
            }
            LeafKind::Directive { colons, depth, .. } => {
                let mut closes = false;
                if indent <= 3 {
                    if let Some(n) = scan_directive_close(rest) {
                        if *depth > 0 {
                            *depth -= 1;
                        } else {
                            closes = n >= *colons;
                        }
                    } else if scan_directive_open(rest).is_some() {
                        *depth += 1;
                    }
                }
                closes
            }
        };

        if closes {
            leaf.end = line.end;
            leaf.last_line = line_no;
            self.close_leaf();
            LeafMatch::Closed
        } else {
            LeafMatch::Matched
        }
    }

    fn try_start(&mut self, st: &mut LineState, c: &mut LineCursor<'a>, line: Line) -> Start {
        let Some(first) = c.peek_nonspace() else {
            return Start::None;
        };
        let indented = c.indent() >= 4;
        if !indented && classify(first) == LeadClass::Plain {
            return Start::None;
        }
        let input = self.input;
        let base = c.next_nonspace();
        let rest = &input[base..c.end()];
        let pos = base as u32;
        let in_paragraph = st.leaf_matched && self.leaf_is_paragraph();

        if !indented {
            if first == b'>' && self.stack.len() < MAX_BLOCK_NESTING {
                c.advance_next_nonspace();
                c.advance(1, false);
                if c.peek().is_some_and(is_space_or_tab) {
                    c.advance(1, true);
                }
                self.begin_child(st, false);
                self.push_container(st, ContainerKind::BlockQuote, line);
                self.events.push(BlockEvent::BlockQuoteStart { pos });
                return Start::Container;
            }

            if first == b'#' {
                if let Some((level, s, e)) = scan_atx_heading(rest) {
                    self.begin_child(st, false);
                    self.events.push(BlockEvent::HeadingStart { level, pos });
                    if s < e {
                        self.events
                            .push(BlockEvent::Text(Range::from_usize(base + s, base + e)));
                    }
                    self.events.push(BlockEvent::HeadingEnd { pos: line.end });
                    self.child_closed(self.line_no);
                    c.advance_to_end();
                    return Start::Leaf { consumed: true };
                }
            }

            if first == b'`' || first == b'~' {
                if let Some((ch, len, info_start, info_end)) = scan_open_fence(rest) {
                    let indent = c.indent();
                    self.begin_child(st, false);
                    self.open_leaf(
                        LeafKind::Fenced {
                            ch,
                            len,
                            indent,
                            info: Range::from_usize(base + info_start, base + info_end),
                        },
                        pos,
                        line,
                    );
                    c.advance_to_end();
                    return Start::Leaf { consumed: true };
                }
            }

            if first == b'<' {
                if let Some(kind) = HtmlBlockKind::start(rest, self.leaf_is_paragraph()) {
                    self.begin_child(st, false);
                    self.open_leaf(LeafKind::Html(kind), pos, line);
                    return Start::Leaf { consumed: false };
                }
            }

            if in_paragraph && (first == b'=' || first == b'-') {
                if let Some(level) = scan_setext_underline(rest) {
                    if self.setext_heading(level, line) {
                        st.started = true;
                        st.leaf_matched = false;
                        c.advance_to_end();
                        return Start::Leaf { consumed: true };
                    }
                }
            }

            if self.options.tables && in_paragraph && matches!(first, b'|' | b'-' | b':') {
                if self.table_start(rest, line) {
                    st.started = true;
                    c.advance_to_end();
                    return Start::Leaf { consumed: true };
                }
            }

            if matches!(first, b'*' | b'-' | b'_') && is_thematic_break(rest) {
                self.begin_child(st, false);
                self.events
                    .push(BlockEvent::ThematicBreak(Range::from_usize(base, c.end())));
                self.child_closed(self.line_no);
                c.advance_to_end();
                return Start::Leaf { consumed: true };
            }

            if self.options.footnotes && first == b'[' && self.stack.len() < MAX_BLOCK_NESTING {
                if let Some((label_start, label_end, consumed)) = scan_footnote_def(rest) {
                    c.advance_next_nonspace();
                    c.advance(consumed, false);
                    self.begin_child(st, false);
                    self.push_container(st, ContainerKind::Footnote, line);
                    self.events.push(BlockEvent::FootnoteStart {
                        label: Range::from_usize(base + label_start, base + label_end),
                        pos,
                    });
                    return Start::Container;
                }
            }
        }

        if !indented
            && matches!(first, b'-' | b'+' | b'*' | b'0'..=b'9')
            && self.stack.len() + 2 <= MAX_BLOCK_NESTING
        {
            if let Some(marker) = scan_list_marker(rest, in_paragraph) {
                self.list_item_start(st, c, marker.kind, marker.width, line);
                return Start::Container;
            }
        }

        if !indented {
            if self.options.directives && first == b':' {
                if let Some((colons, name, info)) = scan_directive_open(rest) {
                    self.begin_child(st, false);
                    self.open_leaf(
                        LeafKind::Directive {
                            colons,
                            depth: 0,
                            name: Range::from_usize(base + name.0, base + name.1),
                            info: Range::from_usize(base + info.0, base + info.1),
                        },
                        pos,
                        line,
                    );
                    c.advance_to_end();
                    return Start::Leaf { consumed: true };
                }
            }

            if self.options.math && first == b'$' && is_math_fence(rest) {
                let indent = c.indent();
                self.begin_child(st, false);
                self.open_leaf(LeafKind::Math { indent }, pos, line);
                c.advance_to_end();
                return Start::Leaf { consumed: true };
            }
        } else if !self.leaf_is_paragraph() {
            let start = c.offset() as u32;
            c.advance(4, true);
            self.begin_child(st, false);
            self.open_leaf(LeafKind::Indented, start, line);
            return Start::Leaf { consumed: false };
        }

        Start::None
    }

    fn list_item_start(
        &mut self,
        st: &mut LineState,
        c: &mut LineCursor<'a>,
        kind: ListKind,
        width: usize,
        line: Line,
    ) {
        let marker_offset = c.indent();
        let pos = c.next_nonspace() as u32;
        c.advance_next_nonspace();
        c.advance(width, true);

        let spaces_start = *c;
        let start_col = c.column();
        loop {
            c.advance(1, true);
            if !(c.column() - start_col < 5 && c.peek().is_some_and(is_space_or_tab)) {
                break;
            }
        }
        let blank_item = c.peek().is_none();
        let spaces_after = c.column() - start_col;
        let padding = if spaces_after >= 5 || spaces_after < 1 || blank_item {
            *c = spaces_start;
            if c.peek().is_some_and(is_space_or_tab) {
                c.advance(1, true);
            }
            width + 1
        } else {
            width + spaces_after
        };

        let continues = match self.stack[st.matched - 1].kind {
            ContainerKind::List { kind: list_kind, .. } => same_list(list_kind, kind),
            _ => false,
        };
        if !continues {
            self.begin_child(st, false);
            let start_event = self.events.len();
            self.events.push(BlockEvent::ListStart {
                kind,
                tight: true,
                pos,
            });
            self.push_container(
                st,
                ContainerKind::List {
                    kind,
                    tight: true,
                    start_event,
                },
                line,
            );
        }
        self.begin_child(st, true);
        self.push_container(
            st,
            ContainerKind::Item {
                content_indent: marker_offset + padding,
            },
            line,
        );
        self.events.push(BlockEvent::ListItemStart { pos });
    }

    /// Turn the open paragraph into a setext heading. Returns false when
    /// the paragraph held only link reference definitions.
    fn setext_heading(&mut self, level: u8, line: Line) -> bool {
        let Some(mut leaf) = self.leaf.take() else {
            return false;
        };
        self.take_link_defs(&mut leaf.lines);
        if leaf.lines.is_empty() {
            self.leaf = Some(leaf);
            return false;
        }
        let pos = leaf.lines[0].1.start;
        self.events.push(BlockEvent::HeadingStart { level, pos });
        self.events
            .extend(leaf.lines.iter().map(|&(_, r)| BlockEvent::Text(r)));
        self.events.push(BlockEvent::HeadingEnd { pos: line.end });
        self.child_closed(self.line_no);
        true
    }

    /// Start a table when the last paragraph line is a header row matching
    /// the delimiter row in `rest`. Earlier lines stay a paragraph.
    fn table_start(&mut self, rest: &[u8], line: Line) -> bool {
        let Some(alignments) = parse_delimiter_row(rest) else {
            return false;
        };
        let Some(header) = self
            .leaf
            .as_ref()
            .and_then(|leaf| leaf.lines.last())
            .map(|&(_, r)| r)
        else {
            return false;
        };
        if split_row(header.slice(self.input)).len() != alignments.len() {
            return false;
        }

        let Some(mut paragraph) = self.leaf.take() else {
            return false;
        };
        paragraph.lines.pop();
        let split = !paragraph.lines.is_empty();
        if split {
            paragraph.last_line = self.line_no - 2;
            paragraph.end = paragraph.lines.last().map_or(paragraph.end, |(_, r)| r.end);
            self.leaf = Some(paragraph);
            self.close_leaf();
            self.note_child_opened(self.line_no - 1);
        }
        self.leaf = Some(Leaf {
            kind: LeafKind::Table { alignments },
            lines: vec![(0, header)],
            start: header.start,
            end: line.end,
            last_line: self.line_no,
        });
        true
    }

    /// Close what did not match, close the open leaf, and make sure the
    /// container on top can hold the new child.
    fn begin_child(&mut self, st: &mut LineState, is_item: bool) {
        self.close_unmatched(st);
        self.close_leaf();
        st.leaf_matched = false;
        if !is_item {
            while matches!(
                self.stack.last().map(|c| c.kind),
                Some(ContainerKind::List { .. })
            ) {
                self.close_container();
            }
        }
        st.matched = self.stack.len();
        st.started = true;
        self.note_child_opened(self.line_no);
    }

    /// Record that a child of the top container starts on `line`. A blank
    /// line before it makes the enclosing list loose.
    fn note_child_opened(&mut self, line: usize) {
        let idx = self.stack.len() - 1;
        let gap = self.stack[idx]
            .last_child_end
            .is_some_and(|end| line > end + 1);
        self.stack[idx].has_children = true;
        if !gap {
            return;
        }
        let list_idx = match self.stack[idx].kind {
            ContainerKind::List { .. } => idx,
            ContainerKind::Item { .. } => idx - 1,
            _ => return,
        };
        if let ContainerKind::List { tight, .. } = &mut self.stack[list_idx].kind {
            *tight = false;
        }
    }

    fn child_closed(&mut self, end_line: usize) {
        if let Some(top) = self.stack.last_mut() {
            top.last_child_end = Some(end_line);
        }
    }

    fn push_container(&mut self, st: &mut LineState, kind: ContainerKind, line: Line) {
        self.stack.push(Container {
            kind,
            start_line: self.line_no,
            end: line.end,
            has_children: false,
            last_child_end: None,
        });
        st.matched = self.stack.len();
    }

    fn open_leaf(&mut self, kind: LeafKind, start: u32, line: Line) {
        self.leaf = Some(Leaf {
            kind,
            lines: Vec::new(),
            start,
            end: line.end,
            last_line: self.line_no,
        });
    }

    fn close_unmatched(&mut self, st: &mut LineState) {
        if !st.leaf_matched {
            self.close_leaf();
        }
        while self.stack.len() > st.matched {
            self.close_container();
        }
    }

    fn add_line(&mut self, st: &mut LineState, c: &LineCursor<'a>, line: Line, blank: bool) {
        let line_no = self.line_no;
        let input = self.input;
        match self.leaf.as_mut() {
            Some(leaf) if leaf.accepts_lines() => {
                let (spaces, start) = if c.partial_tab() {
                    (c.remaining_tab_columns() as u8, c.offset() + 1)
                } else {
                    (0, c.offset())
                };
                let start = start.min(line.end as usize);
                leaf.lines
                    .push((spaces, Range::from_usize(start, line.end as usize)));
                leaf.end = line.end;
                if !(blank && leaf.kind == LeafKind::Indented) {
                    leaf.last_line = line_no;
                }
                let html_end = match leaf.kind {
                    LeafKind::Html(kind) => {
                        kind.ends_on(&input[c.offset().min(line.end as usize)..line.end as usize])
                    }
                    _ => false,
                };
                if html_end {
                    self.close_leaf();
                }
            }
            Some(leaf) => {
                // Open paragraph or table that matched a non-blank line.
                leaf.lines
                    .push((0, Range::from_usize(c.next_nonspace(), line.end as usize)));
                leaf.end = line.end;
                leaf.last_line = line_no;
            }
            None if !blank => {
                self.begin_child(st, false);
                self.open_leaf(LeafKind::Paragraph, c.next_nonspace() as u32, line);
                self.add_paragraph_line(c, line);
            }
            None => {}
        }
    }

    fn add_paragraph_line(&mut self, c: &LineCursor<'a>, line: Line) {
        let line_no = self.line_no;
        if let Some(leaf) = self.leaf.as_mut() {
            leaf.lines
                .push((0, Range::from_usize(c.next_nonspace(), line.end as usize)));
            leaf.end = line.end;
            leaf.last_line = line_no;
        }
    }

    /// Remove link reference definitions from the front of paragraph lines
    /// and record them.
    fn take_link_defs(&mut self, lines: &mut Vec<(u8, Range)>) {
        let starts_with_bracket = lines
            .first()
            .is_some_and(|&(_, r)| self.input.get(r.start_usize()) == Some(&b'['));
        if !starts_with_bracket {
            return;
        }
        let mut text = String::new();
        for (i, &(_, r)) in lines.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            text.push_str(r.slice_str(self.source));
        }

        let mut offset = 0;
        let mut consumed_lines = 0;
        while let Some(def) = parse_link_definition(&text[offset..]) {
            self.link_refs.insert(
                normalize_label(def.label),
                LinkRefDef {
                    destination: def.destination,
                    title: def.title,
                },
            );
            offset += def.consumed;
            consumed_lines += def.lines;
        }
        lines.drain(..consumed_lines.min(lines.len()));
    }

    fn close_leaf(&mut self) {
        let Some(mut leaf) = self.leaf.take() else {
            return;
        };
        let kind = std::mem::replace(&mut leaf.kind, LeafKind::Paragraph);
        match kind {
            LeafKind::Paragraph => {
                self.take_link_defs(&mut leaf.lines);
                if leaf.lines.is_empty() {
                    return;
                }
                self.events.push(BlockEvent::ParagraphStart);
                self.events
                    .extend(leaf.lines.iter().map(|&(_, r)| BlockEvent::Text(r)));
                self.events.push(BlockEvent::ParagraphEnd);
            }
            LeafKind::Table { alignments } => self.emit_table(&leaf, &alignments),
            LeafKind::Fenced { info, .. } => {
                self.events.push(BlockEvent::CodeBlockStart {
                    info: (!info.is_empty()).then_some(info),
                    fenced: true,
                    pos: leaf.start,
                });
                self.emit_literal(&leaf.lines);
                self.events.push(BlockEvent::CodeBlockEnd { pos: leaf.end });
            }
            LeafKind::Indented => {
                self.trim_blank_tail(&mut leaf.lines);
                self.events.push(BlockEvent::CodeBlockStart {
                    info: None,
                    fenced: false,
                    pos: leaf.start,
                });
                self.emit_literal(&leaf.lines);
                let end = leaf.lines.last().map_or(leaf.end, |(_, r)| r.end);
                self.events.push(BlockEvent::CodeBlockEnd { pos: end });
            }
            LeafKind::Html(_) => {
                self.trim_blank_tail(&mut leaf.lines);
                self.events
                    .push(BlockEvent::HtmlBlockStart { pos: leaf.start });
                self.emit_literal(&leaf.lines);
                self.events.push(BlockEvent::HtmlBlockEnd { pos: leaf.end });
            }
            LeafKind::Math { .. } => {
                self.events
                    .push(BlockEvent::MathBlockStart { pos: leaf.start });
                self.emit_literal(&leaf.lines);
                self.events.push(BlockEvent::MathBlockEnd { pos: leaf.end });
            }
            LeafKind::Directive { name, info, .. } => {
                let index = self.directives.len() as u32;
                self.directives.push(RawDirective {
                    name,
                    info,
                    lines: std::mem::take(&mut leaf.lines),
                    start: leaf.start,
                    end: leaf.end,
                });
                self.events.push(BlockEvent::Directive(index));
            }
        }
        self.child_closed(leaf.last_line);
    }

    fn emit_literal(&mut self, lines: &[(u8, Range)]) {
        for &(spaces, range) in lines {
            if spaces > 0 {
                self.events.push(BlockEvent::VirtualSpaces(spaces));
            }
            self.events.push(BlockEvent::Code(range));
        }
    }

    fn trim_blank_tail(&self, lines: &mut Vec<(u8, Range)>) {
        while lines
            .last()
            .is_some_and(|&(_, r)| r.slice(self.input).iter().all(|&b| is_space_or_tab(b)))
        {
            lines.pop();
        }
    }

    fn emit_table(&mut self, leaf: &Leaf, alignments: &[Alignment]) {
        self.events.push(BlockEvent::TableStart { pos: leaf.start });
        let mut rows = leaf.lines.iter().map(|&(_, r)| r);
        if let Some(header) = rows.next() {
            self.events.push(BlockEvent::TableHeadStart);
            self.emit_row(header, alignments);
            self.events.push(BlockEvent::TableHeadEnd);
        }
        let mut body = rows.peekable();
        if body.peek().is_some() {
            self.events.push(BlockEvent::TableBodyStart);
            for row in body {
                self.emit_row(row, alignments);
            }
            self.events.push(BlockEvent::TableBodyEnd);
        }
        self.events.push(BlockEvent::TableEnd { pos: leaf.end });
    }

    fn emit_row(&mut self, row: Range, alignments: &[Alignment]) {
        let base = row.start_usize();
        let cells = split_row(row.slice(self.input));
        self.events.push(BlockEvent::TableRowStart { pos: row.start });
        for (i, &alignment) in alignments.iter().enumerate() {
            self.events.push(BlockEvent::TableCellStart { alignment });
            if let Some(&(s, e)) = cells.get(i) {
                if s < e {
                    self.events
                        .push(BlockEvent::Text(Range::from_usize(base + s, base + e)));
                }
            }
            self.events.push(BlockEvent::TableCellEnd);
        }
        self.events.push(BlockEvent::TableRowEnd { pos: row.end });
    }

    fn close_container(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(container) = self.stack.pop() else {
            return;
        };
        let end_line = match container.kind {
            ContainerKind::Item { .. } | ContainerKind::List { .. } => container
                .last_child_end
                .unwrap_or(container.start_line),
            _ => self.line_no.saturating_sub(1).max(container.start_line),
        };
        let pos = container.end;
        match container.kind {
            ContainerKind::Document => {}
            ContainerKind::BlockQuote => self.events.push(BlockEvent::BlockQuoteEnd { pos }),
            ContainerKind::List {
                tight, start_event, ..
            } => {
                if let Some(BlockEvent::ListStart { tight: t, .. }) =
                    self.events.get_mut(start_event)
                {
                    *t = tight;
                }
                self.events.push(BlockEvent::ListEnd { tight, pos });
            }
            ContainerKind::Item { .. } => self.events.push(BlockEvent::ListItemEnd { pos }),
            ContainerKind::Footnote => self.events.push(BlockEvent::FootnoteEnd { pos }),
        }
        self.child_closed(end_line);
    }
}

/// Skip up to `n` columns of indentation.
fn skip_indent(c: &mut LineCursor<'_>, mut n: usize) {
    while n > 0 && c.peek().is_some_and(is_space_or_tab) {
        c.advance(1, true);
        n -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_with(input: &str, options: BlockOptions) -> BlockOutput {
        BlockParser::new(input, options).parse()
    }

    fn parse(input: &str) -> Vec<BlockEvent> {
        parse_with(input, BlockOptions::default()).events
    }

    fn all() -> BlockOptions {
        BlockOptions {
            tables: true,
            footnotes: true,
            math: true,
            directives: true,
        }
    }

    fn texts<'a>(input: &'a str, events: &[BlockEvent]) -> Vec<&'a str> {
        events
            .iter()
            .filter_map(|e| match e {
                BlockEvent::Text(r) | BlockEvent::Code(r) => Some(r.slice_str(input)),
                _ => None,
            })
            .collect()
    }

    fn list_tightness(events: &[BlockEvent]) -> Vec<bool> {
        events
            .iter()
            .filter_map(|e| match e {
                BlockEvent::ListStart { tight, .. } => Some(*tight),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_paragraph_lines() {
        let input = "aaa\n  bbb\n\nccc";
        let events = parse(input);
        assert_eq!(events[0], BlockEvent::ParagraphStart);
        assert_eq!(texts(input, &events), vec!["aaa", "bbb", "ccc"]);
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == BlockEvent::ParagraphStart)
                .count(),
            2
        );
    }

    #[test]
    fn test_atx_and_thematic_break() {
        let input = "# Title #\n***\n";
        let events = parse(input);
        assert_eq!(events[0], BlockEvent::HeadingStart { level: 1, pos: 0 });
        assert_eq!(texts(input, &events), vec!["Title"]);
        assert!(matches!(events[3], BlockEvent::ThematicBreak(_)));
    }

    #[test]
    fn test_setext_heading() {
        let input = "Foo\nbar\n---";
        let events = parse(input);
        assert_eq!(events[0], BlockEvent::HeadingStart { level: 2, pos: 0 });
        assert_eq!(texts(input, &events), vec!["Foo", "bar"]);
    }

    #[test]
    fn test_setext_after_only_definitions_is_a_break() {
        let input = "[foo]: /url\n---";
        let out = parse_with(input, BlockOptions::default());
        assert!(matches!(out.events[0], BlockEvent::ThematicBreak(_)));
        assert_eq!(out.link_refs.len(), 1);
    }

    #[test]
    fn test_link_definitions_leave_rest_of_paragraph() {
        let input = "[a]: /x\n[b]: /y 'T'\ntext";
        let out = parse_with(input, BlockOptions::default());
        assert_eq!(texts(input, &out.events), vec!["text"]);
        assert_eq!(out.link_refs.lookup("B").and_then(|d| d.title.as_deref()), Some("T"));
    }

    #[test]
    fn test_fenced_code_in_blockquote() {
        let input = "> ```rust\n> let x;\n> ```\n";
        let events = parse(input);
        assert!(matches!(events[0], BlockEvent::BlockQuoteStart { pos: 0 }));
        match &events[1] {
            BlockEvent::CodeBlockStart { info: Some(info), fenced: true, .. } => {
                assert_eq!(info.slice_str(input), "rust")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(texts(input, &events), vec!["let x;"]);
    }

    #[test]
    fn test_fence_strips_opening_indent() {
        let input = "  ```\n    a\n  b\n```";
        let events = parse(input);
        assert_eq!(texts(input, &events), vec!["  a", "b"]);
    }

    #[test]
    fn test_indented_code_drops_trailing_blank_lines() {
        let input = "    a\n\n    b\n\n\nc";
        let events = parse(input);
        assert_eq!(texts(input, &events), vec!["a", "", "b", "c"]);
    }

    #[test]
    fn test_indented_code_cannot_interrupt_paragraph() {
        let input = "a\n    b";
        let events = parse(input);
        assert_eq!(events.len(), 4);
        assert_eq!(texts(input, &events), vec!["a", "b"]);
    }

    #[test]
    fn test_tab_after_quote_marker_yields_virtual_spaces() {
        let input = ">\t\tfoo";
        let events = parse(input);
        assert!(events.contains(&BlockEvent::VirtualSpaces(2)));
        assert_eq!(texts(input, &events), vec!["foo"]);
    }

    #[test]
    fn test_lazy_continuation() {
        let input = "> a\nb\n\nc";
        let events = parse(input);
        let quote_end = events
            .iter()
            .position(|e| matches!(e, BlockEvent::BlockQuoteEnd { .. }))
            .unwrap();
        assert_eq!(texts(input, &events[..quote_end]), vec!["a", "b"]);
    }

    #[test]
    fn test_tight_and_loose_lists() {
        assert_eq!(list_tightness(&parse("- a\n- b\n")), vec![true]);
        assert_eq!(list_tightness(&parse("- a\n\n- b\n")), vec![false]);
        assert_eq!(list_tightness(&parse("- a\n- b\n\n")), vec![true]);
        assert_eq!(list_tightness(&parse("- a\n\n  b\n")), vec![false]);
        assert_eq!(
            list_tightness(&parse("- a\n  - b\n\n    c\n- d\n")),
            vec![true, false]
        );
        assert_eq!(list_tightness(&parse("- a\n  - b\n\n- c\n")), vec![false, true]);
        assert_eq!(list_tightness(&parse("- ```\n  a\n\n\n  ```\n- b\n")), vec![true]);
    }

    #[test]
    fn test_list_marker_change_starts_new_list() {
        let events = parse("- a\n+ b\n1. c\n2) d");
        let starts = events
            .iter()
            .filter(|e| matches!(e, BlockEvent::ListStart { .. }))
            .count();
        assert_eq!(starts, 4);
    }

    #[test]
    fn test_ordered_list_interrupt_rule() {
        let input = "The number of windows in my house is\n14.  The number of doors is 6.";
        let events = parse(input);
        assert!(!events
            .iter()
            .any(|e| matches!(e, BlockEvent::ListStart { .. })));
    }

    #[test]
    fn test_marker_indented_four_columns_is_not_an_item() {
        let items = |events: &[BlockEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, BlockEvent::ListItemStart { .. }))
                .count()
        };
        let input = "- a\n - b\n  - c\n   - d\n    - e\n";
        let events = parse(input);
        assert_eq!(items(&events), 4);
        assert_eq!(texts(input, &events), vec!["a", "b", "c", "d", "- e"]);

        let input = "1. a\n\n  2. b\n\n    3. c\n";
        let events = parse(input);
        assert_eq!(items(&events), 2);
        assert!(matches!(
            events.iter().rev().find(|e| matches!(e, BlockEvent::CodeBlockStart { .. })),
            Some(BlockEvent::CodeBlockStart { fenced: false, .. })
        ));
        assert_eq!(texts(input, &events).last().copied(), Some("3. c"));
    }

    #[test]
    fn test_item_may_begin_with_one_blank_line() {
        let input = "-\n  foo\n-\n\n  bar";
        let events = parse(input);
        let items = events
            .iter()
            .filter(|e| matches!(e, BlockEvent::ListItemStart { .. }))
            .count();
        assert_eq!(items, 2);
        // `bar` ends up outside the list.
        assert!(matches!(events.last(), Some(BlockEvent::ParagraphEnd)));
    }

    #[test]
    fn test_html_blocks() {
        let input = "<div>\n*a*\n\nb\n<!-- c\nd -->\ne";
        let events = parse(input);
        let html_starts = events
            .iter()
            .filter(|e| matches!(e, BlockEvent::HtmlBlockStart { .. }))
            .count();
        assert_eq!(html_starts, 2);
        assert_eq!(texts(input, &events), vec!["<div>", "*a*", "b", "<!-- c", "d -->", "e"]);
    }

    #[test]
    fn test_html_kind_seven_does_not_interrupt_paragraph() {
        let events = parse("Foo\n<a href=\"bar\">\nbaz");
        assert!(!events
            .iter()
            .any(|e| matches!(e, BlockEvent::HtmlBlockStart { .. })));
    }

    #[test]
    fn test_table() {
        let input = "intro\n| a | b |\n| :- | -: |\n| 1 | 2 | 3 |\n| x |\n\nafter";
        let events = parse_with(input, all()).events;
        assert_eq!(events[0], BlockEvent::ParagraphStart);
        assert!(events.contains(&BlockEvent::TableHeadStart));
        assert_eq!(
            texts(input, &events),
            vec!["intro", "a", "b", "1", "2", "x", "after"]
        );
        let cells = events
            .iter()
            .filter(|e| matches!(e, BlockEvent::TableCellStart { .. }))
            .count();
        assert_eq!(cells, 6);
    }

    #[test]
    fn test_table_needs_matching_header() {
        let input = "| a | b |\n| --- |";
        let events = parse_with(input, all()).events;
        assert!(!events.contains(&BlockEvent::TableHeadStart));
    }

    #[test]
    fn test_tables_off_by_default() {
        let events = parse("| a |\n| - |");
        assert!(!events.contains(&BlockEvent::TableHeadStart));
    }

    #[test]
    fn test_footnote_definition() {
        let input = "[^1]: first\n    more\n\npara";
        let events = parse_with(input, all()).events;
        match &events[0] {
            BlockEvent::FootnoteStart { label, .. } => assert_eq!(label.slice_str(input), "1"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(texts(input, &events), vec!["first", "more", "para"]);
    }

    #[test]
    fn test_math_block() {
        let input = "$$\nx^2\n$$\n";
        let events = parse_with(input, all()).events;
        assert!(matches!(events[0], BlockEvent::MathBlockStart { .. }));
        assert_eq!(texts(input, &events), vec!["x^2"]);
    }

    #[test]
    fn test_directive_nesting() {
        let input = ":::{note} Heads up\nouter\n:::{tip}\ninner\n:::\n:::\nafter";
        let out = parse_with(input, all());
        assert_eq!(out.directives.len(), 1);
        let raw = &out.directives[0];
        assert_eq!(raw.name.slice_str(input), "note");
        assert_eq!(raw.info.slice_str(input), "Heads up");
        assert_eq!(raw.body(input), "outer\n:::{tip}\ninner\n:::\n");
        assert_eq!(texts(input, &out.events), vec!["after"]);
    }

    #[test]
    fn test_directive_syntax_can_be_disabled() {
        let input = ":::{note}\nx\n:::";
        let out = parse_with(input, BlockOptions::default());
        assert!(out.directives.is_empty());
        assert_eq!(out.events[0], BlockEvent::ParagraphStart);
    }

    #[test]
    fn test_unclosed_fence_runs_to_container_end() {
        let input = "> ```\n> a\n\nb";
        let events = parse(input);
        let end = events
            .iter()
            .position(|e| matches!(e, BlockEvent::CodeBlockEnd { .. }))
            .unwrap();
        assert!(matches!(events[end + 1], BlockEvent::BlockQuoteEnd { .. }));
    }
}
