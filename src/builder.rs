//! Tree construction.
//!
//! Walks the flat block event stream, parses inline content as it goes
//! and hands directive blocks to the registry. Directive bodies that
//! contain Markdown are parsed recursively through [`Session`], which
//! shares the document's footnotes and diagnostics with the outer parse.

use crate::Range;
use crate::ast::{
    self, Alignment, Block, BlockQuote, CodeBlock, Document, Heading, HtmlBlock, Inline, List,
    ListItem, MathBlock, Paragraph, Table, TableCell, TableRow,
};
use crate::block::{BlockEvent, BlockOptions, RawDirective, parse_blocks};
use crate::config::ParserConfig;
use crate::error::{Diagnostic, DirectiveContractError, ParseError};
use crate::escape::unescape;
use crate::extension::{DirectiveContext, DirectiveOptions, OptionContract, split_options};
use crate::footnote::FootnoteStore;
use crate::inline::{InlineContext, InlineSource, parse_inline};
use crate::lexer::is_space_or_tab;
use crate::limits::MAX_DIRECTIVE_DEPTH;
use crate::link_ref::LinkRefStore;
use crate::location::{LineIndex, SourceLocation};
use smallvec::SmallVec;

/// Parse `source` into a [`Document`].
pub fn build_document(source: &str, config: &ParserConfig) -> Result<Document, ParseError> {
    let output = parse_blocks(source, BlockOptions::from_config(config));
    log::debug!(
        "block pass: {} events, {} link definitions, {} directives",
        output.events.len(),
        output.link_refs.len(),
        output.directives.len()
    );

    let index = LineIndex::new(source);
    let mut state = BuildState::default();
    declare_footnotes(source, &output.events, &mut state.footnotes);
    let children = Session {
        config,
        source,
        index: &index,
        refs: &output.link_refs,
        directives: &output.directives,
        state: &mut state,
        depth: 0,
        base: 0,
    }
    .blocks(&output.events)?;

    let BuildState {
        footnotes,
        diagnostics,
    } = state;
    let footnotes = footnotes.finish();
    log::debug!(
        "built {} blocks, {} footnotes, {} diagnostics",
        children.len(),
        footnotes.len(),
        diagnostics.len()
    );
    Ok(Document {
        children,
        footnotes,
        diagnostics,
        location: index.locate(Range::from_usize(0, source.len())),
    })
}

fn declare_footnotes(source: &str, events: &[BlockEvent], footnotes: &mut FootnoteStore) {
    for event in events {
        if let BlockEvent::FootnoteStart { label, .. } = event {
            footnotes.declare(label.slice_str(source));
        }
    }
}

/// State shared by the whole parse, nested directive bodies included.
#[derive(Debug, Default)]
pub(crate) struct BuildState {
    footnotes: FootnoteStore,
    diagnostics: Vec<Diagnostic>,
}

/// One event stream being turned into blocks.
///
/// `source` is the text the events index into: the document, or a
/// directive body. `base` is the body's offset in the document, so
/// locations stay document-relative.
pub(crate) struct Session<'a> {
    config: &'a ParserConfig,
    source: &'a str,
    index: &'a LineIndex<'a>,
    refs: &'a LinkRefStore,
    directives: &'a [RawDirective],
    state: &'a mut BuildState,
    depth: usize,
    base: u32,
}

impl<'a> Session<'a> {
    fn locate(&self, start: u32, end: u32) -> SourceLocation {
        self.index
            .locate(Range::new(self.base + start, self.base + end.max(start)))
    }

    fn inline_context(&mut self) -> InlineContext<'_> {
        InlineContext {
            config: self.config,
            link_refs: self.refs,
            footnotes: &mut self.state.footnotes,
            diagnostics: &mut self.state.diagnostics,
        }
    }

    fn inlines(&mut self, lines: &[Range]) -> Vec<Inline> {
        let text = InlineSource::from_lines(self.source, lines, self.base, self.index);
        parse_inline(&text, self.inline_context())
    }

    fn blocks(&mut self, events: &[BlockEvent]) -> Result<Vec<Block>, DirectiveContractError> {
        let mut i = 0;
        let mut out = Vec::new();
        while i < events.len() {
            if let Some(block) = self.block(events, &mut i)? {
                out.push(block);
            }
        }
        Ok(out)
    }

    /// Blocks up to the end event of the enclosing container, which is
    /// consumed. Returns the children and the container's end offset.
    fn container(
        &mut self,
        events: &[BlockEvent],
        i: &mut usize,
        start: u32,
    ) -> Result<(Vec<Block>, u32), DirectiveContractError> {
        let mut children = Vec::new();
        while let Some(event) = events.get(*i) {
            match *event {
                BlockEvent::BlockQuoteEnd { pos }
                | BlockEvent::ListItemEnd { pos }
                | BlockEvent::FootnoteEnd { pos } => {
                    *i += 1;
                    return Ok((children, pos));
                }
                _ => {
                    if let Some(block) = self.block(events, i)? {
                        children.push(block);
                    }
                }
            }
        }
        let end = children
            .last()
            .map_or(self.base + start, |b: &Block| b.location().end);
        Ok((children, end.saturating_sub(self.base)))
    }

    /// Build the block starting at `events[*i]`. Footnote definitions go to
    /// the footnote store and yield `None`.
    fn block(
        &mut self,
        events: &[BlockEvent],
        i: &mut usize,
    ) -> Result<Option<Block>, DirectiveContractError> {
        let event = &events[*i];
        *i += 1;
        let block = match *event {
            BlockEvent::ParagraphStart => self.paragraph(events, i, false).0,
            BlockEvent::HeadingStart { level, pos } => {
                let (lines, end) = self.text_lines(events, i);
                Block::Heading(Heading {
                    level,
                    children: self.inlines(&lines),
                    location: self.locate(pos, end),
                })
            }
            BlockEvent::CodeBlockStart { info, fenced, pos } => {
                let (literal, end) = self.literal(events, i, true);
                let location = self.locate(pos, end);
                if fenced {
                    let info = info
                        .map(|r| unescape(r.slice_str(self.source)))
                        .filter(|s| !s.is_empty());
                    Block::FencedCode(CodeBlock {
                        info,
                        literal,
                        location,
                    })
                } else {
                    Block::IndentedCode(CodeBlock {
                        info: None,
                        literal,
                        location,
                    })
                }
            }
            BlockEvent::HtmlBlockStart { pos } => {
                let (literal, end) = self.literal(events, i, true);
                Block::HtmlBlock(HtmlBlock {
                    literal,
                    location: self.locate(pos, end),
                })
            }
            BlockEvent::MathBlockStart { pos } => {
                let (literal, end) = self.literal(events, i, false);
                Block::MathBlock(MathBlock {
                    literal,
                    location: self.locate(pos, end),
                })
            }
            BlockEvent::ThematicBreak(r) => Block::ThematicBreak(self.locate(r.start, r.end)),
            BlockEvent::BlockQuoteStart { pos } => {
                let (children, end) = self.container(events, i, pos)?;
                Block::BlockQuote(BlockQuote {
                    children,
                    location: self.locate(pos, end),
                })
            }
            BlockEvent::ListStart { kind, tight, pos } => self.list(events, i, kind, tight, pos)?,
            BlockEvent::TableStart { pos } => self.table(events, i, pos),
            BlockEvent::FootnoteStart { label, pos } => {
                let (children, end) = self.container(events, i, pos)?;
                let location = self.locate(pos, end);
                self.state
                    .footnotes
                    .insert(label.slice_str(self.source), children, location);
                return Ok(None);
            }
            BlockEvent::Directive(index) => match self.directives.get(index as usize) {
                Some(raw) => self.directive(raw)?,
                None => return Ok(None),
            },
            // Stray end events or content outside a leaf.
            _ => return Ok(None),
        };
        Ok(Some(block))
    }

    /// `Text` ranges up to the next end event, which is consumed.
    fn text_lines(&self, events: &[BlockEvent], i: &mut usize) -> (SmallVec<[Range; 4]>, u32) {
        let mut lines = SmallVec::new();
        while let Some(event) = events.get(*i) {
            *i += 1;
            match *event {
                BlockEvent::Text(r) => lines.push(r),
                BlockEvent::HeadingEnd { pos } => return (lines, pos),
                _ => break,
            }
        }
        let end = lines.last().map_or(0, |r: &Range| r.end);
        (lines, end)
    }

    /// Paragraph lines up to `ParagraphEnd`. With `task` set, a leading
    /// `[ ]`, `[x]` or `[X]` marker is split off and reported.
    fn paragraph(
        &mut self,
        events: &[BlockEvent],
        i: &mut usize,
        task: bool,
    ) -> (Block, Option<bool>) {
        let mut lines: SmallVec<[Range; 4]> = SmallVec::new();
        while let Some(event) = events.get(*i) {
            *i += 1;
            match *event {
                BlockEvent::Text(r) => lines.push(r),
                _ => break,
            }
        }
        let start = lines.first().map_or(0, |r| r.start);
        let end = lines.last().map_or(start, |r| r.end);
        let checked = if task {
            self.strip_task_marker(&mut lines)
        } else {
            None
        };
        let paragraph = Block::Paragraph(Paragraph {
            children: self.inlines(&lines),
            location: self.locate(start, end),
        });
        (paragraph, checked)
    }

    fn strip_task_marker(&self, lines: &mut [Range]) -> Option<bool> {
        let first = lines.first_mut()?;
        let bytes = first.slice(self.source.as_bytes());
        let checked = match bytes.get(..3)? {
            b"[ ]" => false,
            b"[x]" | b"[X]" => true,
            _ => return None,
        };
        if !bytes.get(3).copied().is_some_and(is_space_or_tab) {
            return None;
        }
        let rest = 3 + bytes[3..].iter().take_while(|&&b| is_space_or_tab(b)).count();
        if rest == bytes.len() {
            return None;
        }
        *first = Range::new(first.start + rest as u32, first.end);
        Some(checked)
    }

    /// Literal lines up to the closing event. Code and HTML blocks end
    /// every line with `\n`; math blocks only separate them.
    fn literal(&self, events: &[BlockEvent], i: &mut usize, terminate: bool) -> (String, u32) {
        let mut literal = String::new();
        let mut end = 0;
        let mut lines = 0usize;
        let mut in_line = false;
        while let Some(event) = events.get(*i) {
            *i += 1;
            if matches!(event, BlockEvent::VirtualSpaces(_) | BlockEvent::Code(_))
                && !in_line
                && !terminate
                && lines > 0
            {
                literal.push('\n');
            }
            match *event {
                BlockEvent::VirtualSpaces(n) => {
                    literal.extend(std::iter::repeat_n(' ', n as usize));
                    in_line = true;
                }
                BlockEvent::Code(r) => {
                    literal.push_str(r.slice_str(self.source));
                    if terminate {
                        literal.push('\n');
                    }
                    lines += 1;
                    in_line = false;
                    end = r.end;
                }
                BlockEvent::CodeBlockEnd { pos }
                | BlockEvent::HtmlBlockEnd { pos }
                | BlockEvent::MathBlockEnd { pos } => {
                    end = pos;
                    break;
                }
                _ => break,
            }
        }
        (literal, end)
    }

    fn list(
        &mut self,
        events: &[BlockEvent],
        i: &mut usize,
        kind: ast::ListKind,
        tight: bool,
        pos: u32,
    ) -> Result<Block, DirectiveContractError> {
        let mut items = Vec::new();
        let mut end = pos;
        while let Some(event) = events.get(*i) {
            *i += 1;
            match *event {
                BlockEvent::ListItemStart { pos: item_start } => {
                    let mut task = None;
                    let mut children = Vec::new();
                    if self.config.extensions.task_lists
                        && matches!(events.get(*i), Some(BlockEvent::ParagraphStart))
                    {
                        *i += 1;
                        let (paragraph, checked) = self.paragraph(events, i, true);
                        task = checked;
                        children.push(paragraph);
                    }
                    let (rest, item_end) = self.container(events, i, item_start)?;
                    children.extend(rest);
                    items.push(ListItem {
                        task,
                        children,
                        location: self.locate(item_start, item_end),
                    });
                    end = item_end;
                }
                BlockEvent::ListEnd { pos, .. } => {
                    end = end.max(pos);
                    break;
                }
                _ => break,
            }
        }
        Ok(Block::List(List {
            kind,
            tight,
            items,
            location: self.locate(pos, end),
        }))
    }

    fn table(&mut self, events: &[BlockEvent], i: &mut usize, pos: u32) -> Block {
        let mut alignments = Vec::new();
        let mut head = None;
        let mut rows = Vec::new();
        let mut in_head = false;
        let mut end = pos;
        while let Some(event) = events.get(*i) {
            *i += 1;
            match *event {
                BlockEvent::TableHeadStart => in_head = true,
                BlockEvent::TableHeadEnd => in_head = false,
                BlockEvent::TableBodyStart | BlockEvent::TableBodyEnd => {}
                BlockEvent::TableRowStart { pos } => {
                    let (row, row_alignments) = self.table_row(events, i, pos);
                    if in_head {
                        alignments = row_alignments;
                        head = Some(row);
                    } else {
                        rows.push(row);
                    }
                }
                BlockEvent::TableEnd { pos } => {
                    end = pos;
                    break;
                }
                _ => break,
            }
        }
        let location = self.locate(pos, end);
        Block::Table(Table {
            alignments,
            head: head.unwrap_or(TableRow {
                cells: Vec::new(),
                location,
            }),
            rows,
            location,
        })
    }

    fn table_row(
        &mut self,
        events: &[BlockEvent],
        i: &mut usize,
        pos: u32,
    ) -> (TableRow, Vec<Alignment>) {
        let mut cells = Vec::new();
        let mut alignments = Vec::new();
        let mut end = pos;
        let mut text: Option<Range> = None;
        while let Some(event) = events.get(*i) {
            *i += 1;
            match *event {
                BlockEvent::TableCellStart { alignment } => {
                    alignments.push(alignment);
                    text = None;
                }
                BlockEvent::Text(r) => text = Some(r),
                BlockEvent::TableCellEnd => {
                    let cell = match text.take() {
                        Some(r) => TableCell {
                            children: self.cell_inlines(r),
                            location: self.locate(r.start, r.end),
                        },
                        None => TableCell {
                            children: Vec::new(),
                            location: self.locate(end, end),
                        },
                    };
                    end = cell.location.end.saturating_sub(self.base).max(end);
                    cells.push(cell);
                }
                BlockEvent::TableRowEnd { pos: row_end } => {
                    end = row_end;
                    break;
                }
                _ => break,
            }
        }
        let row = TableRow {
            cells,
            location: self.locate(pos, end),
        };
        (row, alignments)
    }

    /// Cell content with `\|` unescaped before inline parsing, so the
    /// escape also works inside code spans.
    fn cell_inlines(&mut self, r: Range) -> Vec<Inline> {
        let raw = r.slice_str(self.source);
        if !raw.contains("\\|") {
            return self.inlines(&[r]);
        }
        let text = raw.replace("\\|", "|");
        let source = InlineSource::detached(&text, self.base + r.start, self.index);
        parse_inline(&source, self.inline_context())
    }

    fn directive(&mut self, raw: &RawDirective) -> Result<Block, DirectiveContractError> {
        let source = self.source;
        let name = raw.name.slice_str(source);
        let location = self.locate(raw.start, raw.end);
        let body = raw.body(source);
        let (option_lines, content) = split_option_lines(&body);
        let body_offset = self.base + raw.body_offset() + (body.len() - content.len()) as u32;
        let (mut pairs, argument) = split_options(raw.info.slice_str(source));
        pairs.extend(option_lines);

        let fallback = Fallback {
            name,
            argument: argument.clone(),
            pairs: &pairs,
            body: &body,
            location,
        };

        if self.depth >= MAX_DIRECTIVE_DEPTH {
            log::warn!("directive `{name}` at {location} nested too deeply");
            self.state
                .diagnostics
                .push(Diagnostic::too_deep(name, location));
            return Ok(fallback.build(ast::DirectiveStatus::Invalid));
        }

        let config = self.config;
        let registered = if config.directive_enabled(name) {
            config.registry.directive(name)
        } else {
            None
        };
        let Some(directive) = registered else {
            log::warn!("unknown directive `{name}` at {location}");
            self.state
                .diagnostics
                .push(Diagnostic::unknown_directive(name, location));
            return Ok(fallback.build(ast::DirectiveStatus::Unknown));
        };

        let options = match directive.contract().validate(&pairs) {
            Ok(options) => options,
            Err(message) => {
                let err = DirectiveContractError::new(name, message, location);
                return self.contract_failure(err, fallback);
            }
        };

        let mut ctx = DirectiveContext {
            session: self.child(),
            name,
            argument: argument.as_deref(),
            location,
            body_offset,
        };
        match directive.parse(content, &options, &mut ctx) {
            Ok(output) => {
                log::debug!("resolved directive `{name}` at {location}");
                Ok(Block::Directive(ast::Directive {
                    name: name.to_string(),
                    argument,
                    options,
                    status: ast::DirectiveStatus::Resolved,
                    class: output.class,
                    title: output.title,
                    icon: output.icon,
                    children: output.children,
                    location,
                }))
            }
            Err(err) => self.contract_failure(err, fallback),
        }
    }

    /// Strict configs abort; otherwise the directive degrades to its
    /// literal body and the error becomes a diagnostic.
    fn contract_failure(
        &mut self,
        err: DirectiveContractError,
        fallback: Fallback<'_>,
    ) -> Result<Block, DirectiveContractError> {
        if self.config.strict_directives {
            return Err(err);
        }
        log::warn!("{err}");
        self.state.diagnostics.push(Diagnostic::contract(err));
        Ok(fallback.build(ast::DirectiveStatus::Invalid))
    }

    fn child(&mut self) -> Session<'_> {
        Session {
            config: self.config,
            source: self.source,
            index: self.index,
            refs: self.refs,
            directives: self.directives,
            state: &mut *self.state,
            depth: self.depth + 1,
            base: self.base,
        }
    }

    /// Parse a directive body as blocks. Link definitions in the body are
    /// visible inside it only; the document's definitions take precedence.
    pub(crate) fn nested_blocks(
        &mut self,
        text: &str,
        body_offset: u32,
        name: &str,
        location: SourceLocation,
    ) -> Result<Vec<Block>, DirectiveContractError> {
        let output = parse_blocks(text, BlockOptions::from_config(self.config));
        log::debug!(
            "body of `{name}` at {location}: {} events",
            output.events.len()
        );
        declare_footnotes(text, &output.events, &mut self.state.footnotes);
        let mut refs = self.refs.clone();
        refs.extend_from(&output.link_refs);
        Session {
            config: self.config,
            source: text,
            index: self.index,
            refs: &refs,
            directives: &output.directives,
            state: &mut *self.state,
            depth: self.depth,
            base: body_offset,
        }
        .blocks(&output.events)
    }

    /// Parse a short piece of text, such as a title, as inline content.
    pub(crate) fn nested_inline(&mut self, text: &str, location: SourceLocation) -> Vec<Inline> {
        let source = InlineSource::detached(text, location.start, self.index);
        parse_inline(&source, self.inline_context())
    }
}

/// What a directive turns into when it cannot be resolved.
struct Fallback<'a> {
    name: &'a str,
    argument: Option<String>,
    pairs: &'a [(String, String)],
    body: &'a str,
    location: SourceLocation,
}

impl Fallback<'_> {
    fn build(self, status: ast::DirectiveStatus) -> Block {
        let options = OptionContract::new()
            .validate(self.pairs)
            .unwrap_or_else(|_| DirectiveOptions::default());
        let class = match status {
            ast::DirectiveStatus::Unknown => "directive directive-unknown",
            _ => "directive directive-invalid",
        };
        Block::Directive(ast::Directive {
            name: self.name.to_string(),
            argument: self.argument,
            options,
            status,
            class: class.to_string(),
            title: Vec::new(),
            icon: None,
            children: vec![Block::FencedCode(CodeBlock {
                info: None,
                literal: self.body.to_string(),
                location: self.location,
            })],
            location: self.location,
        })
    }
}

/// Leading `:key: value` lines of a directive body, and the rest.
fn split_option_lines(body: &str) -> (Vec<(String, String)>, &str) {
    let mut options = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let (line, tail) = rest.split_once('\n').unwrap_or((rest, ""));
        let Some(after) = line.trim_start_matches([' ', '\t']).strip_prefix(':') else {
            break;
        };
        let Some((key, value)) = after.split_once(':') else {
            break;
        };
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'));
        if !valid {
            break;
        }
        options.push((key.to_string(), value.trim().to_string()));
        rest = tail;
    }
    (options, rest)
}
