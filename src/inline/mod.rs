//! Inline parser for Markdown.
//!
//! Inline content is parsed in two passes:
//! 1. Tokenizing: one left-to-right walk producing a flat list of
//!    [`Token`]s. Code spans, autolinks, raw HTML, roles and plugin
//!    matches are recognized where they start. Links are resolved when
//!    their closing bracket is reached, and the tokens between the
//!    brackets collapse into one finished subtree.
//! 2. Emphasis: [`resolve_emphasis`] pairs delimiter runs and builds the
//!    nodes.

mod code_span;
mod emphasis;
pub(crate) mod html;
pub(crate) mod links;
mod roles;
mod source;

pub use emphasis::{
    DelimiterState, EmphasisMatch, MatchRegistry, classify_run, is_punctuation, resolve_emphasis,
};
pub use source::InlineSource;

use crate::Range;
use crate::ast::{self, FootnoteReference, Inline, Link, Text};
use crate::config::ParserConfig;
use crate::error::Diagnostic;
use crate::escape::{decode_entity, is_ascii_punctuation, unescape};
use crate::extension::{AutolinkPlugin, InlinePlugin, MathPlugin, PluginMatch, split_options};
use crate::footnote::FootnoteStore;
use crate::limits::{MAX_BRACKET_DEPTH, MAX_LINK_LABEL_LEN};
use crate::link_ref::LinkRefStore;
use crate::location::SourceLocation;
use crate::token::{DelimiterRun, Token};
use code_span::{BacktickIndex, match_code_span, normalize_content, run_length};
use links::{AutolinkKind, scan_autolink, scan_inline_link_tail, scan_link_label};
use memchr::memchr;
use roles::{RoleSpan, scan_role};
use smallvec::SmallVec;

/// Document state the inline parser reads and updates.
pub struct InlineContext<'a> {
    pub config: &'a ParserConfig,
    pub link_refs: &'a LinkRefStore,
    pub footnotes: &'a mut FootnoteStore,
    pub diagnostics: &'a mut Vec<Diagnostic>,
}

/// An open `[` or `![`.
#[derive(Debug, Clone, Copy)]
struct Bracket {
    /// Index of its `LinkRef` token.
    token: usize,
    image: bool,
    /// Cleared once a link closes after it: links do not nest.
    active: bool,
    /// Offset just past the bracket.
    text_start: usize,
}

/// Inline parser for one span of inline content.
pub struct InlineParser<'a> {
    source: &'a InlineSource<'a>,
    ctx: InlineContext<'a>,
    special: [bool; 256],
    plugin_bytes: [bool; 256],
    plugins: SmallVec<[&'a dyn InlinePlugin; 4]>,
    backticks: Option<BacktickIndex>,
    tokens: Vec<Token>,
    brackets: Vec<Bracket>,
    /// Start of the literal text not yet pushed as a token.
    text_start: usize,
}

impl<'a> InlineParser<'a> {
    pub fn new(source: &'a InlineSource<'a>, ctx: InlineContext<'a>) -> Self {
        let config = ctx.config;
        let mut special = [false; 256];
        for &b in b"\\`*_[]!<&\n" {
            special[b as usize] = true;
        }
        if config.extensions.strikethrough {
            special[b'~' as usize] = true;
        }
        if config.directive_syntax {
            special[b'{' as usize] = true;
        }

        let mut plugins: SmallVec<[&'a dyn InlinePlugin; 4]> = SmallVec::new();
        if config.extensions.math {
            plugins.push(&MathPlugin);
        }
        if config.extensions.autolinks {
            plugins.push(&AutolinkPlugin);
        }
        plugins.extend(config.registry.plugins());
        let mut plugin_bytes = [false; 256];
        for plugin in &plugins {
            for &b in plugin.triggers() {
                plugin_bytes[b as usize] = true;
            }
        }

        Self {
            source,
            ctx,
            special,
            plugin_bytes,
            plugins,
            backticks: None,
            tokens: Vec::new(),
            brackets: Vec::new(),
            text_start: 0,
        }
    }

    /// Tokenize and resolve emphasis.
    pub fn parse(self) -> Vec<Inline> {
        let source = self.source;
        let tokens = self.tokenize();
        resolve_emphasis(tokens, &mut MatchRegistry::new(), source)
    }

    /// Run the token pass only.
    pub fn tokenize(mut self) -> Vec<Token> {
        let source = self.source;
        let bytes = source.bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let b = bytes[pos];
            if self.plugin_bytes[b as usize] {
                if let Some(end) = self.plugin(pos) {
                    pos = end;
                    continue;
                }
            }
            if !self.special[b as usize] {
                pos += 1;
                continue;
            }
            pos = match b {
                b'\\' => self.backslash(pos),
                b'`' => self.code_span(pos),
                b'*' | b'_' | b'~' => self.delimiter_run(pos),
                b'[' => self.open_bracket(pos, false),
                b'!' if bytes.get(pos + 1) == Some(&b'[') => self.open_bracket(pos, true),
                b']' => self.close_bracket(pos),
                b'<' => self.angle(pos),
                b'&' => self.entity(pos),
                b'\n' => self.line_break(pos),
                b'{' => self.role(pos),
                _ => pos + 1,
            };
        }
        self.flush(bytes.len());
        self.tokens
    }

    fn flush(&mut self, end: usize) {
        if self.text_start < end {
            self.tokens
                .push(Token::text(Range::from_usize(self.text_start, end)));
        }
        self.text_start = end;
    }

    /// Push `token` covering `start..end`; pending text before it is
    /// flushed first. Returns `end`.
    fn emit(&mut self, start: usize, end: usize, token: Token) -> usize {
        self.flush(start);
        self.tokens.push(token);
        self.text_start = end;
        end
    }

    /// Leading spaces of a continuation line are not content.
    fn skip_indent(&mut self, mut pos: usize) -> usize {
        let bytes = self.source.bytes();
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        self.text_start = pos;
        pos
    }

    fn backslash(&mut self, pos: usize) -> usize {
        let bytes = self.source.bytes();
        match bytes.get(pos + 1) {
            Some(b'\n') => {
                let end = self.emit(pos, pos + 2, Token::HardBreak(Range::from_usize(pos, pos + 2)));
                self.skip_indent(end)
            }
            Some(&next) if is_ascii_punctuation(next) => {
                let range = Range::from_usize(pos, pos + 2);
                self.emit(pos, pos + 2, Token::decoded(range, (next as char).to_string()))
            }
            _ => pos + 1,
        }
    }

    fn code_span(&mut self, pos: usize) -> usize {
        let bytes = self.source.bytes();
        let len = run_length(bytes, pos);
        let index = self.backticks.get_or_insert_with(|| BacktickIndex::new(bytes));
        match match_code_span(bytes, pos, len, index) {
            Some((start, stop, end)) => self.emit(
                pos,
                end,
                Token::CodeSpan {
                    range: Range::from_usize(pos, end),
                    content: Range::from_usize(start, stop),
                },
            ),
            // An unmatched run is literal as a whole.
            None => pos + len,
        }
    }

    fn delimiter_run(&mut self, pos: usize) -> usize {
        let source = self.source;
        let bytes = source.bytes();
        let ch = bytes[pos];
        let end = pos + bytes[pos..].iter().take_while(|&&b| b == ch).count();
        if ch == b'~' && end - pos > 2 {
            return end;
        }
        let (can_open, can_close) = classify_run(source.text(), pos, end, ch);
        if !can_open && !can_close {
            return end;
        }
        let run = DelimiterRun {
            ch,
            range: Range::from_usize(pos, end),
            can_open,
            can_close,
        };
        self.emit(pos, end, Token::DelimiterRun(run))
    }

    fn open_bracket(&mut self, pos: usize, image: bool) -> usize {
        let bytes = self.source.bytes();
        if !image && self.ctx.config.extensions.footnotes && bytes.get(pos + 1) == Some(&b'^') {
            if let Some(end) = self.footnote_reference(pos) {
                return end;
            }
        }
        let end = pos + if image { 2 } else { 1 };
        if self.brackets.len() >= MAX_BRACKET_DEPTH {
            return end;
        }
        let token = Token::LinkRef {
            range: Range::from_usize(pos, end),
            image,
        };
        self.emit(pos, end, token);
        self.brackets.push(Bracket {
            token: self.tokens.len() - 1,
            image,
            active: true,
            text_start: end,
        });
        end
    }

    /// `[^label]` naming a defined footnote.
    fn footnote_reference(&mut self, pos: usize) -> Option<usize> {
        let source = self.source;
        let bytes = source.bytes();
        let start = pos + 2;
        let close = start + memchr(b']', &bytes[start..])?;
        let raw = &bytes[start..close];
        if raw.is_empty()
            || raw.len() > MAX_LINK_LABEL_LEN
            || raw.iter().any(|&b| b == b'[' || b.is_ascii_whitespace())
        {
            return None;
        }
        let label = source.slice(Range::from_usize(start, close));
        let (index, occurrence) = self.ctx.footnotes.reference(label)?;
        let end = close + 1;
        let node = Inline::FootnoteReference(FootnoteReference {
            label: label.to_string(),
            index,
            occurrence,
            location: source.locate(Range::from_usize(pos, end)),
        });
        Some(self.emit(pos, end, Token::PrebuiltNode(Box::new(node))))
    }

    fn close_bracket(&mut self, pos: usize) -> usize {
        let Some(&opener) = self.brackets.last() else {
            return pos + 1;
        };
        if !opener.active {
            self.brackets.pop();
            return pos + 1;
        }
        let Some((destination, title, end)) = self.link_target(opener.text_start, pos) else {
            self.brackets.pop();
            return pos + 1;
        };

        let source = self.source;
        self.flush(pos);
        let inner = self.tokens.split_off(opener.token + 1);
        self.tokens.truncate(opener.token);
        self.brackets.pop();

        let start = opener.text_start - if opener.image { 2 } else { 1 };
        let link = Link {
            destination,
            title,
            children: resolve_emphasis(inner, &mut MatchRegistry::new(), source),
            location: source.locate(Range::from_usize(start, end)),
        };
        let node = if opener.image {
            Inline::Image(link)
        } else {
            for bracket in self.brackets.iter_mut().filter(|b| !b.image) {
                bracket.active = false;
            }
            Inline::Link(link)
        };
        self.tokens.push(Token::PrebuiltNode(Box::new(node)));
        self.text_start = end;
        end
    }

    /// Destination, title and end offset of the link whose text ends with
    /// the `]` at `close`: an inline tail, a full, collapsed or shortcut
    /// reference, in that order.
    fn link_target(&self, text_start: usize, close: usize) -> Option<(String, Option<String>, usize)> {
        let source = self.source;
        let bytes = source.bytes();
        let after = close + 1;
        if bytes.get(after) == Some(&b'(') {
            if let Some(tail) = scan_inline_link_tail(bytes, after) {
                let slice = |(s, e): (usize, usize)| unescape(source.slice(Range::from_usize(s, e)));
                let destination = tail.destination.map(slice).unwrap_or_default();
                let title = tail.title.map(slice);
                return Some((destination, title, tail.end));
            }
        }

        let link_text = || {
            let text = source.slice(Range::from_usize(text_start, close));
            (text.len() <= MAX_LINK_LABEL_LEN).then_some(text)
        };
        let (label, end) = match scan_link_label(bytes, after) {
            Some((start, stop, next)) => (source.slice(Range::from_usize(start, stop)), next),
            None if bytes[after..].starts_with(b"[]") => (link_text()?, after + 2),
            None => (link_text()?, after),
        };
        let def = self.ctx.link_refs.lookup(label)?;
        Some((def.destination.clone(), def.title.clone(), end))
    }

    fn angle(&mut self, pos: usize) -> usize {
        let source = self.source;
        let bytes = source.bytes();
        if let Some((kind, end)) = scan_autolink(bytes, pos) {
            let inner = Range::from_usize(pos + 1, end - 1);
            let content = source.slice(inner);
            let destination = match kind {
                AutolinkKind::Email => format!("mailto:{content}"),
                AutolinkKind::Uri => content.to_string(),
            };
            let node = Inline::Link(Link {
                destination,
                title: None,
                children: vec![Inline::Text(Text::new(content, source.locate(inner)))],
                location: source.locate(Range::from_usize(pos, end)),
            });
            return self.emit(pos, end, Token::PrebuiltNode(Box::new(node)));
        }
        match html::scan_raw_html(bytes, pos) {
            Some(end) => self.emit(pos, end, Token::RawHtml(Range::from_usize(pos, end))),
            None => pos + 1,
        }
    }

    fn entity(&mut self, pos: usize) -> usize {
        let bytes = self.source.bytes();
        match decode_entity(&bytes[pos..]) {
            Some((value, len)) => {
                let range = Range::from_usize(pos, pos + len);
                self.emit(pos, pos + len, Token::decoded(range, value))
            }
            None => pos + 1,
        }
    }

    /// Two or more trailing spaces make a hard break; otherwise the line
    /// ending is soft and trailing spaces are dropped.
    fn line_break(&mut self, pos: usize) -> usize {
        let bytes = self.source.bytes();
        let mut spaces = 0;
        while pos - spaces > self.text_start && bytes[pos - spaces - 1] == b' ' {
            spaces += 1;
        }
        let start = pos - spaces;
        let token = if spaces >= 2 {
            Token::HardBreak(Range::from_usize(start, pos + 1))
        } else {
            Token::SoftBreak(Range::from_usize(pos, pos + 1))
        };
        let end = self.emit(start, pos + 1, token);
        self.skip_indent(end)
    }

    fn role(&mut self, pos: usize) -> usize {
        let bytes = self.source.bytes();
        let index = self.backticks.get_or_insert_with(|| BacktickIndex::new(bytes));
        let Some(span) = scan_role(bytes, pos, index) else {
            return pos + 1;
        };
        let node = self.build_role(pos, &span);
        self.emit(pos, span.end, Token::PrebuiltNode(Box::new(node)))
    }

    fn build_role(&mut self, pos: usize, span: &RoleSpan) -> Inline {
        let source = self.source;
        let slice = |(s, e): (usize, usize)| source.slice(Range::from_usize(s, e));
        let name = slice(span.name);
        let content = normalize_content(slice(span.content));
        let location = source.locate(Range::from_usize(pos, span.end));
        let config = self.ctx.config;
        let role = if config.role_enabled(name) {
            config.registry.role(name)
        } else {
            None
        };

        let literal = || vec![Inline::Text(Text::new(slice((pos, span.end)), location))];
        let checked = role.map(|role| {
            let (raw, _) = split_options(slice(span.options));
            role.contract().validate(&raw).map(|options| (role, options))
        });
        let children = match checked {
            Some(Ok((role, options))) => vec![role.render(&content, &options, location)],
            Some(Err(message)) => {
                log::warn!("role `{name}` at {location}: {message}");
                self.ctx
                    .diagnostics
                    .push(Diagnostic::role_contract(name, &message, location));
                literal()
            }
            None => {
                log::warn!("unknown role `{name}` at {location}");
                self.ctx
                    .diagnostics
                    .push(Diagnostic::unknown_role(name, location));
                literal()
            }
        };
        Inline::Role(ast::Role {
            name: name.to_string(),
            content,
            known: role.is_some(),
            children,
            location,
        })
    }

    /// Offer `pos` to the plugins triggered by its byte. A match may start
    /// before `pos` but not before the pending text.
    fn plugin(&mut self, pos: usize) -> Option<usize> {
        let source = self.source;
        let bytes = source.bytes();
        let b = bytes[pos];
        let floor = self.text_start;
        let found = self
            .plugins
            .iter()
            .filter(|p| p.triggers().contains(&b))
            .find_map(|p| {
                p.scan(bytes, pos)
                    .filter(|m| m.start >= floor && m.start <= pos && pos < m.end && m.end <= bytes.len())
            })?;
        let PluginMatch { start, end, mut node } = found;
        relocate(&mut node, source.locate(Range::from_usize(start, end)));
        Some(self.emit(start, end, Token::PrebuiltNode(Box::new(node))))
    }
}

/// Tokenize `source` without resolving emphasis.
pub fn tokenize_inline(source: &InlineSource<'_>, ctx: InlineContext<'_>) -> Vec<Token> {
    InlineParser::new(source, ctx).tokenize()
}

/// Parse `source` into inline nodes.
pub fn parse_inline(source: &InlineSource<'_>, ctx: InlineContext<'_>) -> Vec<Inline> {
    InlineParser::new(source, ctx).parse()
}

/// Give a plugin-built node, and everything inside it, the location of
/// the matched span.
fn relocate(node: &mut Inline, location: SourceLocation) {
    let children = match node {
        Inline::Text(t) => {
            t.location = location;
            return;
        }
        Inline::Code(c) => {
            c.location = location;
            return;
        }
        Inline::RawHtml(h) => {
            h.location = location;
            return;
        }
        Inline::Math(m) => {
            m.location = location;
            return;
        }
        Inline::FootnoteReference(f) => {
            f.location = location;
            return;
        }
        Inline::LineBreak(loc) | Inline::SoftBreak(loc) => {
            *loc = location;
            return;
        }
        Inline::Emphasis(s) | Inline::Strong(s) | Inline::Strikethrough(s) => {
            s.location = location;
            &mut s.children
        }
        Inline::Link(l) | Inline::Image(l) => {
            l.location = location;
            &mut l.children
        }
        Inline::Role(r) => {
            r.location = location;
            &mut r.children
        }
    };
    for child in children {
        relocate(child, location);
    }
}
