//! Built-in directives, roles and inline plugins.

use super::{
    Directive, DirectiveContext, DirectiveOptions, DirectiveOutput, InlinePlugin, OptionContract,
    OptionKind, PluginMatch, Role, RoleOptions,
};
use crate::ast::{Block, Inline, Link, Math, MathBlock, RawHtml, Text};
use crate::error::DirectiveContractError;
use crate::escape::escape_text_to_string;
use crate::location::SourceLocation;

/// GitHub-alert style admonition.
///
/// `:::{warning}` renders `<div class="markdown-alert markdown-alert-warning">`
/// with a title paragraph. The generic `admonition` directive takes its
/// title from the fence argument and fails without one.
#[derive(Debug, Clone)]
pub struct Admonition {
    name: &'static str,
    default_title: Option<&'static str>,
    contract: OptionContract,
}

const ADMONITIONS: [(&str, &str); 5] = [
    ("note", "Note"),
    ("tip", "Tip"),
    ("important", "Important"),
    ("warning", "Warning"),
    ("caution", "Caution"),
];

impl Admonition {
    pub fn new(name: &'static str, default_title: Option<&'static str>) -> Self {
        Self {
            name,
            default_title,
            contract: OptionContract::new()
                .optional("class", OptionKind::String)
                .optional("icon", OptionKind::String)
                .optional("title", OptionKind::String)
                .closed(),
        }
    }

    /// The five GitHub alert kinds.
    pub fn all() -> impl Iterator<Item = Admonition> {
        ADMONITIONS
            .into_iter()
            .map(|(name, title)| Admonition::new(name, Some(title)))
    }

    /// `:::{admonition} Title`.
    pub fn generic() -> Self {
        Self::new("admonition", None)
    }
}

impl Directive for Admonition {
    fn name(&self) -> &str {
        self.name
    }

    fn contract(&self) -> &OptionContract {
        &self.contract
    }

    fn parse(
        &self,
        body: &str,
        options: &DirectiveOptions,
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<DirectiveOutput, DirectiveContractError> {
        let title = options
            .get_str("title")
            .or(ctx.argument())
            .or(self.default_title)
            .map(str::to_owned)
            .ok_or_else(|| ctx.error("a title is required"))?;

        let mut class = format!("markdown-alert markdown-alert-{}", self.name);
        if let Some(extra) = options.get_str("class") {
            class.push(' ');
            class.push_str(extra);
        }
        let icon = Some(options.get_str("icon").unwrap_or(self.name).to_string());

        Ok(DirectiveOutput {
            class,
            title: ctx.parse_inline(&title),
            icon,
            children: ctx.parse_blocks(body)?,
        })
    }
}

/// `:::{math}` wrapping a display math block.
#[derive(Debug, Clone)]
pub struct MathDirective {
    contract: OptionContract,
}

impl MathDirective {
    pub fn new() -> Self {
        Self {
            contract: OptionContract::new()
                .optional("label", OptionKind::String)
                .closed(),
        }
    }
}

impl Default for MathDirective {
    fn default() -> Self {
        Self::new()
    }
}

impl Directive for MathDirective {
    fn name(&self) -> &str {
        "math"
    }

    fn contract(&self) -> &OptionContract {
        &self.contract
    }

    fn parse(
        &self,
        body: &str,
        options: &DirectiveOptions,
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<DirectiveOutput, DirectiveContractError> {
        let mut class = String::from("math");
        if let Some(label) = options.get_str("label") {
            class.push_str(" math-");
            class.push_str(label);
        }
        Ok(DirectiveOutput {
            class,
            title: Vec::new(),
            icon: None,
            children: vec![Block::MathBlock(MathBlock {
                literal: body.trim_end_matches('\n').to_string(),
                location: ctx.location(),
            })],
        })
    }
}

fn html_element(tag: &str, content: &str, location: SourceLocation) -> Inline {
    Inline::RawHtml(RawHtml {
        literal: format!("<{tag}>{}</{tag}>", escape_text_to_string(content)),
        location,
    })
}

/// `` {kbd}`Ctrl+C` `` renders `<kbd>Ctrl+C</kbd>`.
#[derive(Debug, Clone, Copy)]
pub struct Keyboard;

impl Role for Keyboard {
    fn name(&self) -> &str {
        "kbd"
    }

    fn contract(&self) -> OptionContract {
        OptionContract::new().closed()
    }

    fn render(&self, content: &str, _: &RoleOptions, location: SourceLocation) -> Inline {
        html_element("kbd", content, location)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Subscript;

impl Role for Subscript {
    fn name(&self) -> &str {
        "sub"
    }

    fn contract(&self) -> OptionContract {
        OptionContract::new().closed()
    }

    fn render(&self, content: &str, _: &RoleOptions, location: SourceLocation) -> Inline {
        html_element("sub", content, location)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Superscript;

impl Role for Superscript {
    fn name(&self) -> &str {
        "sup"
    }

    fn contract(&self) -> OptionContract {
        OptionContract::new().closed()
    }

    fn render(&self, content: &str, _: &RoleOptions, location: SourceLocation) -> Inline {
        html_element("sup", content, location)
    }
}

/// `` {abbr}`HTML (HyperText Markup Language)` `` renders
/// `<abbr title="HyperText Markup Language">HTML</abbr>`. A `title=`
/// option takes precedence over the parenthesized form.
#[derive(Debug, Clone, Copy)]
pub struct Abbreviation;

impl Role for Abbreviation {
    fn name(&self) -> &str {
        "abbr"
    }

    fn contract(&self) -> OptionContract {
        OptionContract::new().optional("title", OptionKind::String).closed()
    }

    fn render(&self, content: &str, options: &RoleOptions, location: SourceLocation) -> Inline {
        let (text, parenthesized) = match content.trim_end().strip_suffix(')') {
            Some(rest) => match rest.rfind('(') {
                Some(open) => (rest[..open].trim_end(), Some(&rest[open + 1..])),
                None => (content, None),
            },
            None => (content, None),
        };
        let title = options.get_str("title").or(parenthesized);
        let literal = match title {
            Some(title) => format!(
                "<abbr title=\"{}\">{}</abbr>",
                escape_text_to_string(title),
                escape_text_to_string(text)
            ),
            None => format!("<abbr>{}</abbr>", escape_text_to_string(text)),
        };
        Inline::RawHtml(RawHtml { literal, location })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MathRole;

impl Role for MathRole {
    fn name(&self) -> &str {
        "math"
    }

    fn contract(&self) -> OptionContract {
        OptionContract::new().closed()
    }

    fn render(&self, content: &str, _: &RoleOptions, location: SourceLocation) -> Inline {
        Inline::Math(Math {
            display: false,
            literal: content.to_string(),
            location,
        })
    }
}

/// `$inline$` and `$$display$$` math spans.
///
/// The closing run must have the same number of dollars as the opening
/// one; content is taken literally and must not be empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathPlugin;

impl InlinePlugin for MathPlugin {
    fn name(&self) -> &str {
        "math"
    }

    fn triggers(&self) -> &[u8] {
        b"$"
    }

    fn scan(&self, text: &[u8], pos: usize) -> Option<PluginMatch> {
        let run = dollar_run(text, pos);
        if run == 0 || run > 2 {
            return None;
        }
        let content_start = pos + run;
        let mut i = content_start;
        while i < text.len() {
            if text[i] == b'$' {
                let close = dollar_run(text, i);
                if close == run && i > content_start {
                    let literal = String::from_utf8_lossy(&text[content_start..i]).into_owned();
                    return Some(PluginMatch {
                        start: pos,
                        end: i + close,
                        node: Inline::Math(Math {
                            display: run == 2,
                            literal,
                            location: SourceLocation::default(),
                        }),
                    });
                }
                i += close;
            } else {
                i += 1;
            }
        }
        None
    }
}

fn dollar_run(text: &[u8], pos: usize) -> usize {
    text[pos..].iter().take_while(|&&b| b == b'$').count()
}

/// GFM extended autolinks: `www.` domains, `http://` and `https://`
/// URLs, and bare email addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutolinkPlugin;

impl InlinePlugin for AutolinkPlugin {
    fn name(&self) -> &str {
        "autolink"
    }

    fn triggers(&self) -> &[u8] {
        b"w:@"
    }

    fn scan(&self, text: &[u8], pos: usize) -> Option<PluginMatch> {
        let (start, end, destination) = match text[pos] {
            b'w' => scan_www(text, pos)?,
            b':' => scan_scheme_url(text, pos)?,
            b'@' => scan_email(text, pos)?,
            _ => return None,
        };
        let shown = String::from_utf8_lossy(&text[start..end]).into_owned();
        Some(PluginMatch {
            start,
            end,
            node: Inline::Link(Link {
                destination,
                title: None,
                children: vec![Inline::Text(Text::new(shown, SourceLocation::default()))],
                location: SourceLocation::default(),
            }),
        })
    }
}

fn at_word_boundary(text: &[u8], pos: usize) -> bool {
    pos == 0
        || matches!(
            text[pos - 1],
            b' ' | b'\t' | b'\n' | b'\r' | b'*' | b'_' | b'~' | b'('
        )
}

fn scan_www(text: &[u8], pos: usize) -> Option<(usize, usize, String)> {
    if !text[pos..].starts_with(b"www.") || !at_word_boundary(text, pos) {
        return None;
    }
    let domain_end = scan_domain(text, pos, 1)?;
    let end = trim_link_end(text, pos, scan_path(text, domain_end));
    let url = std::str::from_utf8(&text[pos..end]).ok()?;
    Some((pos, end, format!("http://{url}")))
}

fn scan_scheme_url(text: &[u8], colon: usize) -> Option<(usize, usize, String)> {
    if !text[colon..].starts_with(b"://") {
        return None;
    }
    let start = ["https", "http"].iter().find_map(|scheme| {
        let s = colon.checked_sub(scheme.len())?;
        let matches = text[s..colon].eq_ignore_ascii_case(scheme.as_bytes());
        let bounded = s == 0 || !text[s - 1].is_ascii_alphanumeric();
        (matches && bounded).then_some(s)
    })?;
    let domain_end = scan_domain(text, colon + 3, 0)?;
    let end = trim_link_end(text, start, scan_path(text, domain_end));
    let url = std::str::from_utf8(&text[start..end]).ok()?;
    Some((start, end, url.to_string()))
}

/// Valid domain: alphanumeric segments (with `-` and `_`) separated by
/// periods, no underscore in the last two segments. `www.` links need a
/// period; scheme links do not.
fn scan_domain(text: &[u8], start: usize, min_periods: usize) -> Option<usize> {
    let mut i = start;
    let mut periods = 0;
    let mut underscore_at = Vec::new();
    let mut segment = 0;
    while i < text.len() {
        match text[i] {
            b'.' if i + 1 < text.len() && is_domain_byte(text[i + 1]) => {
                periods += 1;
                segment += 1;
            }
            b'_' => underscore_at.push(segment),
            b if is_domain_byte(b) => {}
            _ => break,
        }
        i += 1;
    }
    if i == start || periods < min_periods {
        return None;
    }
    if underscore_at.iter().any(|&s| s + 1 >= segment) {
        return None;
    }
    Some(i)
}

fn is_domain_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn scan_path(text: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < text.len() && !text[i].is_ascii_whitespace() && text[i] != b'<' {
        i += 1;
    }
    i
}

/// Drop trailing punctuation, unbalanced `)` and a trailing entity-like
/// `&name;` from an autolink.
fn trim_link_end(text: &[u8], start: usize, mut end: usize) -> usize {
    loop {
        match text[end - 1] {
            b'?' | b'!' | b'.' | b',' | b':' | b'*' | b'_' | b'~' | b'\'' | b'"' => end -= 1,
            b')' => {
                let slice = &text[start..end];
                let open = slice.iter().filter(|&&b| b == b'(').count();
                let close = slice.iter().filter(|&&b| b == b')').count();
                if close > open {
                    end -= 1;
                } else {
                    return end;
                }
            }
            b';' => {
                let mut j = end - 1;
                while j > start && text[j - 1].is_ascii_alphanumeric() {
                    j -= 1;
                }
                if j > start && j < end - 1 && text[j - 1] == b'&' {
                    end = j - 1;
                } else {
                    return end;
                }
            }
            _ => return end,
        }
        if end <= start {
            return start;
        }
    }
}

fn scan_email(text: &[u8], at: usize) -> Option<(usize, usize, String)> {
    let mut start = at;
    while start > 0 && is_email_local(text[start - 1]) {
        start -= 1;
    }
    if start == at {
        return None;
    }
    let mut end = at + 1;
    let mut periods = 0;
    while end < text.len() {
        match text[end] {
            b'.' if end + 1 < text.len() && text[end + 1].is_ascii_alphanumeric() => periods += 1,
            b if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' => {}
            _ => break,
        }
        end += 1;
    }
    if periods == 0 || matches!(text[end - 1], b'-' | b'_') {
        return None;
    }
    let address = std::str::from_utf8(&text[start..end]).ok()?;
    Some((start, end, format!("mailto:{address}")))
}

fn is_email_local(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'+' | b'-' | b'_')
}
