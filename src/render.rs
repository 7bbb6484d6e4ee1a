//! HTML output.
//!
//! [`HtmlWriter`] is an append-only byte buffer with tag helpers; the
//! renderer walks a [`Document`] and drives it. Block helpers follow the
//! CommonMark reference renderer's line discipline: a block starts on a
//! fresh line ([`HtmlWriter::cr`]) and ends with a newline.

use crate::ast::{
    Alignment, Block, CodeBlock, Directive, Document, FootnoteDefinition, FootnoteReference,
    Inline, Link, List, ListKind, Table, TableRow,
};
use crate::config::RenderHooks;
use crate::escape;
use std::fmt;

/// HTML output writer with a reusable buffer.
///
/// # Example
/// ```
/// use markloom::HtmlWriter;
///
/// let mut writer = HtmlWriter::with_capacity_for(1000);
/// writer.write_str("<p>");
/// writer.write_escaped_text(b"Hello <World>");
/// writer.write_str("</p>");
///
/// let html = writer.into_string();
/// assert_eq!(html, "<p>Hello &lt;World&gt;</p>");
/// ```
#[derive(Debug, Default)]
pub struct HtmlWriter {
    out: Vec<u8>,
}

impl HtmlWriter {
    #[inline]
    pub fn new() -> Self {
        Self {
            out: Vec::with_capacity(1024),
        }
    }

    /// Create with capacity sized for `input_len` bytes of Markdown.
    ///
    /// Typical HTML is ~1.25x input size.
    #[inline]
    pub fn with_capacity_for(input_len: usize) -> Self {
        Self {
            out: Vec::with_capacity(input_len + input_len / 4),
        }
    }

    /// Continue writing into an existing buffer.
    #[inline]
    pub fn from_vec(out: Vec<u8>) -> Self {
        Self { out }
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    /// Write a static string (compile-time known).
    #[inline]
    pub fn write_str(&mut self, s: &'static str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    /// Write a dynamic string without escaping.
    #[inline]
    pub fn write_string(&mut self, s: &str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        self.out.push(b);
    }

    #[inline]
    pub fn write_escaped_text(&mut self, text: &[u8]) {
        escape::escape_text_into(&mut self.out, text);
    }

    #[inline]
    pub fn write_escaped_attr(&mut self, text: &[u8]) {
        escape::escape_attr_into(&mut self.out, text);
    }

    /// Percent-encode and escape a link destination.
    #[inline]
    pub fn write_link_url(&mut self, url: &[u8]) {
        escape::encode_href_into(&mut self.out, url);
    }

    #[inline]
    pub fn newline(&mut self) {
        self.out.push(b'\n');
    }

    /// Start a new line unless the output already ends with one.
    #[inline]
    pub fn cr(&mut self) {
        if self.out.last().is_some_and(|&b| b != b'\n') {
            self.out.push(b'\n');
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Clear the buffer, keeping capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.out.clear();
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    /// View as `&str`. Everything written comes from `&str` input or ASCII
    /// markup, so this only falls back to `""` on misuse of `write_bytes`.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.out).unwrap_or_default()
    }

    pub fn into_string(self) -> String {
        match String::from_utf8(self.out) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.out
    }

    // Block tags

    #[inline]
    pub fn paragraph_start(&mut self) {
        self.cr();
        self.write_str("<p>");
    }

    #[inline]
    pub fn paragraph_end(&mut self) {
        self.write_str("</p>\n");
    }

    #[inline]
    pub fn heading_start(&mut self, level: u8) {
        self.cr();
        self.write_str("<h");
        self.write_byte(b'0' + level);
        self.write_byte(b'>');
    }

    #[inline]
    pub fn heading_end(&mut self, level: u8) {
        self.write_str("</h");
        self.write_byte(b'0' + level);
        self.write_str(">\n");
    }

    /// `<pre><code>`, with `class="language-..."` plus any extra classes.
    pub fn code_block_start(&mut self, lang: Option<&[u8]>) {
        self.cr();
        match lang {
            Some(lang) if !lang.is_empty() => {
                self.write_str("<pre><code class=\"language-");
                self.write_escaped_attr(lang);
                self.write_str("\">");
            }
            _ => self.write_str("<pre><code>"),
        }
    }

    #[inline]
    pub fn code_block_end(&mut self) {
        self.write_str("</code></pre>\n");
    }

    #[inline]
    pub fn thematic_break(&mut self) {
        self.cr();
        self.write_str("<hr />\n");
    }

    #[inline]
    pub fn blockquote_start(&mut self) {
        self.cr();
        self.write_str("<blockquote>\n");
    }

    #[inline]
    pub fn blockquote_end(&mut self) {
        self.cr();
        self.write_str("</blockquote>\n");
    }

    #[inline]
    pub fn ul_start(&mut self) {
        self.cr();
        self.write_str("<ul>\n");
    }

    #[inline]
    pub fn ul_end(&mut self) {
        self.cr();
        self.write_str("</ul>\n");
    }

    /// `<ol>`, with a `start` attribute unless the list starts at 1.
    pub fn ol_start(&mut self, start: u32) {
        self.cr();
        if start == 1 {
            self.write_str("<ol>\n");
        } else {
            self.write_str("<ol start=\"");
            self.write_u32(start);
            self.write_str("\">\n");
        }
    }

    #[inline]
    pub fn ol_end(&mut self) {
        self.cr();
        self.write_str("</ol>\n");
    }

    #[inline]
    pub fn li_start(&mut self) {
        self.cr();
        self.write_str("<li>");
    }

    #[inline]
    pub fn li_end(&mut self) {
        self.write_str("</li>\n");
    }

    pub fn task_checkbox(&mut self, checked: bool) {
        if checked {
            self.write_str("<input type=\"checkbox\" checked=\"\" disabled=\"\" /> ");
        } else {
            self.write_str("<input type=\"checkbox\" disabled=\"\" /> ");
        }
    }

    /// Opening cell tag, `th` or `td`, with GFM's `align` attribute.
    pub fn table_cell_start(&mut self, header: bool, alignment: Alignment) {
        self.write_str(if header { "<th" } else { "<td" });
        match alignment {
            Alignment::None => {}
            Alignment::Left => self.write_str(" align=\"left\""),
            Alignment::Center => self.write_str(" align=\"center\""),
            Alignment::Right => self.write_str(" align=\"right\""),
        }
        self.write_byte(b'>');
    }

    #[inline]
    pub fn table_cell_end(&mut self, header: bool) {
        self.write_str(if header { "</th>\n" } else { "</td>\n" });
    }

    // Inline tags

    #[inline]
    pub fn inline_code(&mut self, code: &[u8]) {
        self.write_str("<code>");
        self.write_escaped_text(code);
        self.write_str("</code>");
    }

    pub fn math(&mut self, literal: &[u8], display: bool) {
        if display {
            self.write_str("<code class=\"language-math math-display\">");
        } else {
            self.write_str("<code class=\"language-math math-inline\">");
        }
        self.write_escaped_text(literal);
        self.write_str("</code>");
    }

    #[inline]
    pub fn em_start(&mut self) {
        self.write_str("<em>");
    }

    #[inline]
    pub fn em_end(&mut self) {
        self.write_str("</em>");
    }

    #[inline]
    pub fn strong_start(&mut self) {
        self.write_str("<strong>");
    }

    #[inline]
    pub fn strong_end(&mut self) {
        self.write_str("</strong>");
    }

    #[inline]
    pub fn del_start(&mut self) {
        self.write_str("<del>");
    }

    #[inline]
    pub fn del_end(&mut self) {
        self.write_str("</del>");
    }

    pub fn link_start(&mut self, url: &[u8], title: Option<&[u8]>) {
        self.write_str("<a href=\"");
        self.write_link_url(url);
        self.write_byte(b'"');
        if let Some(title) = title {
            self.write_str(" title=\"");
            self.write_escaped_attr(title);
            self.write_byte(b'"');
        }
        self.write_byte(b'>');
    }

    #[inline]
    pub fn link_end(&mut self) {
        self.write_str("</a>");
    }

    pub fn image(&mut self, url: &[u8], alt: &[u8], title: Option<&[u8]>) {
        self.write_str("<img src=\"");
        self.write_link_url(url);
        self.write_str("\" alt=\"");
        self.write_escaped_attr(alt);
        self.write_byte(b'"');
        if let Some(title) = title {
            self.write_str(" title=\"");
            self.write_escaped_attr(title);
            self.write_byte(b'"');
        }
        self.write_str(" />");
    }

    #[inline]
    pub fn line_break(&mut self) {
        self.write_str("<br />\n");
    }

    /// Write a number without allocating.
    pub fn write_u32(&mut self, mut n: u32) {
        if n == 0 {
            self.write_byte(b'0');
            return;
        }
        let mut buf = [0u8; 10];
        let mut i = buf.len();
        while n > 0 {
            i -= 1;
            buf[i] = b'0' + (n % 10) as u8;
            n /= 10;
        }
        self.write_bytes(&buf[i..]);
    }
}

impl fmt::Write for HtmlWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// Render a document to HTML.
///
/// # Example
/// ```
/// use markloom::{parse, render, ParserConfig, RenderHooks};
///
/// let doc = parse("# Hi\n\n*there*", &ParserConfig::default()).unwrap();
/// assert_eq!(
///     render(&doc, &RenderHooks::default()),
///     "<h1>Hi</h1>\n<p><em>there</em></p>\n"
/// );
/// ```
pub fn render(document: &Document, hooks: &RenderHooks) -> String {
    let mut out = Vec::with_capacity(document.location.end as usize * 5 / 4 + 64);
    render_into(document, hooks, &mut out);
    HtmlWriter::from_vec(out).into_string()
}

/// Render a document, appending to `out`.
pub fn render_into(document: &Document, hooks: &RenderHooks, out: &mut Vec<u8>) {
    let mut renderer = Renderer {
        w: HtmlWriter::from_vec(std::mem::take(out)),
        hooks,
    };
    renderer.blocks(&document.children, false);
    renderer.footnotes(&document.footnotes);
    *out = renderer.w.into_vec();
}

struct Renderer<'a> {
    w: HtmlWriter,
    hooks: &'a RenderHooks,
}

impl Renderer<'_> {
    /// `tight` drops the `<p>` tags of direct paragraph children.
    fn blocks(&mut self, blocks: &[Block], tight: bool) {
        for block in blocks {
            self.block(block, tight);
        }
    }

    fn block(&mut self, block: &Block, tight: bool) {
        match block {
            Block::Paragraph(p) => {
                if tight {
                    self.inlines(&p.children);
                } else {
                    self.w.paragraph_start();
                    self.inlines(&p.children);
                    self.w.paragraph_end();
                }
            }
            Block::Heading(h) => {
                self.w.heading_start(h.level);
                self.inlines(&h.children);
                self.w.heading_end(h.level);
            }
            Block::FencedCode(code) | Block::IndentedCode(code) => self.code_block(code),
            Block::HtmlBlock(html) => {
                self.w.cr();
                self.w.write_string(&html.literal);
                self.w.cr();
            }
            Block::MathBlock(math) => {
                self.w.cr();
                self.w.write_str("<pre>");
                self.w.math(math.literal.as_bytes(), true);
                self.w.write_str("</pre>\n");
            }
            Block::ThematicBreak(_) => self.w.thematic_break(),
            Block::BlockQuote(quote) => {
                self.w.blockquote_start();
                self.blocks(&quote.children, false);
                self.w.blockquote_end();
            }
            Block::List(list) => self.list(list),
            Block::Table(table) => self.table(table),
            Block::Directive(directive) => self.directive(directive),
        }
    }

    fn code_block(&mut self, code: &CodeBlock) {
        let language = code.language();
        self.w.code_block_start(language.map(str::as_bytes));
        match self.hooks.highlight(&code.literal, language) {
            Some(html) => self.w.write_string(&html),
            None => self.w.write_escaped_text(code.literal.as_bytes()),
        }
        self.w.code_block_end();
    }

    fn list(&mut self, list: &List) {
        match list.kind {
            ListKind::Bullet { .. } => self.w.ul_start(),
            ListKind::Ordered { start, .. } => self.w.ol_start(start),
        }
        for item in &list.items {
            self.w.li_start();
            match (item.task, item.children.split_first()) {
                // Loose task items put the checkbox inside the first paragraph.
                (Some(checked), Some((Block::Paragraph(first), rest))) if !list.tight => {
                    self.w.paragraph_start();
                    self.w.task_checkbox(checked);
                    self.inlines(&first.children);
                    self.w.paragraph_end();
                    self.blocks(rest, false);
                }
                (task, _) => {
                    if let Some(checked) = task {
                        self.w.task_checkbox(checked);
                    }
                    self.blocks(&item.children, list.tight);
                }
            }
            self.w.li_end();
        }
        match list.kind {
            ListKind::Bullet { .. } => self.w.ul_end(),
            ListKind::Ordered { .. } => self.w.ol_end(),
        }
    }

    fn table(&mut self, table: &Table) {
        self.w.cr();
        self.w.write_str("<table>\n<thead>\n");
        self.table_row(&table.head, &table.alignments, true);
        self.w.write_str("</thead>\n");
        if !table.rows.is_empty() {
            self.w.write_str("<tbody>\n");
            for row in &table.rows {
                self.table_row(row, &table.alignments, false);
            }
            self.w.write_str("</tbody>\n");
        }
        self.w.write_str("</table>\n");
    }

    fn table_row(&mut self, row: &TableRow, alignments: &[Alignment], header: bool) {
        self.w.write_str("<tr>\n");
        for (i, cell) in row.cells.iter().enumerate() {
            let alignment = alignments.get(i).copied().unwrap_or_default();
            self.w.table_cell_start(header, alignment);
            self.inlines(&cell.children);
            self.w.table_cell_end(header);
        }
        self.w.write_str("</tr>\n");
    }

    fn directive(&mut self, directive: &Directive) {
        self.w.cr();
        self.w.write_str("<div class=\"");
        self.w.write_escaped_attr(directive.class.as_bytes());
        self.w.write_str("\">\n");

        let icon = directive
            .icon
            .as_deref()
            .and_then(|name| self.hooks.icon(name));
        if !directive.title.is_empty() || icon.is_some() {
            let base = directive
                .class
                .split_ascii_whitespace()
                .next()
                .unwrap_or("directive");
            self.w.write_str("<p class=\"");
            self.w.write_escaped_attr(base.as_bytes());
            self.w.write_str("-title\">");
            if let Some(icon) = icon {
                self.w.write_string(&icon);
            }
            self.inlines(&directive.title);
            self.w.paragraph_end();
        }

        self.blocks(&directive.children, false);
        self.w.cr();
        self.w.write_str("</div>\n");
    }

    fn footnotes(&mut self, footnotes: &[FootnoteDefinition]) {
        if footnotes.is_empty() {
            return;
        }
        self.w.cr();
        self.w.write_str("<section data-footnotes class=\"footnotes\">\n<ol>\n");
        for def in footnotes {
            self.w.write_str("<li id=\"user-content-fn-");
            self.w.write_u32(def.index);
            self.w.write_str("\">\n");

            // Backlinks go inside a trailing paragraph, else on their own line.
            match def.children.split_last() {
                Some((Block::Paragraph(last), rest)) => {
                    self.blocks(rest, false);
                    self.w.paragraph_start();
                    self.inlines(&last.children);
                    self.backrefs(def);
                    self.w.paragraph_end();
                }
                _ => {
                    self.blocks(&def.children, false);
                    self.w.cr();
                    self.backrefs(def);
                    self.w.newline();
                }
            }
            self.w.write_str("</li>\n");
        }
        self.w.write_str("</ol>\n</section>\n");
    }

    fn backrefs(&mut self, def: &FootnoteDefinition) {
        for occurrence in 1..=def.references.max(1) {
            self.w.write_str(" <a href=\"#user-content-fnref-");
            self.footnote_id(def.index, occurrence);
            self.w.write_str("\" class=\"data-footnote-backref\" aria-label=\"Back to reference ");
            self.footnote_id(def.index, occurrence);
            self.w.write_str("\">\u{21a9}");
            if occurrence > 1 {
                self.w.write_str("<sup>");
                self.w.write_u32(occurrence);
                self.w.write_str("</sup>");
            }
            self.w.write_str("</a>");
        }
    }

    /// `1` for the first reference, `1-2` for the second, ...
    fn footnote_id(&mut self, index: u32, occurrence: u32) {
        self.w.write_u32(index);
        if occurrence > 1 {
            self.w.write_byte(b'-');
            self.w.write_u32(occurrence);
        }
    }

    fn footnote_reference(&mut self, note: &FootnoteReference) {
        self.w.write_str("<sup><a href=\"#user-content-fn-");
        self.w.write_u32(note.index);
        self.w.write_str("\" id=\"user-content-fnref-");
        self.footnote_id(note.index, note.occurrence);
        self.w.write_str("\" data-footnote-ref>");
        self.w.write_u32(note.index);
        self.w.write_str("</a></sup>");
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            self.inline(inline);
        }
    }

    fn inline(&mut self, inline: &Inline) {
        match inline {
            Inline::Text(t) => self.w.write_escaped_text(t.value.as_bytes()),
            Inline::Emphasis(s) => {
                self.w.em_start();
                self.inlines(&s.children);
                self.w.em_end();
            }
            Inline::Strong(s) => {
                self.w.strong_start();
                self.inlines(&s.children);
                self.w.strong_end();
            }
            Inline::Strikethrough(s) => {
                self.w.del_start();
                self.inlines(&s.children);
                self.w.del_end();
            }
            Inline::Code(c) => self.w.inline_code(c.literal.as_bytes()),
            Inline::Link(link) => {
                self.w.link_start(
                    link.destination.as_bytes(),
                    link.title.as_deref().map(str::as_bytes),
                );
                self.inlines(&link.children);
                self.w.link_end();
            }
            Inline::Image(image) => self.image(image),
            Inline::LineBreak(_) => self.w.line_break(),
            Inline::SoftBreak(_) => self.w.newline(),
            Inline::Role(role) => self.inlines(&role.children),
            Inline::RawHtml(html) => self.w.write_string(&html.literal),
            Inline::Math(m) => self.w.math(m.literal.as_bytes(), m.display),
            Inline::FootnoteReference(note) => self.footnote_reference(note),
        }
    }

    fn image(&mut self, image: &Link) {
        let mut alt = String::new();
        for child in &image.children {
            child.plain_text(&mut alt);
        }
        self.w.image(
            image.destination.as_bytes(),
            alt.as_bytes(),
            image.title.as_deref().map(str::as_bytes),
        );
    }
}
