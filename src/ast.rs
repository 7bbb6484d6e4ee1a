//! The typed document tree.
//!
//! Nodes own their children by value; there are no back references and
//! nothing is shared, so a `Document` is a plain finite tree that can be
//! sent across threads and read concurrently. The variant sets are closed:
//! the renderer matches them exhaustively.

use crate::error::Diagnostic;
use crate::extension::DirectiveOptions;
use crate::location::SourceLocation;

/// Root of a parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    pub children: Vec<Block>,
    /// Footnote definitions in order of first reference.
    pub footnotes: Vec<FootnoteDefinition>,
    /// Warnings and recoverable errors found while parsing.
    pub diagnostics: Vec<Diagnostic>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    List(List),
    BlockQuote(BlockQuote),
    FencedCode(CodeBlock),
    IndentedCode(CodeBlock),
    Table(Table),
    Directive(Directive),
    ThematicBreak(SourceLocation),
    HtmlBlock(HtmlBlock),
    MathBlock(MathBlock),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Heading {
    /// 1 to 6.
    pub level: u8,
    pub children: Vec<Inline>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Paragraph {
    pub children: Vec<Inline>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ListKind {
    /// `-`, `+` or `*`.
    Bullet { marker: u8 },
    /// `1.` or `1)`.
    Ordered { start: u32, delimiter: u8 },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct List {
    pub kind: ListKind,
    /// Tight lists render item paragraphs without `<p>`.
    pub tight: bool,
    pub items: Vec<ListItem>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListItem {
    /// `Some(checked)` for task list items.
    pub task: Option<bool>,
    pub children: Vec<Block>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockQuote {
    pub children: Vec<Block>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CodeBlock {
    /// Info string with escapes and entities resolved; always `None` for indented code.
    pub info: Option<String>,
    pub literal: String,
    pub location: SourceLocation,
}

impl CodeBlock {
    /// First word of the info string.
    pub fn language(&self) -> Option<&str> {
        self.info
            .as_deref()
            .and_then(|info| info.split_ascii_whitespace().next())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub head: TableRow,
    pub rows: Vec<TableRow>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableRow {
    /// Always exactly one cell per column.
    pub cells: Vec<TableCell>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableCell {
    pub children: Vec<Inline>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FootnoteDefinition {
    pub label: String,
    /// 1-based number assigned by first reference.
    pub index: u32,
    /// How many references point here.
    pub references: u32,
    pub children: Vec<Block>,
    pub location: SourceLocation,
}

/// Outcome of handing a directive block to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DirectiveStatus {
    Resolved,
    /// No directive with this name is registered or enabled.
    Unknown,
    /// The options violated the directive's contract.
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Directive {
    pub name: String,
    /// Text after `{name}` on the opening fence that is not a `key=value` pair.
    pub argument: Option<String>,
    pub options: DirectiveOptions,
    pub status: DirectiveStatus,
    /// CSS classes of the wrapping element.
    pub class: String,
    pub title: Vec<Inline>,
    /// Icon name handed to the render-time icon resolver.
    pub icon: Option<String>,
    pub children: Vec<Block>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HtmlBlock {
    pub literal: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MathBlock {
    pub literal: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Inline {
    Text(Text),
    Emphasis(Styled),
    Strong(Styled),
    Strikethrough(Styled),
    Code(Code),
    Link(Link),
    Image(Link),
    LineBreak(SourceLocation),
    SoftBreak(SourceLocation),
    Role(Role),
    RawHtml(RawHtml),
    Math(Math),
    FootnoteReference(FootnoteReference),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Text {
    pub value: String,
    pub location: SourceLocation,
}

/// Emphasis, strong emphasis or strikethrough content.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Styled {
    pub children: Vec<Inline>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Code {
    pub literal: String,
    pub location: SourceLocation,
}

/// A link or, inside [`Inline::Image`], an image whose children are the alt text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Link {
    pub destination: String,
    pub title: Option<String>,
    pub children: Vec<Inline>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Role {
    pub name: String,
    pub content: String,
    /// False when no role with this name was registered; children then
    /// hold the literal source.
    pub known: bool,
    pub children: Vec<Inline>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RawHtml {
    pub literal: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Math {
    pub display: bool,
    pub literal: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FootnoteReference {
    pub label: String,
    pub index: u32,
    /// 1 for the first reference to a footnote, 2 for the second, ...
    pub occurrence: u32,
    pub location: SourceLocation,
}

impl Text {
    pub fn new(value: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            value: value.into(),
            location,
        }
    }
}

impl Inline {
    pub fn location(&self) -> SourceLocation {
        match self {
            Inline::Text(t) => t.location,
            Inline::Emphasis(s) | Inline::Strong(s) | Inline::Strikethrough(s) => s.location,
            Inline::Code(c) => c.location,
            Inline::Link(l) | Inline::Image(l) => l.location,
            Inline::LineBreak(loc) | Inline::SoftBreak(loc) => *loc,
            Inline::Role(r) => r.location,
            Inline::RawHtml(h) => h.location,
            Inline::Math(m) => m.location,
            Inline::FootnoteReference(f) => f.location,
        }
    }

    /// Plain text content, as used for image alt attributes.
    pub fn plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(t) => out.push_str(&t.value),
            Inline::Code(c) => out.push_str(&c.literal),
            Inline::Math(m) => out.push_str(&m.literal),
            Inline::LineBreak(_) | Inline::SoftBreak(_) => out.push(' '),
            Inline::RawHtml(h) => out.push_str(&h.literal),
            Inline::FootnoteReference(f) => {
                out.push_str("[^");
                out.push_str(&f.label);
                out.push(']');
            }
            Inline::Emphasis(s) | Inline::Strong(s) | Inline::Strikethrough(s) => {
                s.children.iter().for_each(|c| c.plain_text(out))
            }
            Inline::Link(l) | Inline::Image(l) => l.children.iter().for_each(|c| c.plain_text(out)),
            Inline::Role(r) => r.children.iter().for_each(|c| c.plain_text(out)),
        }
    }
}

impl Block {
    pub fn location(&self) -> SourceLocation {
        match self {
            Block::Heading(h) => h.location,
            Block::Paragraph(p) => p.location,
            Block::List(l) => l.location,
            Block::BlockQuote(q) => q.location,
            Block::FencedCode(c) | Block::IndentedCode(c) => c.location,
            Block::Table(t) => t.location,
            Block::Directive(d) => d.location,
            Block::ThematicBreak(loc) => *loc,
            Block::HtmlBlock(h) => h.location,
            Block::MathBlock(m) => m.location,
        }
    }
}

/// Borrowed view of any node, for generic traversal.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Document(&'a Document),
    Block(&'a Block),
    ListItem(&'a ListItem),
    TableRow(&'a TableRow),
    TableCell(&'a TableCell),
    Footnote(&'a FootnoteDefinition),
    Inline(&'a Inline),
}

impl<'a> NodeRef<'a> {
    pub fn location(&self) -> SourceLocation {
        match self {
            NodeRef::Document(d) => d.location,
            NodeRef::Block(b) => b.location(),
            NodeRef::ListItem(i) => i.location,
            NodeRef::TableRow(r) => r.location,
            NodeRef::TableCell(c) => c.location,
            NodeRef::Footnote(f) => f.location,
            NodeRef::Inline(i) => i.location(),
        }
    }

    /// Direct children in document order.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        fn blocks(v: &[Block]) -> Vec<NodeRef<'_>> {
            v.iter().map(NodeRef::Block).collect()
        }
        fn inlines(v: &[Inline]) -> Vec<NodeRef<'_>> {
            v.iter().map(NodeRef::Inline).collect()
        }
        match *self {
            NodeRef::Document(d) => {
                let mut out = blocks(&d.children);
                out.extend(d.footnotes.iter().map(NodeRef::Footnote));
                out
            }
            NodeRef::Block(b) => match b {
                Block::Heading(h) => inlines(&h.children),
                Block::Paragraph(p) => inlines(&p.children),
                Block::List(l) => l.items.iter().map(NodeRef::ListItem).collect(),
                Block::BlockQuote(q) => blocks(&q.children),
                Block::Table(t) => std::iter::once(&t.head)
                    .chain(t.rows.iter())
                    .map(NodeRef::TableRow)
                    .collect(),
                Block::Directive(d) => {
                    let mut out = inlines(&d.title);
                    out.extend(d.children.iter().map(NodeRef::Block));
                    out
                }
                Block::FencedCode(_)
                | Block::IndentedCode(_)
                | Block::ThematicBreak(_)
                | Block::HtmlBlock(_)
                | Block::MathBlock(_) => Vec::new(),
            },
            NodeRef::ListItem(i) => blocks(&i.children),
            NodeRef::TableRow(r) => r.cells.iter().map(NodeRef::TableCell).collect(),
            NodeRef::TableCell(c) => inlines(&c.children),
            NodeRef::Footnote(f) => blocks(&f.children),
            NodeRef::Inline(i) => match i {
                Inline::Emphasis(s) | Inline::Strong(s) | Inline::Strikethrough(s) => {
                    inlines(&s.children)
                }
                Inline::Link(l) | Inline::Image(l) => inlines(&l.children),
                Inline::Role(r) => inlines(&r.children),
                Inline::Text(_)
                | Inline::Code(_)
                | Inline::LineBreak(_)
                | Inline::SoftBreak(_)
                | Inline::RawHtml(_)
                | Inline::Math(_)
                | Inline::FootnoteReference(_) => Vec::new(),
            },
        }
    }
}

impl Document {
    /// Visit every node in pre-order, the document itself first.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(NodeRef<'a>)) {
        let mut stack = vec![NodeRef::Document(self)];
        while let Some(node) = stack.pop() {
            visit(node);
            let children = node.children();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Number of nodes in the tree, the document included.
    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.walk(|_| n += 1);
        n
    }
}
