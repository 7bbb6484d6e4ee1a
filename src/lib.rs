//! markloom: a CommonMark engine with a typed AST and pluggable extensions.
//!
//! Parsing runs in two passes over the input. The block pass scans lines
//! into a flat [`BlockEvent`] stream and collects link reference
//! definitions; the builder then runs the inline tokenizer and emphasis
//! resolver over each leaf and assembles an owned [`Document`]. Every node
//! carries a [`SourceLocation`].
//!
//! # Design Principles
//! - No regex: byte-level scanning with `memchr`
//! - No backtracking: bounded work per byte, hard limits on nesting
//! - Total grammar: every input parses; only strict directive contracts fail
//! - Extensions (tables, footnotes, math, strikethrough, task lists,
//!   autolinks, directives, roles) are opt-in through [`ParserConfig`]
//!
//! # Example
//! ```
//! use markloom::{parse, render, Block, ParserConfig, RenderHooks};
//!
//! let doc = parse("# Hello\n\n:::{note}\nBody\n:::\n", &ParserConfig::default()).unwrap();
//! assert!(matches!(doc.children[1], Block::Directive(_)));
//!
//! let html = render(&doc, &RenderHooks::default());
//! assert!(html.starts_with("<h1>Hello</h1>\n<div class=\"markdown-alert markdown-alert-note\">"));
//! ```

pub mod ast;
mod batch;
pub mod block;
mod builder;
pub mod config;
pub mod cursor;
pub mod error;
pub mod escape;
pub mod extension;
pub mod footnote;
pub mod inline;
pub mod lexer;
pub mod limits;
pub mod link_ref;
pub mod location;
pub mod range;
pub mod render;
pub mod token;

pub use ast::{Block, Document, Inline, NodeRef};
pub use batch::{parse_many, parse_many_with};
pub use block::{BlockEvent, BlockParser};
pub use config::{Extensions, ParserConfig, RenderHooks};
pub use error::{Diagnostic, DiagnosticKind, DirectiveContractError, ParseError, Severity};
pub use extension::{Directive, InlinePlugin, Registry, Role};
pub use link_ref::{LinkRefDef, LinkRefStore};
pub use location::SourceLocation;
pub use range::Range;
pub use render::{HtmlWriter, render, render_into};

use std::borrow::Cow;

/// Parse Markdown into a [`Document`].
///
/// Only fails when `config.strict_directives` is set and a directive
/// violates its option contract. Otherwise problems are reported in
/// [`Document::diagnostics`].
///
/// NUL bytes are replaced with U+FFFD before parsing, so locations index
/// into the replaced text.
pub fn parse(source: &str, config: &ParserConfig) -> Result<Document, ParseError> {
    let source: Cow<'_, str> = if memchr::memchr(0, source.as_bytes()).is_some() {
        Cow::Owned(source.replace('\0', "\u{FFFD}"))
    } else {
        Cow::Borrowed(source)
    };
    builder::build_document(&source, config)
}

/// Convert Markdown to HTML with the default config.
///
/// # Example
/// ```
/// let html = markloom::to_html("# Hello\n\nWorld");
/// assert_eq!(html, "<h1>Hello</h1>\n<p>World</p>\n");
/// ```
pub fn to_html(input: &str) -> String {
    to_html_with_config(input, &ParserConfig::default())
}

/// Convert Markdown to HTML. Directive contract violations always degrade
/// here, and diagnostics are dropped.
pub fn to_html_with_config(input: &str, config: &ParserConfig) -> String {
    let result = if config.strict_directives {
        parse(input, &config.clone().with_strict_directives(false))
    } else {
        parse(input, config)
    };
    result
        .map(|doc| render(&doc, &RenderHooks::default()))
        .unwrap_or_default()
}
