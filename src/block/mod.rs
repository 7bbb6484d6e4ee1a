//! Block-level parser for Markdown.
//!
//! The block parser is line-oriented and handles:
//! - Thematic breaks, ATX and setext headings
//! - Fenced and indented code blocks
//! - HTML blocks
//! - Block quotes, lists and list items
//! - Paragraphs and link reference definitions
//! - Tables, footnote definitions, math blocks and directive fences when
//!   enabled
//!
//! Output is a flat event stream plus the link reference definitions and
//! raw directive blocks found along the way.

mod event;
mod html;
mod leaf;
mod link_def;
mod list;
mod parser;
mod table;

pub use event::{BlockEvent, RawDirective};
pub use html::HtmlBlockKind;
pub(crate) use leaf::is_name_byte;
pub use parser::BlockParser;

use crate::link_ref::LinkRefStore;

/// Which optional block constructs the parser recognizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub math: bool,
    pub directives: bool,
}

impl BlockOptions {
    pub fn from_config(config: &crate::ParserConfig) -> Self {
        Self {
            tables: config.extensions.table,
            footnotes: config.extensions.footnotes,
            math: config.extensions.math,
            directives: config.directive_syntax,
        }
    }
}

/// Everything the block pass produces.
#[derive(Debug, Default)]
pub struct BlockOutput {
    pub events: Vec<BlockEvent>,
    pub link_refs: LinkRefStore,
    pub directives: Vec<RawDirective>,
}

/// Run the block pass over `input`.
pub fn parse_blocks(input: &str, options: BlockOptions) -> BlockOutput {
    BlockParser::new(input, options).parse()
}
