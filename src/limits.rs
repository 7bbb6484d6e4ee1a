//! DoS prevention constants.
//!
//! These limits keep pathological inputs linear and bound the depth of
//! the owned tree so that rendering and dropping it cannot overflow the
//! stack.

/// Maximum depth of open block containers (quotes, lists, items, footnotes).
/// Deeper markers are treated as paragraph text.
pub const MAX_BLOCK_NESTING: usize = 128;

/// Maximum nesting of emphasis-like inline nodes. Deeper matched pairs are
/// emitted as literal delimiters around their content.
pub const MAX_INLINE_NESTING: usize = 128;

/// Maximum number of simultaneously open `[` / `![` brackets.
pub const MAX_BRACKET_DEPTH: usize = 64;

/// Maximum parentheses nesting in link destinations (CommonMark: 32).
pub const MAX_LINK_PAREN_DEPTH: usize = 32;

/// Maximum length of a link label, brackets excluded (CommonMark: 999).
pub const MAX_LINK_LABEL_LEN: usize = 999;

/// Maximum digits in an ordered list marker.
pub const MAX_LIST_MARKER_DIGITS: usize = 9;

/// Maximum table columns.
pub const MAX_TABLE_COLUMNS: usize = 128;

/// Maximum nesting of directives parsing their bodies as Markdown.
pub const MAX_DIRECTIVE_DEPTH: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_reasonable() {
        const { assert!(MAX_BLOCK_NESTING >= 32) };
        const { assert!(MAX_INLINE_NESTING >= 32) };
        const { assert!(MAX_LINK_PAREN_DEPTH == 32) };
        const { assert!(MAX_LIST_MARKER_DIGITS == 9) };
        const { assert!(MAX_DIRECTIVE_DEPTH <= MAX_BLOCK_NESTING) };
    }
}
