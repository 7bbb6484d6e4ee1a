//! HTML block start and end conditions.

use crate::inline::html::{scan_closing_tag, scan_open_tag};
use memchr::memmem;

/// Which of the seven HTML block kinds is open; decides the end condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlBlockKind {
    /// `<script>`, `<pre>`, `<style>`, `<textarea>`.
    Raw,
    Comment,
    ProcessingInstruction,
    Declaration,
    Cdata,
    /// A known block-level tag name.
    BlockTag,
    /// Any other complete tag alone on its line.
    OtherTag,
}

const RAW_TAGS: [&[u8]; 4] = [b"script", b"pre", b"style", b"textarea"];

const BLOCK_TAGS: &[&[u8]] = &[
    b"address", b"article", b"aside", b"base", b"basefont", b"blockquote", b"body",
    b"caption", b"center", b"col", b"colgroup", b"dd", b"details", b"dialog", b"dir",
    b"div", b"dl", b"dt", b"fieldset", b"figcaption", b"figure", b"footer", b"form",
    b"frame", b"frameset", b"h1", b"h2", b"h3", b"h4", b"h5", b"h6", b"head", b"header",
    b"hr", b"html", b"iframe", b"legend", b"li", b"link", b"main", b"menu", b"menuitem",
    b"nav", b"noframes", b"ol", b"optgroup", b"option", b"p", b"param", b"search",
    b"section", b"summary", b"table", b"tbody", b"td", b"tfoot", b"th", b"thead",
    b"title", b"tr", b"track", b"ul",
];

impl HtmlBlockKind {
    /// Recognize an HTML block start at `rest` (the line from its first
    /// non-space byte). Kind 7 cannot interrupt a paragraph.
    pub fn start(rest: &[u8], in_paragraph: bool) -> Option<Self> {
        if rest.first() != Some(&b'<') {
            return None;
        }
        let after = &rest[1..];

        let (closing, name_start) = match after.first() {
            Some(b'/') => (true, 2),
            _ => (false, 1),
        };
        let name_len = rest[name_start..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        let name = &rest[name_start..name_start + name_len];
        let delimited = match rest.get(name_start + name_len) {
            None => true,
            Some(b' ' | b'\t' | b'>') => true,
            Some(b'/') => rest.get(name_start + name_len + 1) == Some(&b'>'),
            _ => false,
        };

        if !closing && name_len > 0 && RAW_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            let raw_delimited = matches!(
                rest.get(name_start + name_len),
                None | Some(b' ' | b'\t' | b'>')
            );
            if raw_delimited {
                return Some(Self::Raw);
            }
        }
        if after.starts_with(b"!--") {
            return Some(Self::Comment);
        }
        if after.starts_with(b"?") {
            return Some(Self::ProcessingInstruction);
        }
        if after.starts_with(b"![CDATA[") {
            return Some(Self::Cdata);
        }
        if after.first() == Some(&b'!') && after.get(1).is_some_and(u8::is_ascii_alphabetic) {
            return Some(Self::Declaration);
        }
        if name_len > 0 && delimited && BLOCK_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            return Some(Self::BlockTag);
        }
        if in_paragraph {
            return None;
        }
        let end = if closing {
            scan_closing_tag(rest, 0)?
        } else {
            if RAW_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                return None;
            }
            scan_open_tag(rest, 0)?
        };
        rest[end..]
            .iter()
            .all(|&b| b == b' ' || b == b'\t')
            .then_some(Self::OtherTag)
    }

    /// Whether a blank line ends this block (kinds 6 and 7).
    pub fn ends_at_blank(self) -> bool {
        matches!(self, Self::BlockTag | Self::OtherTag)
    }

    /// Whether `line` satisfies the end condition of kinds 1-5.
    pub fn ends_on(self, line: &[u8]) -> bool {
        match self {
            Self::Raw => {
                [&b"</script>"[..], b"</pre>", b"</style>", b"</textarea>"]
                    .iter()
                    .any(|end| contains_ignore_case(line, end))
            }
            Self::Comment => memmem::find(line, b"-->").is_some(),
            Self::ProcessingInstruction => memmem::find(line, b"?>").is_some(),
            Self::Declaration => memchr::memchr(b'>', line).is_some(),
            Self::Cdata => memmem::find(line, b"]]>").is_some(),
            Self::BlockTag | Self::OtherTag => false,
        }
    }
}

fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(s: &str) -> Option<HtmlBlockKind> {
        HtmlBlockKind::start(s.as_bytes(), false)
    }

    #[test]
    fn start_conditions() {
        assert_eq!(kind("<pre language=\"haskell\">"), Some(HtmlBlockKind::Raw));
        assert_eq!(kind("<STYLE>"), Some(HtmlBlockKind::Raw));
        assert_eq!(kind("<!-- c"), Some(HtmlBlockKind::Comment));
        assert_eq!(kind("<?php"), Some(HtmlBlockKind::ProcessingInstruction));
        assert_eq!(kind("<!DOCTYPE html>"), Some(HtmlBlockKind::Declaration));
        assert_eq!(kind("<![CDATA["), Some(HtmlBlockKind::Cdata));
        assert_eq!(kind("<div>"), Some(HtmlBlockKind::BlockTag));
        assert_eq!(kind("</DIV"), Some(HtmlBlockKind::BlockTag));
        assert_eq!(kind("<table/>"), Some(HtmlBlockKind::BlockTag));
        assert_eq!(kind("<a href=\"foo\">"), Some(HtmlBlockKind::OtherTag));
        assert_eq!(kind("<del>*foo*</del>"), None);
        assert_eq!(kind("<divx"), None);
    }

    #[test]
    fn kind_seven_cannot_interrupt() {
        assert_eq!(HtmlBlockKind::start(b"<a>", true), None);
        assert_eq!(HtmlBlockKind::start(b"<div>", true), Some(HtmlBlockKind::BlockTag));
    }

    #[test]
    fn end_conditions() {
        assert!(HtmlBlockKind::Raw.ends_on(b"x </Script> y"));
        assert!(HtmlBlockKind::Comment.ends_on(b"-->"));
        assert!(!HtmlBlockKind::Cdata.ends_on(b"]]"));
        assert!(HtmlBlockKind::BlockTag.ends_at_blank());
        assert!(!HtmlBlockKind::Comment.ends_at_blank());
    }
}
