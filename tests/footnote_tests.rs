//! GFM footnotes: references, numbering and the trailing section.

use markloom::ast::{Block, Inline};
use markloom::{Extensions, ParserConfig, parse, to_html_with_config};

fn config() -> ParserConfig {
    ParserConfig::default().with_extensions(Extensions {
        footnotes: true,
        ..Extensions::none()
    })
}

fn render(input: &str) -> String {
    to_html_with_config(input, &config())
}

#[test]
fn basic_footnote() {
    let result = render("Text[^1].\n\n[^1]: Footnote content.");
    assert_eq!(
        result,
        "<p>Text<sup><a href=\"#user-content-fn-1\" id=\"user-content-fnref-1\" data-footnote-ref>1</a></sup>.</p>\n\
         <section data-footnotes class=\"footnotes\">\n<ol>\n<li id=\"user-content-fn-1\">\n\
         <p>Footnote content. <a href=\"#user-content-fnref-1\" class=\"data-footnote-backref\" \
         aria-label=\"Back to reference 1\">\u{21a9}</a></p>\n</li>\n</ol>\n</section>\n"
    );
}

#[test]
fn numbered_by_first_reference() {
    let result = render("First[^b] second[^a].\n\n[^a]: Note A.\n\n[^b]: Note B.");
    let section = &result[result.find("<section").unwrap()..];
    let b = section.find("Note B.").unwrap();
    let a = section.find("Note A.").unwrap();
    assert!(b < a, "footnotes not ordered by first reference: {result}");
    assert!(result.contains("data-footnote-ref>2</a></sup>"), "{result}");
}

#[test]
fn repeated_reference_shares_number() {
    let result = render("First[^x] and again[^x].\n\n[^x]: Content X.");
    assert_eq!(result.matches("data-footnote-ref>1</a></sup>").count(), 2, "{result}");
    assert!(result.contains("id=\"user-content-fnref-1-2\""), "{result}");
    assert!(result.contains("\u{21a9}<sup>2</sup></a>"), "{result}");
}

#[test]
fn undefined_or_empty_label_is_literal() {
    assert_eq!(render("Text[^undef]."), "<p>Text[^undef].</p>\n");
    assert_eq!(render("Text[^]."), "<p>Text[^].</p>\n");
}

#[test]
fn duplicate_definition_first_wins() {
    let result = render("Ref[^d].\n\n[^d]: First def.\n\n[^d]: Second def.");
    assert!(result.contains("First def."), "{result}");
    assert!(!result.contains("Second def."), "{result}");
}

#[test]
fn footnotes_disabled() {
    let result = to_html_with_config("Text[^1].\n\n[^1]: Content.", &ParserConfig::default());
    assert!(!result.contains("<sup>"), "{result}");
    assert!(!result.contains("<section"), "{result}");
}

#[test]
fn multi_block_definition() {
    let input = "Text[^mp].\n\n[^mp]: First paragraph.\n\n    Second paragraph.\n\n        code here\n";
    let doc = parse(input, &config()).unwrap();
    assert_eq!(doc.footnotes.len(), 1);
    let kinds: Vec<_> = doc.footnotes[0]
        .children
        .iter()
        .map(|b| matches!(b, Block::Paragraph(_)))
        .collect();
    assert_eq!(kinds, vec![true, true, false]);

    // Backlinks follow a trailing non-paragraph block on their own line.
    let html = render(input);
    assert!(html.contains("<pre><code>code here\n</code></pre>\n <a href=\"#user-content-fnref-1\""), "{html}");
}

#[test]
fn labels_are_case_insensitive() {
    let result = render("Text[^ABC].\n\n[^abc]: Content.");
    assert!(result.contains("<sup>"), "{result}");
}

#[test]
fn unreferenced_definitions_have_no_section() {
    let result = render("[^1]: Note content.\n\nJust a paragraph.");
    assert_eq!(result, "<p>Just a paragraph.</p>\n");
}

#[test]
fn reference_node_carries_index_and_occurrence() {
    let doc = parse("a[^n] b[^n]\n\n[^n]: x\n", &config()).unwrap();
    let Block::Paragraph(p) = &doc.children[0] else {
        panic!("expected paragraph");
    };
    let refs: Vec<_> = p
        .children
        .iter()
        .filter_map(|n| match n {
            Inline::FootnoteReference(f) => Some((f.label.as_str(), f.index, f.occurrence)),
            _ => None,
        })
        .collect();
    assert_eq!(refs, vec![("n", 1, 1), ("n", 1, 2)]);
    assert_eq!(doc.footnotes[0].references, 2);
}
