//! GFM tables: recognition, alignment, cell splitting and termination.

use markloom::ast::Alignment;
use markloom::{Block, Extensions, ParserConfig, parse, to_html_with_config};

fn gfm(input: &str) -> String {
    to_html_with_config(input, &ParserConfig::gfm())
}

/// Expected markup for a table. `align` holds one entry per column:
/// `""`, `"left"`, `"center"` or `"right"`.
fn table(align: &[&str], head: &[&str], rows: &[&[&str]]) -> String {
    fn row(out: &mut String, tag: &str, align: &[&str], cells: &[&str]) {
        out.push_str("<tr>\n");
        for (a, cell) in align.iter().zip(cells) {
            if a.is_empty() {
                out.push_str(&format!("<{tag}>{cell}</{tag}>\n"));
            } else {
                out.push_str(&format!("<{tag} align=\"{a}\">{cell}</{tag}>\n"));
            }
        }
        out.push_str("</tr>\n");
    }
    let mut out = String::from("<table>\n<thead>\n");
    row(&mut out, "th", align, head);
    out.push_str("</thead>\n");
    if !rows.is_empty() {
        out.push_str("<tbody>\n");
        for cells in rows {
            row(&mut out, "td", align, cells);
        }
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
    out
}

#[test]
fn basic_table() {
    assert_eq!(
        gfm("| foo | bar |\n| --- | --- |\n| baz | bim |\n"),
        table(&["", ""], &["foo", "bar"], &[&["baz", "bim"]])
    );
}

#[test]
fn alignment_without_outer_pipes() {
    assert_eq!(
        gfm("| abc | defghi |\n:-: | -----------:\nbar | baz\n"),
        table(&["center", "right"], &["abc", "defghi"], &[&["bar", "baz"]])
    );
    assert_eq!(
        gfm("a | b | c | d\n--- | :--- | :---: | ---:\n1 | 2 | 3 | 4\n"),
        table(&["", "left", "center", "right"], &["a", "b", "c", "d"], &[&["1", "2", "3", "4"]])
    );
}

#[test]
fn escaped_pipes() {
    assert_eq!(
        gfm("| f\\|oo  |\n| ------ |\n| b `\\|` az |\n| b **\\|** im |\n"),
        table(&[""], &["f|oo"], &[&["b <code>|</code> az"], &["b <strong>|</strong> im"]])
    );
    assert_eq!(
        gfm("| a\\| | b |\n| --- | --- |\n| c\\| | d |\n"),
        table(&["", ""], &["a|", "b"], &[&["c|", "d"]])
    );
}

#[test]
fn inline_content_in_cells() {
    assert_eq!(
        gfm("| *em* | `code` |\n| --- | --- |\n| [link](url) | ![img](src) |\n"),
        table(
            &["", ""],
            &["<em>em</em>", "<code>code</code>"],
            &[&["<a href=\"url\">link</a>", "<img src=\"src\" alt=\"img\" />"]]
        )
    );
}

#[test]
fn reference_links_resolve_in_cells() {
    let out = gfm("| [home] |\n| --- |\n| [home][] |\n\n[home]: /index\n");
    assert_eq!(
        out,
        table(&[""], &["<a href=\"/index\">home</a>"], &[&["<a href=\"/index\">home</a>"]])
    );
}

#[test]
fn row_lengths_are_normalized() {
    assert_eq!(
        gfm("| abc | def |\n| --- | --- |\n| bar |\n| bar | baz | boo |\n"),
        table(&["", ""], &["abc", "def"], &[&["bar", ""], &["bar", "baz"]])
    );
}

#[test]
fn header_only() {
    assert_eq!(
        gfm("| abc | def |\n| --- | --- |\n"),
        table(&["", ""], &["abc", "def"], &[])
    );
}

#[test]
fn terminators() {
    let body = table(&["", ""], &["a", "b"], &[&["c", "d"]]);
    let cases = [
        ("> quote\n", "<blockquote>\n<p>quote</p>\n</blockquote>\n"),
        ("# Heading\n", "<h1>Heading</h1>\n"),
        ("---\n", "<hr />\n"),
        ("\nafter\n", "<p>after</p>\n"),
    ];
    for (tail, rendered) in cases {
        let input = format!("| a | b |\n| - | - |\n| c | d |\n{tail}");
        assert_eq!(gfm(&input), format!("{body}{rendered}"), "{tail:?}");
    }
}

#[test]
fn plain_line_continues_the_table() {
    assert_eq!(
        gfm("| abc | def |\n| --- | --- |\n| bar | baz |\nbar\n\nbar\n"),
        table(&["", ""], &["abc", "def"], &[&["bar", "baz"], &["bar", ""]]) + "<p>bar</p>\n"
    );
}

#[test]
fn paragraph_lines_before_the_header_stay_a_paragraph() {
    assert_eq!(
        gfm("123\n456\n| a | b |\n| ---| --- |\nd | e\n"),
        "<p>123\n456</p>\n".to_string() + &table(&["", ""], &["a", "b"], &[&["d", "e"]])
    );
}

#[test]
fn not_tables() {
    for input in [
        "| abc | def |\n| --- |\n| bar |\n",
        "| a | b | c |\n| --- | --- |\n",
        "| only a header |\n",
        "| a | b |\n| a | b |\n",
        "|\n-|\n",
    ] {
        assert!(!gfm(input).contains("<table>"), "{input:?}");
    }
}

#[test]
fn nested_in_containers() {
    let inner = table(&["", ""], &["a", "b"], &[&["c", "d"]]);
    assert_eq!(
        gfm("> | a | b |\n> | - | - |\n> | c | d |\n"),
        format!("<blockquote>\n{inner}</blockquote>\n")
    );
    assert_eq!(
        gfm("- | a | b |\n  | - | - |\n  | c | d |\n"),
        format!("<ul>\n<li>\n{inner}</li>\n</ul>\n")
    );
}

#[test]
fn table_at_eof() {
    assert_eq!(
        gfm("| a | b |\n| - | - |\n| c | d |"),
        table(&["", ""], &["a", "b"], &[&["c", "d"]])
    );
}

#[test]
fn table_disabled_via_config() {
    let input = "| a | b |\n| - | - |\n| c | d |\n";
    let config = ParserConfig::default().with_extensions(Extensions {
        table: false,
        ..Extensions::gfm()
    });
    assert!(!to_html_with_config(input, &config).contains("<table>"));
    assert!(!markloom::to_html(input).contains("<table>"));
}

#[test]
fn table_ast_shape() {
    let doc = parse("| a | b |\n| :-: | --: |\n| x |\n", &ParserConfig::gfm()).unwrap();
    let Block::Table(table) = &doc.children[0] else {
        panic!("expected table, got {:?}", doc.children);
    };
    assert_eq!(table.alignments, vec![Alignment::Center, Alignment::Right]);
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].cells.len(), 2);
    assert!(table.rows[0].cells[1].children.is_empty());
    assert_eq!(table.location.line, 1);
}
