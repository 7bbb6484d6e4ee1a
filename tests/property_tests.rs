//! Property tests: every input parses, output is deterministic, and the
//! batch API agrees with one-at-a-time parsing.

use markloom::{
    Extensions, ParserConfig, RenderHooks, parse, parse_many, render, to_html_with_config,
};
use proptest::prelude::*;

/// Markdown-ish fragments glued together, so generated inputs hit the
/// interesting paths far more often than arbitrary strings do.
fn markdown() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("*".to_string()),
        Just("_".to_string()),
        Just("**".to_string()),
        Just("~~".to_string()),
        Just("`".to_string()),
        Just("$".to_string()),
        Just("[".to_string()),
        Just("](/u)".to_string()),
        Just("![".to_string()),
        Just("[^1]".to_string()),
        Just("[^1]: note\n".to_string()),
        Just("\n".to_string()),
        Just("\n\n".to_string()),
        Just("# ".to_string()),
        Just("> ".to_string()),
        Just("- ".to_string()),
        Just("1. ".to_string()),
        Just("    ".to_string()),
        Just("```\n".to_string()),
        Just("| a | b |\n|---|---|\n".to_string()),
        Just(":::{note}\n".to_string()),
        Just(":::\n".to_string()),
        Just("{kbd}`x`".to_string()),
        Just("<div>".to_string()),
        Just("&amp;".to_string()),
        Just("\\".to_string()),
        Just("www.a.com ".to_string()),
        "[a-z ]{0,8}",
        "[^<\\x00-\\x1f]{0,4}",
    ];
    prop::collection::vec(piece, 0..40).prop_map(|parts| parts.concat())
}

fn everything() -> ParserConfig {
    ParserConfig::default().with_extensions(Extensions::all())
}

proptest! {
    #[test]
    fn any_string_parses(input in "\\PC*") {
        let doc = parse(&input, &everything());
        prop_assert!(doc.is_ok());
    }

    #[test]
    fn markdown_parses_and_renders(input in markdown()) {
        let doc = parse(&input, &everything()).unwrap();
        let html = render(&doc, &RenderHooks::default());
        prop_assert!(html.is_empty() || html.ends_with('\n'));
    }

    #[test]
    fn locations_stay_in_bounds(input in markdown()) {
        let doc = parse(&input, &everything()).unwrap();
        let len = input.len() as u32;
        let mut ok = true;
        doc.walk(|node| {
            let loc = node.location();
            ok &= loc.start <= loc.end && loc.end <= len;
        });
        prop_assert!(ok);
    }

    #[test]
    fn rendering_is_deterministic(input in markdown()) {
        let config = everything();
        prop_assert_eq!(
            to_html_with_config(&input, &config),
            to_html_with_config(&input, &config)
        );
    }

    #[test]
    fn batch_matches_sequential(inputs in prop::collection::vec(markdown(), 0..8)) {
        let config = everything();
        let batch = parse_many(&inputs[..], 3, &config);
        prop_assert_eq!(batch.len(), inputs.len());
        for (input, result) in inputs.iter().zip(batch) {
            prop_assert_eq!(result, parse(input, &config));
        }
    }

    #[test]
    fn commonmark_never_emits_extension_markup(input in markdown()) {
        let html = to_html_with_config(&input, &ParserConfig::commonmark());
        prop_assert!(!html.contains("<del>"));
        prop_assert!(!html.contains("<table>"));
        prop_assert!(!html.contains("data-footnotes"));
        prop_assert!(!html.contains("markdown-alert"));
    }
}

#[test]
fn deep_nesting_is_bounded() {
    let quotes = ">".repeat(10_000) + " x";
    assert!(parse(&quotes, &everything()).is_ok());

    let brackets = "[".repeat(10_000) + &"]".repeat(10_000);
    assert!(parse(&brackets, &everything()).is_ok());

    let lists = (0..2_000).map(|i| format!("{}- x\n", "  ".repeat(i))).collect::<String>();
    assert!(parse(&lists, &everything()).is_ok());

    let directives = (0..200).map(|i| format!("{}{{note}}\n", ":".repeat(403 - i))).collect::<String>();
    assert!(parse(&directives, &everything()).is_ok());
}
