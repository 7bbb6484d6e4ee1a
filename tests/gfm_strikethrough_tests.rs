//! Strikethrough, from cmark-gfm's extension tests.

use markloom::{Extensions, ParserConfig, to_html_with_config};

fn gfm(input: &str) -> String {
    to_html_with_config(input, &ParserConfig::gfm())
}

#[test]
fn single_tilde_strikethrough() {
    assert_eq!(
        gfm("A proper ~strikethrough~."),
        "<p>A proper <del>strikethrough</del>.</p>\n"
    );
}

#[test]
fn unmatched_tildes_stay_literal() {
    assert_eq!(
        gfm("These are ~not strikethroughs."),
        "<p>These are ~not strikethroughs.</p>\n"
    );
    assert_eq!(gfm("No, they are not~"), "<p>No, they are not~</p>\n");
}

#[test]
fn spaced_tilde_inside_strikethrough() {
    assert_eq!(
        gfm("This ~is ~ legit~ isn't ~ legit."),
        "<p>This <del>is ~ legit</del> isn't ~ legit.</p>\n"
    );
}

#[test]
fn long_runs_never_strike() {
    assert_eq!(
        gfm("This is not ~~~~~one~~~~~ huge strikethrough."),
        "<p>This is not ~~~~~one~~~~~ huge strikethrough.</p>\n"
    );
    assert_eq!(
        gfm("~one~ ~~two~~ ~~~three~~~"),
        "<p><del>one</del> <del>two</del> ~~~three~~~</p>\n"
    );
}

#[test]
fn run_lengths_must_match() {
    assert_eq!(gfm("No ~mismatch~~"), "<p>No ~mismatch~~</p>\n");
}

#[test]
fn strikethrough_around_strong() {
    assert_eq!(
        gfm("~~**bold**~~"),
        "<p><del><strong>bold</strong></del></p>\n"
    );
    assert_eq!(
        gfm("*a ~~b~~ c*"),
        "<p><em>a <del>b</del> c</em></p>\n"
    );
}

#[test]
fn strikethrough_disabled() {
    let config = ParserConfig::default().with_extensions(Extensions {
        strikethrough: false,
        ..Extensions::gfm()
    });
    assert_eq!(to_html_with_config("~~test~~", &config), "<p>~~test~~</p>\n");
}
