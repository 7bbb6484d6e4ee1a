//! Comparison benchmarks: markloom vs other Rust Markdown parsers
//!
//! Run with: cargo bench --bench comparison
//!
//! Parsers compared:
//! - markloom (this crate, strict CommonMark config)
//! - pulldown-cmark (most popular, used by rustdoc)
//! - comrak (100% CommonMark compliant, GFM support)

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use markloom::ParserConfig;

/// Sample documents for benchmarking
mod samples {
    /// Tiny document - baseline measurement
    pub const TINY: &str = "Parsed by *markloom*.";

    /// Small README-style document
    pub const SMALL: &str = r#"# Changelog

Version **0.3** ships a faster *inline* tokenizer.

- Fixed nested links
- Added roles
- Dropped the old escaper

See `parse_many` and [the guide](https://docs.rs/markloom).
"#;

    /// Medium-sized README
    pub const MEDIUM: &str = r#"# markloom

A CommonMark engine that produces a typed tree instead of raw events.

## Why another parser

- Every node knows its line and column
- Directives and roles plug in through a registry
- Documents parse in parallel with one shared config

### Quick start

```rust
let doc = markloom::parse(input, &ParserConfig::gfm())?;
let html = markloom::render(&doc, &RenderHooks::default());
```

## Status

Conformance is tracked against the **0.31.2** suite.

> Strict mode turns directive contract violations into *hard* errors.

### Further reading

- [Crate docs](https://docs.rs/markloom)
- [CommonMark](https://commonmark.org)

## License

MIT.
"#;

    /// Link-heavy document: autolinks, inline links, entities, images
    pub const LINKS: &str = r#"# Sources

Mirror at <https://mirror.example.org> or write to <mailto:ops@example.org>.

Query [builds](https://ci.example.org/runs?branch=main&page=2) &mdash; nightly only.

![Status badge](https://ci.example.org/badge.svg "Build status")

Run `cargo bench` and compare with [the baseline](https://example.org/bench).
"#;

    /// Reference link definitions and uses
    pub const REFS: &str = r#"[docs]: https://docs.rs/markloom "API docs"
[repo]: /source 'Source'

Read the [docs] before opening the [repo].

[Full reference][docs] and [browse][repo].
"#;

    /// Nested lists and mixed block elements
    pub const LISTS: &str = r#"# Plan

1. Blocks
   1. Containers
   2. Leaves
2. Inlines
   - Delimiters
     - Flanking rules

> Notes
> - Lazy lines
>   - Nested here
"#;

    /// HTML blocks and inline HTML
    pub const HTML: &str = r#"<section class="intro">
<p>Raw <b>markup</b> passes through.</p>
</section>

Text with <abbr title="HyperText">HTML</abbr> inline and &copy; entity.

<style>
p { margin: 0; }
</style>
"#;

    /// Generate a large document by repeating sections
    pub fn large() -> String {
        let section = r#"
## Chapter

Prose mixing *emphasis*, **strong text**, `inline code` and a
[reference](https://commonmark.org/help/) across two lines.

1. Parse the blocks
2. Tokenize the **inlines**
3. Resolve *emphasis*

> Quoted text that wraps
> onto a second line.

```toml
[dependencies]
markloom = "0.1"
```

A closing paragraph long enough to exercise the paragraph continuation path
and the soft break handling between its lines.

"#;
        section.repeat(50)
    }
}

fn parse_markloom(input: &str, config: &ParserConfig) -> String {
    markloom::to_html_with_config(input, config)
}

fn parse_pulldown_cmark(input: &str) -> String {
    use pulldown_cmark::{Parser, html};
    let parser = Parser::new(input);
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

fn parse_comrak(input: &str) -> String {
    comrak::markdown_to_html(input, &comrak::Options::default())
}

/// Run every parser over each named input in one group.
fn compare(c: &mut Criterion, group_name: &str, cases: &[(&str, &str)]) {
    let mut group = c.benchmark_group(group_name);
    let config = ParserConfig::commonmark();

    for &(name, input) in cases {
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("markloom", name), input, |b, s| {
            b.iter(|| parse_markloom(black_box(s), &config))
        });
        group.bench_with_input(BenchmarkId::new("pulldown-cmark", name), input, |b, s| {
            b.iter(|| parse_pulldown_cmark(black_box(s)))
        });
        group.bench_with_input(BenchmarkId::new("comrak", name), input, |b, s| {
            b.iter(|| parse_comrak(black_box(s)))
        });
    }

    group.finish();
}

/// Throughput comparison across document sizes
fn bench_throughput(c: &mut Criterion) {
    let large = samples::large();
    compare(
        c,
        "throughput",
        &[
            ("tiny", samples::TINY),
            ("small", samples::SMALL),
            ("medium", samples::MEDIUM),
            ("large", &large),
        ],
    );
}

/// Complexity comparison across representative feature sets
fn bench_complexity(c: &mut Criterion) {
    compare(
        c,
        "complexity",
        &[
            ("links", samples::LINKS),
            ("refs", samples::REFS),
            ("lists", samples::LISTS),
            ("html", samples::HTML),
        ],
    );
}

criterion_group!(benches, bench_throughput, bench_complexity);
criterion_main!(benches);
