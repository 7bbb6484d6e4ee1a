//! Performance benchmarks for markloom
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use markloom::{Extensions, ParserConfig, RenderHooks};

/// Sample Markdown documents of various sizes
mod samples {
    pub const TINY: &str = "Parsed by *markloom*.";

    pub const SMALL: &str = r#"# Changelog

Version **0.3** ships a faster *inline* tokenizer.

- Fixed nested links
- Added roles
- Dropped the old escaper

See `parse_many` and [the guide](https://docs.rs/markloom).
"#;

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

    /// Extension-heavy document: tables, footnotes, math, tasks, directives
    pub const EXTENDED: &str = r#"# Release notes

:::{note} Upgrade path
Run the migration first. See the table below[^1].
:::

| Version | Status | Notes |
|:--------|:------:|------:|
| 1.0 | ~~beta~~ stable | {kbd}`Ctrl+S` saves |
| 1.1 | planned | $O(n)$ parsing |

- [x] tables
- [ ] math blocks

$$
\sum_{i=0}^{n} x_i
$$

:::{warning}
Visit www.example.com for details.
:::

[^1]: Tables need the extension enabled.
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

    /// Pathological document with many potential delimiters
    pub fn pathological_emphasis() -> String {
        "*a ".repeat(1000) + &"b* ".repeat(1000)
    }

    /// Document with deeply nested structures
    pub fn pathological_nested() -> String {
        "> ".repeat(100) + "deep\n"
    }

    /// Directives nested until the depth limit kicks in
    pub fn pathological_directives() -> String {
        let depth = 40;
        let mut out = String::new();
        for i in 0..depth {
            out.push_str(&":".repeat(3 + depth - i));
            out.push_str("{note}\n");
        }
        out.push_str("body\n");
        for i in (0..depth).rev() {
            out.push_str(&":".repeat(3 + depth - i));
            out.push('\n');
        }
        out
    }
}

fn extended_config() -> ParserConfig {
    ParserConfig::default().with_extensions(Extensions::all())
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    for (name, input) in [
        ("tiny", samples::TINY),
        ("small", samples::SMALL),
        ("medium", samples::MEDIUM),
    ] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(name, |b| b.iter(|| markloom::to_html(black_box(input))));
    }

    let large = samples::large();
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("large", |b| {
        b.iter(|| markloom::to_html(black_box(&large)))
    });

    let config = extended_config();
    group.throughput(Throughput::Bytes(samples::EXTENDED.len() as u64));
    group.bench_function("extended", |b| {
        b.iter(|| markloom::to_html_with_config(black_box(samples::EXTENDED), &config))
    });

    group.finish();
}

/// Tree construction and rendering measured separately.
fn bench_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("phases");
    let large = samples::large();
    let config = ParserConfig::default();
    let hooks = RenderHooks::default();
    group.throughput(Throughput::Bytes(large.len() as u64));

    group.bench_function("parse", |b| {
        b.iter(|| markloom::parse(black_box(&large), &config))
    });

    let doc = match markloom::parse(&large, &config) {
        Ok(doc) => doc,
        Err(e) => panic!("sample failed to parse: {e}"),
    };
    group.bench_function("render", |b| {
        b.iter(|| markloom::render(black_box(&doc), &hooks))
    });

    group.finish();
}

fn bench_escaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("escaping");

    // Plain text (no escaping needed)
    let plain = "Hello, this is plain text without any special characters. ".repeat(100);
    group.throughput(Throughput::Bytes(plain.len() as u64));
    group.bench_function("plain_text", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(plain.len());
            markloom::escape::escape_text_into(&mut out, black_box(plain.as_bytes()));
            out
        })
    });

    // Text with HTML that needs escaping
    let html_heavy = "<script>alert('xss')</script> & more <tags> here! ".repeat(100);
    group.throughput(Throughput::Bytes(html_heavy.len() as u64));
    group.bench_function("html_heavy", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(html_heavy.len() * 2);
            markloom::escape::escape_text_into(&mut out, black_box(html_heavy.as_bytes()));
            out
        })
    });

    group.finish();
}

fn bench_pathological(c: &mut Criterion) {
    let mut group = c.benchmark_group("pathological");
    group.sample_size(20); // Fewer samples for slow cases

    for (name, input) in [
        ("emphasis_explosion", samples::pathological_emphasis()),
        ("deep_nesting", samples::pathological_nested()),
        ("nested_directives", samples::pathological_directives()),
    ] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(name, |b| b.iter(|| markloom::to_html(black_box(&input))));
    }

    group.finish();
}

fn bench_buffer_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_reuse");

    let config = ParserConfig::default();
    let hooks = RenderHooks::default();
    let doc = match markloom::parse(samples::MEDIUM, &config) {
        Ok(doc) => doc,
        Err(e) => panic!("sample failed to parse: {e}"),
    };
    group.throughput(Throughput::Bytes(samples::MEDIUM.len() as u64));

    group.bench_function("without_reuse", |b| {
        b.iter(|| markloom::render(black_box(&doc), &hooks))
    });

    group.bench_function("with_reuse", |b| {
        let mut buffer = Vec::with_capacity(samples::MEDIUM.len() * 2);
        b.iter(|| {
            buffer.clear();
            markloom::render_into(black_box(&doc), &hooks, &mut buffer);
            black_box(&buffer);
        })
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(20);

    let docs: Vec<String> = (0..64).map(|_| samples::large()).collect();
    let total: usize = docs.iter().map(String::len).sum();
    let config = ParserConfig::default();
    group.throughput(Throughput::Bytes(total as u64));

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("parse_many", workers), &workers, |b, &w| {
            b.iter(|| markloom::parse_many(black_box(&docs[..]), w, &config))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parsing,
    bench_phases,
    bench_escaping,
    bench_pathological,
    bench_buffer_reuse,
    bench_batch
);
criterion_main!(benches);
