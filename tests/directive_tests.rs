//! Directives and roles: built-ins, custom registrations, unknown names and
//! option contracts.

use markloom::ast::{Block, DirectiveStatus, Inline, Paragraph, Text};
use markloom::extension::{
    DirectiveContext, DirectiveOptions, DirectiveOutput, OptionContract, OptionKind, RoleOptions,
};
use markloom::{
    DiagnosticKind, Directive, DirectiveContractError, ParseError, ParserConfig, Registry,
    RenderHooks, Role, Severity, SourceLocation, parse, render, to_html,
};

fn html(input: &str) -> String {
    to_html(input)
}

// --- Built-in admonitions ---

#[test]
fn alert_kinds() {
    for (name, title) in [
        ("note", "Note"),
        ("tip", "Tip"),
        ("important", "Important"),
        ("warning", "Warning"),
        ("caution", "Caution"),
    ] {
        let out = html(&format!(":::{{{name}}}\nBody text.\n:::\n"));
        assert_eq!(
            out,
            format!(
                "<div class=\"markdown-alert markdown-alert-{name}\">\n\
                 <p class=\"markdown-alert-title\">{title}</p>\n<p>Body text.</p>\n</div>\n"
            )
        );
    }
}

#[test]
fn title_from_argument_and_option() {
    let out = html(":::{warning} Mind *the* gap\nx\n:::\n");
    assert!(out.contains("<p class=\"markdown-alert-title\">Mind <em>the</em> gap</p>"), "{out}");

    let out = html(":::{tip}\n:title: Pro tip\n:class: wide\nx\n:::\n");
    assert!(out.contains("<div class=\"markdown-alert markdown-alert-tip wide\">"), "{out}");
    assert!(out.contains(">Pro tip</p>"), "{out}");
    assert!(!out.contains(":title:"), "{out}");
}

#[test]
fn body_is_full_markdown() {
    let out = html(":::{note}\n# Heading\n\n- a\n- b\n:::\n");
    assert!(out.contains("<h1>Heading</h1>\n<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n</div>"), "{out}");
}

#[test]
fn icons_come_from_the_resolver() {
    let doc = parse(":::{caution}\nx\n:::\n", &ParserConfig::default()).unwrap();
    let hooks = RenderHooks::new().with_icon_resolver(|name| Some(format!("<svg class=\"{name}\"></svg>")));
    let out = render(&doc, &hooks);
    assert!(
        out.contains("<p class=\"markdown-alert-title\"><svg class=\"caution\"></svg>Caution</p>"),
        "{out}"
    );
    assert!(!render(&doc, &RenderHooks::default()).contains("<svg"));
}

#[test]
fn nested_directives() {
    let doc = parse("::::{note}\n:::{tip}\ninner\n:::\n::::\n", &ParserConfig::default()).unwrap();
    let Block::Directive(outer) = &doc.children[0] else {
        panic!("expected directive");
    };
    assert_eq!(outer.name, "note");
    assert!(matches!(&outer.children[0], Block::Directive(d) if d.name == "tip"));
    assert!(doc.diagnostics.is_empty());
}

// --- Unknown and invalid directives degrade ---

#[test]
fn unknown_directive_renders_literally() {
    let doc = parse(":::{mystery} arg\nsome *text*\n:::\n", &ParserConfig::default()).unwrap();
    let Block::Directive(d) = &doc.children[0] else {
        panic!("expected directive");
    };
    assert_eq!(d.status, DirectiveStatus::Unknown);
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].severity, Severity::Warning);
    assert_eq!(
        render(&doc, &RenderHooks::default()),
        "<div class=\"directive directive-unknown\">\n<pre><code>some *text*\n</code></pre>\n</div>\n"
    );
}

#[test]
fn disabled_directive_is_unknown() {
    let config = ParserConfig::default().with_enabled_directives(["tip"]);
    let doc = parse(":::{note}\nx\n:::\n", &config).unwrap();
    assert!(matches!(&doc.children[0], Block::Directive(d) if d.status == DirectiveStatus::Unknown));
}

#[test]
fn contract_violation_lenient() {
    let doc = parse(":::{admonition}\nno title\n:::\n", &ParserConfig::default()).unwrap();
    let Block::Directive(d) = &doc.children[0] else {
        panic!("expected directive");
    };
    assert_eq!(d.status, DirectiveStatus::Invalid);
    assert!(doc.diagnostics[0].is_error());
    let out = render(&doc, &RenderHooks::default());
    assert!(out.starts_with("<div class=\"directive directive-invalid\">"), "{out}");
}

#[test]
fn contract_violation_strict() {
    let config = ParserConfig::default().with_strict_directives(true);
    let err = parse("text\n\n:::{note} colour=red\nx\n:::\n", &config).unwrap_err();
    let ParseError::Directive(err) = err;
    assert_eq!(err.directive, "note");
    assert_eq!(err.location.line, 3);
    assert!(err.message.contains("colour"), "{}", err.message);
}

#[test]
fn later_documents_are_unaffected_by_failures() {
    let config = ParserConfig::default();
    let bad = parse(":::{admonition}\nx\n:::\n", &config).unwrap();
    let good = parse(":::{admonition} Fine\nx\n:::\n", &config).unwrap();
    assert_eq!(bad.diagnostics.len(), 1);
    assert!(good.diagnostics.is_empty());
}

// --- Custom registrations ---

struct Figure {
    contract: OptionContract,
}

impl Figure {
    fn new() -> Self {
        Self {
            contract: OptionContract::new()
                .required("width", OptionKind::Integer)
                .optional("align", OptionKind::Choice(vec!["left".into(), "right".into()]))
                .closed(),
        }
    }
}

impl Directive for Figure {
    fn name(&self) -> &str {
        "figure"
    }

    fn contract(&self) -> &OptionContract {
        &self.contract
    }

    fn parse(
        &self,
        body: &str,
        options: &DirectiveOptions,
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<DirectiveOutput, DirectiveContractError> {
        let width = options
            .get("width")
            .and_then(|v| v.as_int())
            .ok_or_else(|| ctx.error("width is required"))?;
        if width <= 0 {
            return Err(ctx.error("width must be positive"));
        }
        let argument = ctx.argument().map(str::to_owned);
        Ok(DirectiveOutput {
            class: format!("figure w-{width}"),
            title: argument.map(|a| ctx.parse_inline(&a)).unwrap_or_default(),
            icon: None,
            children: ctx.parse_blocks(body)?,
        })
    }
}

struct Shout;

impl Role for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn render(&self, content: &str, _: &RoleOptions, location: SourceLocation) -> Inline {
        Inline::Text(Text::new(content.to_uppercase(), location))
    }
}

fn custom_config() -> ParserConfig {
    let mut registry = Registry::with_builtins();
    registry.register_directive(Figure::new()).register_role(Shout);
    ParserConfig::default().with_registry(registry)
}

#[test]
fn custom_directive_with_typed_options() {
    let doc = parse(":::{figure} A *cat* width=300\n![cat](cat.png)\n:::\n", &custom_config()).unwrap();
    let Block::Directive(d) = &doc.children[0] else {
        panic!("expected directive");
    };
    assert_eq!(d.status, DirectiveStatus::Resolved);
    assert_eq!(d.class, "figure w-300");
    assert_eq!(d.argument.as_deref(), Some("A *cat*"));
    assert_eq!(d.options.get("width").and_then(|v| v.as_int()), Some(300));
    assert_eq!(
        render(&doc, &RenderHooks::default()),
        "<div class=\"figure w-300\">\n<p class=\"figure-title\">A <em>cat</em></p>\n\
         <p><img src=\"cat.png\" alt=\"cat\" /></p>\n</div>\n"
    );
}

#[test]
fn custom_directive_contract_errors() {
    for source in [
        ":::{figure}\nx\n:::\n",
        ":::{figure} width=wide\nx\n:::\n",
        ":::{figure} width=3 align=middle\nx\n:::\n",
        ":::{figure} width=-1\nx\n:::\n",
    ] {
        let doc = parse(source, &custom_config()).unwrap();
        assert!(
            matches!(&doc.children[0], Block::Directive(d) if d.status == DirectiveStatus::Invalid),
            "{source}"
        );
        assert!(doc.diagnostics[0].is_error(), "{source}");
    }
}

#[test]
fn custom_role() {
    let doc = parse("say {shout}`hi`", &custom_config()).unwrap();
    let Block::Paragraph(Paragraph { children, .. }) = &doc.children[0] else {
        panic!("expected paragraph");
    };
    assert!(matches!(&children[1], Inline::Role(r) if r.known && r.name == "shout"));
    assert_eq!(render(&doc, &RenderHooks::default()), "<p>say HI</p>\n");
}

#[test]
fn builtin_roles() {
    assert_eq!(html("{kbd}`Ctrl+C`"), "<p><kbd>Ctrl+C</kbd></p>\n");
    assert_eq!(html("H{sub}`2`O"), "<p>H<sub>2</sub>O</p>\n");
    assert_eq!(html("x{sup}`<2>`"), "<p>x<sup>&lt;2&gt;</sup></p>\n");
}

#[test]
fn unknown_role_is_literal_with_warning() {
    let doc = parse("a {nope}`b` c", &ParserConfig::default()).unwrap();
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(render(&doc, &RenderHooks::default()), "<p>a {nope}`b` c</p>\n");
}

#[test]
fn builtin_roles_reject_stray_options() {
    let doc = parse("H{sub key=v}`2`O", &ParserConfig::default()).unwrap();
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].severity, Severity::Warning);
    assert!(matches!(
        &doc.diagnostics[0].kind,
        DiagnosticKind::RoleContract { name } if name == "sub"
    ));
    assert!(doc.diagnostics[0].message.contains("unknown option `key`"));
    assert_eq!(render(&doc, &RenderHooks::default()), "<p>H{sub key=v}`2`O</p>\n");

    let doc = parse("{abbr title=\"Hypertext\"}`HTML`", &ParserConfig::default()).unwrap();
    assert!(doc.diagnostics.is_empty());
    assert_eq!(
        render(&doc, &RenderHooks::default()),
        "<p><abbr title=\"Hypertext\">HTML</abbr></p>\n"
    );
}

#[test]
fn custom_roles_accept_any_option() {
    let doc = parse("{shout loud=yes}`hey`", &custom_config()).unwrap();
    assert!(doc.diagnostics.is_empty());
    assert_eq!(render(&doc, &RenderHooks::default()), "<p>HEY</p>\n");
}

#[test]
fn empty_registry_knows_nothing() {
    let config = ParserConfig::default().with_registry(Registry::new());
    let doc = parse(":::{note}\nx\n:::\n\n{kbd}`k`", &config).unwrap();
    assert_eq!(doc.diagnostics.len(), 2);
}

#[test]
fn unknown_directive_never_fails() {
    for strict in [false, true] {
        let config = ParserConfig::default().with_strict_directives(strict);
        let doc = parse(":::{totally-unknown}\nX\n:::\n", &config).unwrap();
        assert_eq!(doc.children.len(), 1);
        assert_eq!(doc.diagnostics.len(), 1);
    }
}
