//! Directives, roles and inline plugins.
//!
//! A [`Registry`] maps names to trait objects. It is filled before parsing
//! starts and shared read-only behind an `Arc` afterwards; the parser only
//! ever takes `&Registry`.
//!
//! ```text
//! :::{note} Optional title class=wide
//! :icon: info
//! Body **markdown**.
//! :::
//!
//! Press {kbd}`Ctrl+C` to copy.
//! ```

mod builtin;
mod options;

pub use builtin::{
    Abbreviation, Admonition, AutolinkPlugin, Keyboard, MathDirective, MathPlugin, MathRole,
    Subscript, Superscript,
};
pub use options::{
    split_options, DirectiveOptions, OptionContract, OptionKind, OptionSpec, OptionValue,
    RoleOptions,
};

use crate::ast::{Block, Inline};
use crate::builder::Session;
use crate::error::DirectiveContractError;
use crate::location::SourceLocation;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A fenced block extension: `:::{name} ... :::`.
pub trait Directive: Send + Sync {
    fn name(&self) -> &str;

    /// Options this directive accepts. Checked before [`parse`](Self::parse) runs.
    fn contract(&self) -> &OptionContract;

    /// Turn the raw body into content. `body` has the option lines removed.
    fn parse(
        &self,
        body: &str,
        options: &DirectiveOptions,
        ctx: &mut DirectiveContext<'_>,
    ) -> Result<DirectiveOutput, DirectiveContractError>;
}

/// What a directive contributes to its [`crate::ast::Directive`] node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveOutput {
    /// Space-separated CSS classes of the wrapper.
    pub class: String,
    pub title: Vec<Inline>,
    pub icon: Option<String>,
    pub children: Vec<Block>,
}

/// An inline extension: `` {name}`content` ``.
pub trait Role: Send + Sync {
    fn name(&self) -> &str;

    /// Options accepted inside the braces. Open by default.
    fn contract(&self) -> OptionContract {
        OptionContract::new()
    }

    fn render(&self, content: &str, options: &RoleOptions, location: SourceLocation) -> Inline;
}

/// A scanner consulted by the inline tokenizer at its trigger bytes.
pub trait InlinePlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Bytes at which [`scan`](Self::scan) is tried.
    fn triggers(&self) -> &[u8];

    /// Try to match at `pos` in `text`, which holds the whole inline span.
    ///
    /// A match may start before `pos` (an email autolink triggers at `@`)
    /// as long as it does not reach back past text the tokenizer already
    /// emitted. Locations inside `node` are replaced by the match span.
    fn scan(&self, text: &[u8], pos: usize) -> Option<PluginMatch>;
}

/// A successful plugin scan over `text[start..end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginMatch {
    pub start: usize,
    pub end: usize,
    pub node: Inline,
}

/// Name-keyed directives, roles and inline plugins.
#[derive(Default)]
pub struct Registry {
    directives: FxHashMap<String, Arc<dyn Directive>>,
    roles: FxHashMap<String, Arc<dyn Role>>,
    plugins: Vec<Arc<dyn InlinePlugin>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admonitions, the `math` directive and the `kbd`, `sub`, `sup`,
    /// `abbr` and `math` roles.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for admonition in Admonition::all() {
            registry.register_directive(admonition);
        }
        registry.register_directive(Admonition::generic());
        registry.register_directive(MathDirective::new());
        registry.register_role(Keyboard);
        registry.register_role(Subscript);
        registry.register_role(Superscript);
        registry.register_role(Abbreviation);
        registry.register_role(MathRole);
        registry
    }

    /// Register a directive, replacing any previous one with the same name.
    pub fn register_directive<D: Directive + 'static>(&mut self, directive: D) -> &mut Self {
        self.directives
            .insert(directive.name().to_string(), Arc::new(directive));
        self
    }

    pub fn register_role<R: Role + 'static>(&mut self, role: R) -> &mut Self {
        self.roles.insert(role.name().to_string(), Arc::new(role));
        self
    }

    /// Plugins registered here are always active; the built-in math and
    /// autolink plugins are switched by [`crate::Extensions`] instead.
    pub fn register_plugin<P: InlinePlugin + 'static>(&mut self, plugin: P) -> &mut Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn directive(&self, name: &str) -> Option<&dyn Directive> {
        self.directives.get(name).map(|d| d.as_ref())
    }

    pub fn role(&self, name: &str) -> Option<&dyn Role> {
        self.roles.get(name).map(|r| r.as_ref())
    }

    pub fn plugins(&self) -> impl Iterator<Item = &dyn InlinePlugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut directives: Vec<_> = self.directives.keys().collect();
        directives.sort();
        let mut roles: Vec<_> = self.roles.keys().collect();
        roles.sort();
        let plugins: Vec<_> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("Registry")
            .field("directives", &directives)
            .field("roles", &roles)
            .field("plugins", &plugins)
            .finish()
    }
}

/// Parse-time services handed to [`Directive::parse`].
pub struct DirectiveContext<'a> {
    pub(crate) session: Session<'a>,
    pub(crate) name: &'a str,
    pub(crate) argument: Option<&'a str>,
    pub(crate) location: SourceLocation,
    /// Source offset of the first body byte.
    pub(crate) body_offset: u32,
}

impl DirectiveContext<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    /// Text after `{name}` on the opening fence, options removed.
    pub fn argument(&self) -> Option<&str> {
        self.argument
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    /// Build a contract error located at this directive.
    pub fn error(&self, message: impl Into<String>) -> DirectiveContractError {
        DirectiveContractError::new(self.name, message, self.location)
    }

    /// Parse `text` as Markdown blocks with the document's configuration.
    ///
    /// Nested directives share the document's diagnostics, footnotes and
    /// link reference definitions. Locations are offsets relative to the
    /// start of the body, so they are exact only when the body was not
    /// indented inside a container.
    pub fn parse_blocks(&mut self, text: &str) -> Result<Vec<Block>, DirectiveContractError> {
        self.session.nested_blocks(text, self.body_offset, self.name, self.location)
    }

    /// Parse `text` as inline Markdown, e.g. a title.
    pub fn parse_inline(&mut self, text: &str) -> Vec<Inline> {
        self.session.nested_inline(text, self.location)
    }
}
