//! Parser configuration.

use crate::extension::Registry;
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Optional CommonMark extensions.
///
/// Every flag defaults to off, which leaves plain CommonMark 0.31.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extensions {
    /// GFM pipe tables.
    pub table: bool,
    /// `[^label]` references and `[^label]: ...` definitions.
    pub footnotes: bool,
    /// `$inline$`, `$$display$$` and `$$`-fenced math blocks.
    pub math: bool,
    /// `~one~` and `~~two~~` strikethrough.
    pub strikethrough: bool,
    /// `[ ]` / `[x]` task list items.
    pub task_lists: bool,
    /// GFM extended autolinks (`www.`, bare URLs and emails).
    pub autolinks: bool,
}

impl Extensions {
    /// No extensions.
    pub const fn none() -> Self {
        Self {
            table: false,
            footnotes: false,
            math: false,
            strikethrough: false,
            task_lists: false,
            autolinks: false,
        }
    }

    /// The GitHub Flavored Markdown set.
    pub const fn gfm() -> Self {
        Self {
            table: true,
            footnotes: true,
            math: false,
            strikethrough: true,
            task_lists: true,
            autolinks: true,
        }
    }

    /// Every extension.
    pub const fn all() -> Self {
        Self {
            table: true,
            footnotes: true,
            math: true,
            strikethrough: true,
            task_lists: true,
            autolinks: true,
        }
    }
}

/// Everything `parse` needs besides the source text.
///
/// The registry is shared behind an `Arc` and never mutated once parsing
/// begins, so one config can serve any number of threads.
///
/// # Example
/// ```
/// use markloom::{ParserConfig, Extensions};
///
/// let config = ParserConfig::default()
///     .with_extensions(Extensions::gfm())
///     .with_strict_directives(true);
/// assert!(config.extensions.table);
/// ```
#[derive(Clone)]
pub struct ParserConfig {
    pub extensions: Extensions,
    /// Recognize `:::{name}` fences and `` {name}`content` `` roles.
    pub directive_syntax: bool,
    /// Directive names allowed to resolve; `None` allows every registered one.
    pub enabled_directives: Option<FxHashSet<String>>,
    /// Role names allowed to resolve; `None` allows every registered one.
    pub enabled_roles: Option<FxHashSet<String>>,
    /// Abort the whole parse on the first directive contract violation.
    pub strict_directives: bool,
    pub registry: Arc<Registry>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            extensions: Extensions::none(),
            directive_syntax: true,
            enabled_directives: None,
            enabled_roles: None,
            strict_directives: false,
            registry: Arc::new(Registry::with_builtins()),
        }
    }
}

impl ParserConfig {
    /// Strict CommonMark: no extensions, no directive or role syntax.
    pub fn commonmark() -> Self {
        Self {
            directive_syntax: false,
            ..Self::default()
        }
    }

    /// GitHub Flavored Markdown extensions on top of the default config.
    pub fn gfm() -> Self {
        Self::default().with_extensions(Extensions::gfm())
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_directive_syntax(mut self, enabled: bool) -> Self {
        self.directive_syntax = enabled;
        self
    }

    pub fn with_strict_directives(mut self, strict: bool) -> Self {
        self.strict_directives = strict;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Restrict directives to the given names.
    pub fn with_enabled_directives<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_directives = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict roles to the given names.
    pub fn with_enabled_roles<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_roles = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn directive_enabled(&self, name: &str) -> bool {
        self.enabled_directives
            .as_ref()
            .is_none_or(|set| set.contains(name))
    }

    pub(crate) fn role_enabled(&self, name: &str) -> bool {
        self.enabled_roles
            .as_ref()
            .is_none_or(|set| set.contains(name))
    }
}

impl std::fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserConfig")
            .field("extensions", &self.extensions)
            .field("directive_syntax", &self.directive_syntax)
            .field("enabled_directives", &self.enabled_directives)
            .field("enabled_roles", &self.enabled_roles)
            .field("strict_directives", &self.strict_directives)
            .field("registry", &self.registry)
            .finish()
    }
}

type IconResolver = dyn Fn(&str) -> Option<String> + Send + Sync;
type Highlighter = dyn Fn(&str, Option<&str>) -> Option<String> + Send + Sync;

/// Optional render-time callbacks.
///
/// Without an icon resolver directives render without icons; without a
/// highlighter code blocks render as escaped text in `<pre><code>`.
///
/// # Example
/// ```
/// use markloom::RenderHooks;
///
/// let hooks = RenderHooks::default()
///     .with_icon_resolver(|name| Some(format!("<svg data-icon=\"{name}\"></svg>")));
/// assert!(hooks.icon_resolver.is_some());
/// ```
#[derive(Default)]
pub struct RenderHooks {
    /// Icon name to an HTML fragment.
    pub icon_resolver: Option<Box<IconResolver>>,
    /// `(code, language)` to the inner HTML of `<pre><code>`.
    pub highlighter: Option<Box<Highlighter>>,
}

impl RenderHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_icon_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.icon_resolver = Some(Box::new(resolver));
        self
    }

    pub fn with_highlighter<F>(mut self, highlighter: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        self.highlighter = Some(Box::new(highlighter));
        self
    }

    pub(crate) fn icon(&self, name: &str) -> Option<String> {
        self.icon_resolver.as_ref().and_then(|f| f(name))
    }

    pub(crate) fn highlight(&self, code: &str, language: Option<&str>) -> Option<String> {
        self.highlighter.as_ref().and_then(|f| f(code, language))
    }
}

impl std::fmt::Debug for RenderHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHooks")
            .field("icon_resolver", &self.icon_resolver.is_some())
            .field("highlighter", &self.highlighter.is_some())
            .finish()
    }
}
