//! Option contracts for directives and roles.
//!
//! Options arrive as raw `key=value` strings from the opening fence or
//! from `:key: value` lines at the top of a directive body. A contract
//! turns them into typed [`OptionValue`]s or explains what is wrong.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    /// `true`/`false`, `yes`/`no`, `on`/`off`, `1`/`0`; a bare key is `true`.
    Boolean,
    /// One of a fixed set of words.
    Choice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub key: String,
    pub kind: OptionKind,
    pub required: bool,
}

/// The options a directive accepts.
///
/// # Example
/// ```
/// use markloom::extension::{OptionContract, OptionKind, OptionValue};
///
/// let contract = OptionContract::new()
///     .required("level", OptionKind::Integer)
///     .optional("open", OptionKind::Boolean)
///     .closed();
/// let opts = contract.validate(&[("level".into(), "2".into())]).unwrap();
/// assert_eq!(opts.get("level"), Some(&OptionValue::Integer(2)));
/// assert!(contract.validate(&[("colour".into(), "red".into())]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionContract {
    specs: Vec<OptionSpec>,
    closed: bool,
}

impl OptionContract {
    /// An open contract with no declared keys: anything goes, as strings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn optional(mut self, key: &str, kind: OptionKind) -> Self {
        self.specs.push(OptionSpec {
            key: key.to_string(),
            kind,
            required: false,
        });
        self
    }

    pub fn required(mut self, key: &str, kind: OptionKind) -> Self {
        self.specs.push(OptionSpec {
            key: key.to_string(),
            kind,
            required: true,
        });
        self
    }

    /// Reject keys that are not declared.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn specs(&self) -> &[OptionSpec] {
        &self.specs
    }

    /// Check raw pairs against the contract. Later duplicates replace
    /// earlier ones. The error is a human-readable message.
    pub fn validate(&self, raw: &[(String, String)]) -> Result<DirectiveOptions, String> {
        let mut options = DirectiveOptions::default();
        for (key, value) in raw {
            let typed = match self.specs.iter().find(|s| s.key == *key) {
                Some(spec) => convert(key, value, &spec.kind)?,
                None if self.closed => return Err(format!("unknown option `{key}`")),
                None => OptionValue::String(value.clone()),
            };
            options.set(key, typed);
        }
        if let Some(missing) = self
            .specs
            .iter()
            .find(|s| s.required && options.get(&s.key).is_none())
        {
            return Err(format!("missing required option `{}`", missing.key));
        }
        Ok(options)
    }
}

fn convert(key: &str, value: &str, kind: &OptionKind) -> Result<OptionValue, String> {
    match kind {
        OptionKind::String => Ok(OptionValue::String(value.to_string())),
        OptionKind::Integer => value
            .trim()
            .parse::<i64>()
            .map(OptionValue::Integer)
            .map_err(|_| format!("option `{key}` expects an integer, got `{value}`")),
        OptionKind::Boolean => match value.trim().to_ascii_lowercase().as_str() {
            "" | "true" | "yes" | "on" | "1" => Ok(OptionValue::Boolean(true)),
            "false" | "no" | "off" | "0" => Ok(OptionValue::Boolean(false)),
            _ => Err(format!("option `{key}` expects a boolean, got `{value}`")),
        },
        OptionKind::Choice(choices) => {
            let v = value.trim();
            if choices.iter().any(|c| c == v) {
                Ok(OptionValue::String(v.to_string()))
            } else {
                Err(format!(
                    "option `{key}` must be one of {}, got `{value}`",
                    choices.join(", ")
                ))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Validated options, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DirectiveOptions {
    entries: Vec<(String, OptionValue)>,
}

/// Roles carry the same key-value shape as directives.
pub type RoleOptions = DirectiveOptions;

impl DirectiveOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_str)
    }

    pub fn set(&mut self, key: &str, value: OptionValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split `key=value key2="quoted value" rest` into options and the
/// leftover argument words, which are joined by single spaces.
pub fn split_options(text: &str) -> (Vec<(String, String)>, Option<String>) {
    let mut options = Vec::new();
    let mut argument = String::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let word_start = i;
        let key_end = scan_key(bytes, i);
        if key_end > i && bytes.get(key_end) == Some(&b'=') {
            let key = text[i..key_end].to_string();
            i = key_end + 1;
            let value = match bytes.get(i) {
                Some(&q @ (b'"' | b'\'')) => {
                    let close = bytes[i + 1..].iter().position(|&b| b == q);
                    match close {
                        Some(rel) => {
                            let v = text[i + 1..i + 1 + rel].to_string();
                            i += rel + 2;
                            v
                        }
                        None => {
                            let v = text[i + 1..].to_string();
                            i = bytes.len();
                            v
                        }
                    }
                }
                _ => {
                    let start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    text[start..i].to_string()
                }
            };
            options.push((key, value));
        } else {
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if !argument.is_empty() {
                argument.push(' ');
            }
            argument.push_str(&text[word_start..i]);
        }
    }
    let argument = if argument.is_empty() {
        None
    } else {
        Some(argument)
    };
    (options, argument)
}

fn scan_key(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'-' | b'_')) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn open_contract_keeps_strings() {
        let opts = OptionContract::new()
            .validate(&raw(&[("a", "1"), ("b", "x")]))
            .unwrap();
        assert_eq!(opts.get_str("a"), Some("1"));
        assert_eq!(opts.len(), 2);
    }

    #[test]
    fn typed_conversion_errors() {
        let contract = OptionContract::new()
            .optional("n", OptionKind::Integer)
            .optional("flag", OptionKind::Boolean)
            .optional("size", OptionKind::Choice(vec!["sm".into(), "lg".into()]));
        assert!(contract.validate(&raw(&[("n", "x")])).is_err());
        assert!(contract.validate(&raw(&[("flag", "maybe")])).is_err());
        assert!(contract.validate(&raw(&[("size", "xl")])).is_err());
        let ok = contract
            .validate(&raw(&[("flag", ""), ("size", "lg"), ("n", "-4")]))
            .unwrap();
        assert_eq!(ok.get("flag").and_then(OptionValue::as_bool), Some(true));
        assert_eq!(ok.get("n").and_then(OptionValue::as_int), Some(-4));
    }

    #[test]
    fn missing_required() {
        let contract = OptionContract::new().required("title", OptionKind::String);
        let err = contract.validate(&[]).unwrap_err();
        assert_eq!(err, "missing required option `title`");
    }

    #[test]
    fn later_duplicates_win() {
        let opts = OptionContract::new()
            .validate(&raw(&[("k", "1"), ("k", "2")]))
            .unwrap();
        assert_eq!(opts.get_str("k"), Some("2"));
        assert_eq!(opts.len(), 1);
    }

    #[test]
    fn split_fence_options() {
        let (opts, arg) = split_options(r#"Heads up class=wide title="A title" x='y z'"#);
        assert_eq!(arg.as_deref(), Some("Heads up"));
        assert_eq!(
            opts,
            raw(&[("class", "wide"), ("title", "A title"), ("x", "y z")])
        );
    }

    #[test]
    fn split_handles_unterminated_quote() {
        let (opts, arg) = split_options("k=\"open");
        assert_eq!(opts, raw(&[("k", "open")]));
        assert_eq!(arg, None);
    }
}
