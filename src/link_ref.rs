//! Link reference definitions (CommonMark).

use rustc_hash::FxHashMap;

/// A link reference definition (destination + optional title), with
/// escapes and entities already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRefDef {
    pub destination: String,
    pub title: Option<String>,
}

/// Store of link reference definitions, keyed by normalized label.
#[derive(Debug, Default, Clone)]
pub struct LinkRefStore {
    defs: Vec<LinkRefDef>,
    by_label: FxHashMap<String, usize>,
}

impl LinkRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition if the label is new. First definition wins.
    pub fn insert(&mut self, label: String, def: LinkRefDef) {
        if label.is_empty() || self.by_label.contains_key(&label) {
            return;
        }
        let idx = self.defs.len();
        self.defs.push(def);
        self.by_label.insert(label, idx);
    }

    /// Look up a definition by raw (unnormalized) label text.
    pub fn lookup(&self, raw_label: &str) -> Option<&LinkRefDef> {
        if self.defs.is_empty() {
            return None;
        }
        self.get(&normalize_label(raw_label))
    }

    /// Look up a definition by an already normalized label.
    pub fn get(&self, label: &str) -> Option<&LinkRefDef> {
        self.by_label.get(label).map(|&idx| &self.defs[idx])
    }

    /// Copy every definition of `other` whose label is not yet defined here.
    pub fn extend_from(&mut self, other: &LinkRefStore) {
        for (label, &idx) in &other.by_label {
            self.insert(label.clone(), other.defs[idx].clone());
        }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Normalize a link label: case-fold, collapse internal whitespace to
/// single spaces, and trim.
///
/// Escapes and entities are left alone: `[\*]` and `[*]` are different
/// labels.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_was_space = true;

    for ch in label.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }

        last_was_space = false;
        if ch == 'ß' || ch == 'ẞ' {
            out.push_str("ss");
        } else {
            out.extend(ch.to_lowercase());
        }
    }

    if out.ends_with(' ') {
        out.pop();
    }
    out
}
