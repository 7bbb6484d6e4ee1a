//! Footnote bookkeeping.
//!
//! Labels are declared up front from the block events so a reference can
//! resolve to a definition that appears later in the document. Footnotes
//! are numbered in order of first reference; definitions that are never
//! referenced are dropped.

use crate::ast::{Block, FootnoteDefinition};
use crate::link_ref::normalize_label;
use crate::location::SourceLocation;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub struct FootnoteStore {
    declared: FxHashSet<String>,
    /// Normalized label -> (index, references so far).
    numbers: FxHashMap<String, (u32, u32)>,
    defs: FxHashMap<String, FootnoteDefinition>,
}

impl FootnoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `label` as defined somewhere in the document.
    pub fn declare(&mut self, label: &str) {
        let key = normalize_label(label);
        if !key.is_empty() {
            self.declared.insert(key);
        }
    }

    pub fn is_defined(&self, label: &str) -> bool {
        !self.declared.is_empty() && self.declared.contains(&normalize_label(label))
    }

    /// Record a reference to `label`. Returns the footnote number and
    /// which reference this is, or `None` for an undefined label.
    pub fn reference(&mut self, label: &str) -> Option<(u32, u32)> {
        let key = normalize_label(label);
        if !self.declared.contains(&key) {
            return None;
        }
        let next = self.numbers.len() as u32 + 1;
        let entry = self.numbers.entry(key).or_insert((next, 0));
        entry.1 += 1;
        Some(*entry)
    }

    /// Store a built definition. First definition wins.
    pub fn insert(&mut self, label: &str, children: Vec<Block>, location: SourceLocation) {
        let key = normalize_label(label);
        if key.is_empty() || self.defs.contains_key(&key) {
            return;
        }
        self.defs.insert(
            key,
            FootnoteDefinition {
                label: label.to_string(),
                index: 0,
                references: 0,
                children,
                location,
            },
        );
    }

    /// Referenced definitions, ordered by number.
    pub fn finish(mut self) -> Vec<FootnoteDefinition> {
        let mut out: Vec<FootnoteDefinition> = self
            .numbers
            .into_iter()
            .filter_map(|(key, (index, references))| {
                let mut def = self.defs.remove(&key)?;
                def.index = index;
                def.references = references;
                Some(def)
            })
            .collect();
        out.sort_by_key(|def| def.index);
        out
    }
}
