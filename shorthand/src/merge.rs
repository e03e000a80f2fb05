//! Merging fragments into the accumulating filter document.

use serde::{Deserialize, Serialize};

use crate::value::{Document, Value};

/// How a fragment's top-level keys are merged into a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// `a.b.c` keys expand into nested mappings.
    #[default]
    Dotted,
    /// Keys are kept verbatim, dots included.
    Literal,
}

impl MergeStrategy {
    /// Merge `fragment` into `document`, returning the same document.
    pub fn merge(self, document: &mut Document, fragment: Document) -> &mut Document {
        match self {
            MergeStrategy::Dotted => {
                for (key, value) in fragment {
                    set_path(document, &key, value);
                }
            }
            MergeStrategy::Literal => deep_merge(document, fragment),
        }
        document
    }
}

/// Assign `value` at the dotted `path`, creating intermediate mappings.
///
/// Intermediates that exist but are not mappings are replaced.
fn set_path(document: &mut Document, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or_default();

    let mut target = document;
    for segment in segments {
        let slot = target
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Document::new()));
        if slot.as_object().is_none() {
            *slot = Value::Object(Document::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        target = next;
    }

    match target.get_mut(leaf) {
        Some(slot) => merge_value(slot, value),
        None => {
            target.insert(leaf.to_string(), value);
        }
    }
}

/// Recursively merge `source` into `target`; the last write wins per leaf.
pub fn deep_merge(target: &mut Document, source: Document) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(slot) => merge_value(slot, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

fn merge_value(slot: &mut Value, value: Value) {
    match (slot, value) {
        (Value::Object(existing), Value::Object(incoming)) => deep_merge(existing, incoming),
        (slot, value) => *slot = value,
    }
}
