//! Dynamic values and the filter document they are collected into.

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Largest integer an `f64` holds exactly; integral numbers up to this
/// size serialize as JSON integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A value inside a filter document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicitly undefined. Distinct from `Null` and from a missing key.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Document),
}

/// An insertion-ordered mapping from key paths to values.
///
/// Keys are plain field names, dotted paths, or operator symbols
/// (`$gt`, `$in`, ...) inside operator-sub-documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document(IndexMap<String, Value>);

/// Guess the natural type of a scalar from its text.
///
/// Finite decimal numbers become `Number`, `true`/`false` become `Bool`,
/// everything else is returned as the original `String`.
pub fn guess_type(text: &str) -> Value {
    if let Some(number) = parse_number(text) {
        return Value::Number(number);
    }
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}

/// Parse text as a finite decimal number, ignoring surrounding whitespace.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number the way it appears in a key path (`3`, not `3.0`).
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Value {
    /// Apply [`guess_type`] to string values; other variants are already typed.
    pub fn guessed(self) -> Value {
        match self {
            Value::String(s) => guess_type(&s),
            other => other,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Value::Object(doc) => Some(doc),
            _ => None,
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Build a single-entry document.
    pub fn with(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut doc = Self::new();
        doc.insert(key.into(), value.into());
        doc
    }

    /// Resolve a dotted path through nested mappings.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether this mapping is an operator-sub-document (`{$gt: 5}`).
    pub fn is_operator_document(&self) -> bool {
        self.keys().any(|k| k.starts_with('$'))
    }

    /// Re-flatten nested mappings into dotted keys.
    ///
    /// Recursion stops at operator-sub-documents and empty mappings, which
    /// are kept as leaf values.
    pub fn flatten(&self) -> Document {
        let mut flat = Document::new();
        flatten_into(&mut flat, None, self);
        flat
    }
}

fn flatten_into(flat: &mut Document, prefix: Option<&str>, doc: &Document) {
    for (key, value) in doc.iter() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) if !nested.is_empty() && !nested.is_operator_document() => {
                flatten_into(flat, Some(&path), nested);
            }
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}

impl Deref for Document {
    type Target = IndexMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<IndexMap<String, Value>> for Document {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

// Conversions

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(Document::from(map)),
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Document {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

// Serialization mirrors JSON.stringify: undefined object entries are
// dropped, undefined array elements become null.

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(doc) => doc.serialize(serializer),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let defined = self.values().filter(|v| !v.is_undefined()).count();
        let mut map = serializer.serialize_map(Some(defined))?;
        for (key, value) in self.iter().filter(|(_, v)| !v.is_undefined()) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yare::parameterized;

    #[parameterized(
        integer = { "123", Value::Number(123.0) },
        negative = { "-4", Value::Number(-4.0) },
        decimal = { "1.5", Value::Number(1.5) },
        exponent = { "1e3", Value::Number(1000.0) },
        leading_dot = { ".5", Value::Number(0.5) },
        padded = { " 42 ", Value::Number(42.0) },
        bool_true = { "true", Value::Bool(true) },
        bool_false = { "false", Value::Bool(false) },
        capitalized_bool = { "True", Value::String("True".to_string()) },
        infinity = { "inf", Value::String("inf".to_string()) },
        nan = { "NaN", Value::String("NaN".to_string()) },
        empty = { "", Value::String(String::new()) },
        text = { "Hello World", Value::String("Hello World".to_string()) },
        number_prefix = { "12px", Value::String("12px".to_string()) },
    )]
    fn test_guess_type(input: &str, expected: Value) {
        assert_eq!(guess_type(input), expected);
    }

    #[test]
    fn test_guessed_leaves_typed_values() {
        assert_eq!(Value::Bool(false).guessed(), Value::Bool(false));
        assert_eq!(Value::Null.guessed(), Value::Null);
        assert_eq!(Value::from("7").guessed(), Value::Number(7.0));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(1.25), "1.25");
    }

    #[test]
    fn test_serialize_integral_numbers_as_integers() {
        let doc = Document::with("n", 123);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"n":123}"#);

        let doc = Document::with("n", 1.5);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"n":1.5}"#);
    }

    #[test]
    fn test_serialize_undefined() {
        let mut doc = Document::new();
        doc.insert("gone".to_string(), Value::Undefined);
        doc.insert("kept".to_string(), Value::Null);
        doc.insert(
            "list".to_string(),
            Value::Array(vec![Value::Undefined, Value::from(1)]),
        );

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"kept": null, "list": [null, 1]})
        );
    }

    #[test]
    fn test_from_json_preserves_order() {
        let value = Value::from(json!({"z": 1, "a": {"b": [true, "x"]}}));
        let doc = value.as_object().unwrap();
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(
            doc.get_path("a.b"),
            Some(&Value::Array(vec![Value::Bool(true), Value::from("x")]))
        );
    }

    #[test]
    fn test_get_path_missing() {
        let doc = Document::with("a", Document::with("b", 1));
        assert_eq!(doc.get_path("a.b"), Some(&Value::Number(1.0)));
        assert_eq!(doc.get_path("a.c"), None);
        assert_eq!(doc.get_path("a.b.c"), None);
    }

    #[test]
    fn test_flatten_stops_at_operator_documents() {
        let nested = Document::from_iter([
            ("a", Value::from(Document::with("b", Document::with("c", 1)))),
            ("n", Value::from(Document::with("$gt", 5))),
        ]);
        let flat = nested.flatten();

        assert_eq!(flat.get("a.b.c"), Some(&Value::Number(1.0)));
        assert_eq!(
            flat.get("n"),
            Some(&Value::Object(Document::with("$gt", 5)))
        );
        assert_eq!(flat.len(), 2);
    }
}
