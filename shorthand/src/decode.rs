//! Decoding of object-literal inputs.
//!
//! The relaxed decoder accepts JSON5 (`{foo: 'bar', trailing: 1,}`), the
//! strict one accepts plain JSON only. Either way the result must be a
//! mapping.

use crate::value::{Document, Value};
use crate::{Error, Result};

/// Default "looks like an object literal" predicate.
pub const DEFAULT_OBJECT_PATTERN: &str = r"(?s)^\s*\{.*\}\s*$";

/// Decode `text` into a document using the relaxed or strict decoder.
pub fn decode_object(text: &str, relaxed: bool) -> Result<Document> {
    let decoded: serde_json::Value = if relaxed {
        json5::from_str(text).map_err(|e| decode_error(text, e))?
    } else {
        serde_json::from_str(text).map_err(|e| decode_error(text, e))?
    };

    match Value::from(decoded) {
        Value::Object(doc) => Ok(doc),
        _ => Err(decode_error(text, "expected an object literal")),
    }
}

fn decode_error(text: &str, message: impl std::fmt::Display) -> Error {
    Error::Decode {
        input: text.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strict_json() {
        let doc = decode_object(r#"{"foo":"Foo!","n":123}"#, false).unwrap();
        assert_eq!(doc.get("foo"), Some(&Value::from("Foo!")));
        assert_eq!(doc.get("n"), Some(&Value::Number(123.0)));
    }

    #[test]
    fn test_decode_relaxed_unquoted_keys() {
        let doc = decode_object(r#"{foo:"Foo!", bar: 'single', baz: 1,}"#, true).unwrap();
        assert_eq!(doc.get("foo"), Some(&Value::from("Foo!")));
        assert_eq!(doc.get("bar"), Some(&Value::from("single")));
        assert_eq!(doc.get("baz"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_decode_strict_rejects_relaxed_syntax() {
        let err = decode_object(r#"{foo:"Foo!"}"#, false).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_decode_malformed() {
        let err = decode_object("{foo:", true).unwrap_err();
        match err {
            Error::Decode { input, .. } => assert_eq!(input, "{foo:"),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_non_object() {
        let err = decode_object("[1, 2]", true).unwrap_err();
        assert!(err.to_string().contains("expected an object literal"));
    }

    #[test]
    fn test_default_object_pattern() {
        let re = regex::Regex::new(DEFAULT_OBJECT_PATTERN).unwrap();
        assert!(re.is_match(r#"{"a":1}"#));
        assert!(re.is_match(" {a: 1} "));
        assert!(re.is_match("{\n  a: 1\n}"));
        assert!(!re.is_match("a=1"));
        assert!(!re.is_match("{a=1"));
    }
}
