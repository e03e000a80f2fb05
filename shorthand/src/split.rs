//! Quote-aware splitting of delimited shorthand text.
//!
//! `a=1,b='x, y'` splits into `a=1` and `b=x, y`: single quotes protect
//! separators, and the decorative quotes around an assigned value are
//! dropped once the field has been cut out.

use crate::value::{guess_type, Value};

/// Separator between clauses of a composite shorthand string.
pub const DEFAULT_CLAUSE_SEPARATOR: char = ',';

/// Separator between elements of an array operand (`foo[]=a|b`).
pub const DEFAULT_ARRAY_SEPARATOR: char = '|';

const QUOTE: char = '\'';
const ESCAPE: char = '\\';

/// Split `input` on `separator`, honoring single-quoted sections.
///
/// Every field is trimmed, and a trailing `key='value'` is collapsed to
/// `key=value`. Empty input yields a single empty field.
pub fn split_fields(input: &str, separator: char) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut fields = Vec::new();
    let mut current = String::new();

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];

        if ch == ESCAPE {
            if let Some(&next) = chars.get(i + 1) {
                if is_escapable(next, separator) {
                    current.push(next);
                    i += 2;
                    continue;
                }
            }
            current.push(ch);
            i += 1;
            continue;
        }

        if ch == QUOTE && opens_quote(&current) {
            if let Some(close) = find_closing_quote(&chars, i + 1, separator) {
                // A quote that starts the field is a delimiter; elsewhere the
                // quotes stay so the assignment collapse can see them.
                let leading = current.trim().is_empty();
                if !leading {
                    current.push(QUOTE);
                }
                push_unescaped(&mut current, &chars[i + 1..close], separator);
                if !leading {
                    current.push(QUOTE);
                }
                i = close + 1;
                continue;
            }
        }

        if ch == separator {
            fields.push(finish_field(&current));
            current.clear();
        } else {
            current.push(ch);
        }
        i += 1;
    }

    fields.push(finish_field(&current));
    fields
}

/// Split an array operand and guess the type of each element.
pub fn parse_array(input: &str, separator: char) -> Vec<Value> {
    split_fields(input, separator)
        .iter()
        .map(|field| guess_type(field))
        .collect()
}

fn is_escapable(c: char, separator: char) -> bool {
    c == QUOTE || c == ESCAPE || c == separator
}

/// A quote opens a section at the start of a field or after punctuation
/// (typically the `=` of an assignment), never inside a word like `O'Brien`.
fn opens_quote(current: &str) -> bool {
    current
        .trim_end()
        .chars()
        .last()
        .map_or(true, |prev| !prev.is_alphanumeric())
}

/// Find the quote closing a section that starts at `start`.
///
/// Only a quote followed by optional whitespace and then the separator
/// (or the end of input) closes the section.
fn find_closing_quote(chars: &[char], start: usize, separator: char) -> Option<usize> {
    let mut j = start;
    while j < chars.len() {
        match chars[j] {
            ESCAPE if chars.get(j + 1).is_some_and(|&c| is_escapable(c, separator)) => {
                j += 2;
                continue;
            }
            QUOTE => {
                let rest = chars[j + 1..].iter().find(|c| !c.is_whitespace());
                if rest.map_or(true, |&c| c == separator) {
                    return Some(j);
                }
            }
            _ => {}
        }
        j += 1;
    }
    None
}

fn push_unescaped(out: &mut String, quoted: &[char], separator: char) {
    let mut k = 0;
    while k < quoted.len() {
        let c = quoted[k];
        if c == ESCAPE {
            if let Some(&next) = quoted.get(k + 1) {
                if is_escapable(next, separator) {
                    out.push(next);
                    k += 2;
                    continue;
                }
            }
        }
        out.push(c);
        k += 1;
    }
}

fn finish_field(raw: &str) -> String {
    collapse_quoted_assignment(raw.trim())
}

/// `key='value'` -> `key=value`, matching on the last `='`.
fn collapse_quoted_assignment(field: &str) -> String {
    if let Some(body) = field.strip_suffix(QUOTE) {
        if let Some(pos) = body.rfind("='") {
            return format!("{}={}", &body[..pos], &body[pos + 2..]);
        }
    }
    field.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        empty = { "", &[""] },
        single = { "foo=1", &["foo=1"] },
        two = { "foo=1,bar=2", &["foo=1", "bar=2"] },
        trims_fields = { " foo = 1 , bar ", &["foo = 1", "bar"] },
        trailing_separator = { "foo,", &["foo", ""] },
        leading_quoted_field = { "'Hello, World',x", &["Hello, World", "x"] },
        quoted_assignment = { "greeting='Hello, World',x=1", &["greeting=Hello, World", "x=1"] },
        inner_apostrophe = { "quz='Hello 'World',flarp=123", &["quz=Hello 'World", "flarp=123"] },
        escaped_apostrophe = {
            r"quz='Hello \'World',flarp=123",
            &["quz=Hello 'World", "flarp=123"]
        },
        word_apostrophe = { "name=O'Brien,age=5", &["name=O'Brien", "age=5"] },
        unterminated_quote = { "a='oops,b=2", &["a='oops", "b=2"] },
        escaped_separator = { r"a=1\,5,b=2", &["a=1,5", "b=2"] },
        regex_backslash_kept = { r"a~=\d+,b", &[r"a~=\d+", "b"] },
        pipe_is_literal = { "a[]=x|y,b", &["a[]=x|y", "b"] },
    )]
    fn test_split_fields_comma(input: &str, expected: &[&str]) {
        assert_eq!(split_fields(input, DEFAULT_CLAUSE_SEPARATOR), expected);
    }

    #[test]
    fn test_split_fields_pipe() {
        assert_eq!(
            split_fields("1|2|3 or three|four maybe five", DEFAULT_ARRAY_SEPARATOR),
            vec!["1", "2", "3 or three", "four maybe five"]
        );
        assert_eq!(
            split_fields("'a|b'|c", DEFAULT_ARRAY_SEPARATOR),
            vec!["a|b", "c"]
        );
    }

    #[test]
    fn test_parse_array_guesses_each_element() {
        assert_eq!(
            parse_array("1|2|3 or three|true", DEFAULT_ARRAY_SEPARATOR),
            vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::String("3 or three".to_string()),
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn test_parse_array_single_element_is_still_a_list() {
        assert_eq!(
            parse_array("123", DEFAULT_ARRAY_SEPARATOR),
            vec![Value::Number(123.0)]
        );
    }

    #[test]
    fn test_collapse_quoted_assignment() {
        assert_eq!(collapse_quoted_assignment("a='b'"), "a=b");
        assert_eq!(collapse_quoted_assignment("a!='b'"), "a!=b");
        assert_eq!(collapse_quoted_assignment("x='"), "x='");
        assert_eq!(collapse_quoted_assignment("plain"), "plain");
    }
}
