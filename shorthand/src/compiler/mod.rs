//! Shorthand filter compiler.
//!
//! # Syntax Overview
//!
//! A shorthand string is a comma-separated list of clauses:
//!
//! - **Equality**: `foo=bar`, `foo==bar`, `foo!=bar`
//! - **Null / undefined**: `foo===null`, `foo===undefined`
//! - **Regex**: `foo~=bar`, `foo/=bar`, `foo^=prefix`, `foo$=suffix`
//! - **Membership**: `foo[]=a|b|c`, `foo![]=a|b|c`
//! - **Arrays**: `foo#=3` (size), `foo#>=3` / `foo#>2` (index exists)
//! - **Numeric**: `foo>5`, `foo>=5`, `foo<5`, `foo<=5`
//! - **Existence**: `foo?`, `foo!?`
//! - **Booleans**: `foo`, `!foo`
//!
//! Object inputs and object-literal strings (`{foo: 1}`) are merged as-is,
//! with dotted keys expanded into nested mappings.

mod clause;
mod operators;

use regex::Regex;

use crate::config::{Options, Settings};
use crate::decode::decode_object;
use crate::split::split_fields;
use crate::value::{Document, Value};
use crate::{Error, Result};

pub use clause::{compile_clause, Fragment};
pub use operators::{
    BuildFn, Builder, OperatorDefinition, OperatorKind, OperatorTable, Operands, PatternShape,
};

/// One compile argument.
#[derive(Debug, Clone)]
pub enum Input {
    /// A mapping merged directly.
    Object(Document),
    /// Shorthand clauses or an object literal.
    Text(String),
    /// A list of inputs, flattened one level.
    List(Vec<Input>),
    /// Numbers, booleans and null carry no filter and are ignored.
    Scalar(Value),
    /// Settings overlay; only accepted as the trailing input.
    Options(Options),
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<Document> for Input {
    fn from(doc: Document) -> Self {
        Input::Object(doc)
    }
}

impl From<Options> for Input {
    fn from(options: Options) -> Self {
        Input::Options(options)
    }
}

impl From<Vec<Input>> for Input {
    fn from(items: Vec<Input>) -> Self {
        Input::List(items)
    }
}

impl From<serde_json::Value> for Input {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(map) => Input::Object(Document::from(map)),
            serde_json::Value::String(s) => Input::Text(s),
            serde_json::Value::Array(items) => {
                Input::List(items.into_iter().map(Input::from).collect())
            }
            scalar => Input::Scalar(Value::from(scalar)),
        }
    }
}

/// A compiler bound to resolved settings.
#[derive(Debug, Clone)]
pub struct Compiler {
    settings: Settings,
    object_like: Regex,
    values_only: bool,
}

impl Compiler {
    /// Create a compiler, validating separators and every operator pattern.
    pub fn new(settings: Settings) -> Result<Self> {
        Self::build(settings, false)
    }

    /// Create a value-only compiler: just `=` and bare-key booleans.
    pub fn values(settings: Settings) -> Result<Self> {
        Self::build(settings, true)
    }

    fn build(mut settings: Settings, values_only: bool) -> Result<Self> {
        settings.validate()?;
        if values_only {
            settings.operator_table = settings.operator_table.values_only();
        }
        settings.operator_table.warm()?;

        let object_like = Regex::new(&settings.object_pattern).map_err(|e| {
            Error::Config(format!(
                "Invalid object pattern {:?}: {}",
                settings.object_pattern, e
            ))
        })?;

        Ok(Self {
            settings,
            object_like,
            values_only,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether `text` is decoded as an object literal rather than split.
    pub fn is_object_like(&self, text: &str) -> bool {
        self.object_like.is_match(text)
    }

    /// Compile inputs into a fresh document.
    ///
    /// A trailing [`Input::Options`] after at least one other input is
    /// applied on top of this compiler's settings for this call only.
    pub fn compile<I>(&self, inputs: I) -> Result<Document>
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        let mut inputs: Vec<Input> = inputs.into_iter().map(Into::into).collect();

        if inputs.len() > 1 && matches!(inputs.last(), Some(Input::Options(_))) {
            if let Some(Input::Options(options)) = inputs.pop() {
                let settings = self.settings.clone().with_options(&options);
                let overlaid = Self::build(settings, self.values_only)?;
                return overlaid.run(inputs);
            }
        }

        self.run(inputs)
    }

    /// Compile a single shorthand or object-literal string.
    pub fn compile_str(&self, text: &str) -> Result<Document> {
        self.run(vec![Input::from(text)])
    }

    fn run(&self, inputs: Vec<Input>) -> Result<Document> {
        let mut document = Document::new();

        for input in flatten(inputs) {
            let outcome = input.and_then(|input| self.apply(&mut document, input));
            if let Err(e) = outcome {
                if self.settings.throw_on_error || !e.is_suppressible() {
                    return Err(e);
                }
                tracing::debug!(error = %e, "skipping input");
            }
        }

        Ok(document)
    }

    fn apply(&self, document: &mut Document, input: Input) -> Result<()> {
        let settings = &self.settings;

        match input {
            Input::Object(object) => {
                settings.merge.merge(document, object);
            }
            Input::Text(text) if self.is_object_like(&text) => {
                let decoded = decode_object(&text, settings.relaxed_decoder)?;
                settings
                    .merge_json
                    .unwrap_or(settings.merge)
                    .merge(document, decoded);
            }
            Input::Text(text) => {
                for clause in split_fields(&text, settings.clause_separator) {
                    if clause.is_empty() {
                        continue;
                    }
                    let fragment = compile_clause(&clause, &settings.operator_table, settings)?;
                    fragment
                        .merge
                        .or(settings.merge_clauses)
                        .unwrap_or(settings.merge)
                        .merge(document, fragment.document);
                }
            }
            Input::Scalar(value) => {
                tracing::trace!(?value, "ignoring scalar input");
            }
            Input::List(_) => {
                return Err(Error::UnsupportedInputShape(
                    "nested lists are not supported".to_string(),
                ));
            }
            Input::Options(_) => {
                return Err(Error::UnsupportedInputShape(
                    "options are only accepted as the trailing input".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Flatten top-level lists one level; deeper nesting is reported per item.
fn flatten(inputs: Vec<Input>) -> Vec<Result<Input>> {
    let mut flat = Vec::with_capacity(inputs.len());
    for input in inputs {
        match input {
            Input::List(items) => {
                for item in items {
                    match item {
                        Input::List(_) => flat.push(Err(Error::UnsupportedInputShape(
                            "list nested inside a list".to_string(),
                        ))),
                        other => flat.push(Ok(other)),
                    }
                }
            }
            other => flat.push(Ok(other)),
        }
    }
    flat
}

/// Compile inputs with default settings.
pub fn compile<I>(inputs: I) -> Result<Document>
where
    I: IntoIterator,
    I::Item: Into<Input>,
{
    Compiler::new(Settings::default())?.compile(inputs)
}

/// Compile inputs into plain values, using only `=` and bare-key booleans.
pub fn compile_values<I>(inputs: I) -> Result<Document>
where
    I: IntoIterator,
    I::Item: Into<Input>,
{
    Compiler::values(Settings::default())?.compile(inputs)
}
