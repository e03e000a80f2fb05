//! The ordered operator table.
//!
//! Definitions are tried in order and the first full match wins, so the
//! order encodes precedence: `!=` before `=`, `===null` before `==`, and
//! the bare-key catch-all last.

use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::{Captures, Regex};

use crate::config::Settings;
use crate::merge::MergeStrategy;
use crate::split::parse_array;
use crate::value::{format_number, parse_number, Document, Value};
use crate::{escape_pattern, Error, Result};

/// Characters a bare key (`foo`, `!foo`) may not contain.
const BARE_KEY: &str = r"[^\s=<>!?~^\[\]|#{}]+";

static DEFAULT_TABLE: LazyLock<OperatorTable> = LazyLock::new(|| {
    use OperatorKind::*;
    OperatorTable::new(vec![
        OperatorDefinition::infix("!=", NotEqual),
        OperatorDefinition::suffix("===null", IsNull),
        OperatorDefinition::suffix("===undefined", IsUndefined),
        OperatorDefinition::infix("==", Equal),
        OperatorDefinition::infix("~=", RegexContains),
        OperatorDefinition::infix("/=", RegexContains),
        OperatorDefinition::infix("^=", RegexPrefix),
        OperatorDefinition::infix("$=", RegexSuffix),
        OperatorDefinition::infix("![]=", NotIn),
        OperatorDefinition::infix("[]=", In),
        OperatorDefinition::infix("#=", Size),
        OperatorDefinition::infix("#>=", IndexExists).merge_with(MergeStrategy::Literal),
        OperatorDefinition::infix("#>", IndexExistsAfter).merge_with(MergeStrategy::Literal),
        OperatorDefinition::infix(">=", Gte),
        OperatorDefinition::infix("<=", Lte),
        OperatorDefinition::infix(">", Gt),
        OperatorDefinition::infix("<", Lt),
        OperatorDefinition::infix("=", Equal).in_values_mode(),
        OperatorDefinition::suffix("!?", NotExists),
        OperatorDefinition::suffix("?", Exists),
        OperatorDefinition::with_pattern("false", format!("^!(?<a>{})$", BARE_KEY), False)
            .in_values_mode(),
        OperatorDefinition::with_pattern("true", format!("^(?<a>{})$", BARE_KEY), True)
            .in_values_mode(),
    ])
});

/// Built-in fragment builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// `{a: {$ne: v}}`
    NotEqual,
    /// `{a: null}`
    IsNull,
    /// `{a: undefined}`
    IsUndefined,
    /// `{a: v}`
    Equal,
    /// `{a: {$regex: raw}}`
    RegexContains,
    /// `{a: {$regex: "^" + raw}}`
    RegexPrefix,
    /// `{a: {$regex: raw + "$"}}`
    RegexSuffix,
    /// `{a: {$nin: [..]}}`
    NotIn,
    /// `{a: {$in: [..]}}`
    In,
    /// `{a: {$size: v}}`
    Size,
    /// `{"a.N": {$exists: true}}`
    IndexExists,
    /// `{"a.(N+1)": {$exists: true}}`
    IndexExistsAfter,
    Gte,
    Lte,
    Gt,
    Lt,
    /// `{a: {$exists: false}}`
    NotExists,
    /// `{a: {$exists: true}}`
    Exists,
    /// `{a: false}`
    False,
    /// `{a: true}`
    True,
}

/// Signature of a user-supplied fragment builder.
pub type BuildFn = fn(&Operands<'_>, &Settings) -> Result<Document>;

/// What a definition runs once its matcher hits.
#[derive(Clone, Copy)]
pub enum Builder {
    Builtin(OperatorKind),
    Custom(BuildFn),
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builder::Builtin(kind) => write!(f, "Builtin({:?})", kind),
            Builder::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// How a definition's matcher is derived from its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternShape {
    /// `a <id> b`
    Infix,
    /// `a <id>`
    Suffix,
    /// Caller-supplied regex with an `a` group and optional `assigner`/`b` groups.
    Custom(String),
}

/// One entry of the operator table.
#[derive(Debug, Clone)]
pub struct OperatorDefinition {
    pub id: String,
    pub shape: PatternShape,
    pub builder: Builder,
    /// Overrides the configured merge strategy for this operator's fragments.
    pub merge: Option<MergeStrategy>,
    /// Whether value-only compilation keeps this definition.
    pub values: bool,
    matcher: OnceLock<std::result::Result<Regex, regex::Error>>,
}

/// Operands extracted from a matched clause.
#[derive(Debug, Clone)]
pub struct Operands<'a> {
    /// The full clause text.
    pub clause: &'a str,
    /// Left-hand key path.
    pub left: &'a str,
    /// The operator token as written.
    pub token: &'a str,
    /// Right-hand operand text, if the operator takes one.
    pub raw: Option<&'a str>,
    /// Right-hand operand after optional type guessing.
    pub value: Option<Value>,
}

impl OperatorDefinition {
    fn build(id: impl Into<String>, shape: PatternShape, builder: Builder) -> Self {
        Self {
            id: id.into(),
            shape,
            builder,
            merge: None,
            values: false,
            matcher: OnceLock::new(),
        }
    }

    /// `a <id> b` with a built-in builder.
    pub fn infix(id: impl Into<String>, kind: OperatorKind) -> Self {
        Self::build(id, PatternShape::Infix, Builder::Builtin(kind))
    }

    /// `a <id>` with a built-in builder.
    pub fn suffix(id: impl Into<String>, kind: OperatorKind) -> Self {
        Self::build(id, PatternShape::Suffix, Builder::Builtin(kind))
    }

    /// A custom regex with a built-in builder.
    pub fn with_pattern(
        id: impl Into<String>,
        pattern: impl Into<String>,
        kind: OperatorKind,
    ) -> Self {
        Self::build(
            id,
            PatternShape::Custom(pattern.into()),
            Builder::Builtin(kind),
        )
    }

    /// A definition with a user-supplied builder.
    pub fn custom(id: impl Into<String>, shape: PatternShape, build: BuildFn) -> Self {
        Self::build(id, shape, Builder::Custom(build))
    }

    pub fn merge_with(mut self, strategy: MergeStrategy) -> Self {
        self.merge = Some(strategy);
        self
    }

    pub fn in_values_mode(mut self) -> Self {
        self.values = true;
        self
    }

    /// The regex source this definition matches with.
    pub fn pattern_source(&self) -> String {
        match &self.shape {
            PatternShape::Infix => format!(
                r"^(?<a>.+?)\s*(?<assigner>{})\s*(?<b>.+)$",
                escape_pattern(&self.id)
            ),
            PatternShape::Suffix => {
                format!(r"^(?<a>.+?)\s*(?<assigner>{})$", escape_pattern(&self.id))
            }
            PatternShape::Custom(pattern) => pattern.clone(),
        }
    }

    /// The compiled matcher, built on first use.
    pub fn matcher(&self) -> Result<&Regex> {
        self.matcher
            .get_or_init(|| Regex::new(&self.pattern_source()))
            .as_ref()
            .map_err(|e| Error::Pattern {
                id: self.id.clone(),
                source: e.clone(),
            })
    }

    /// Match the whole clause against this definition.
    pub fn captures<'c>(&self, clause: &'c str) -> Result<Option<Captures<'c>>> {
        Ok(self.matcher()?.captures(clause))
    }

    /// Run the builder for already-extracted operands.
    pub fn build_fragment(&self, operands: &Operands<'_>, settings: &Settings) -> Result<Document> {
        match self.builder {
            Builder::Builtin(kind) => build_builtin(kind, operands, settings),
            Builder::Custom(build) => build(operands, settings),
        }
    }
}

/// Ordered, immutable list of operator definitions.
///
/// Clones share definitions, so matchers compiled through one clone are
/// reused by all of them.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    definitions: Arc<[OperatorDefinition]>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

impl OperatorTable {
    pub fn new(definitions: Vec<OperatorDefinition>) -> Self {
        Self {
            definitions: definitions.into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// First definition with the given id.
    pub fn get(&self, id: &str) -> Option<&OperatorDefinition> {
        self.iter().find(|d| d.id == id)
    }

    /// Only the definitions used by value-only compilation.
    pub fn values_only(&self) -> Self {
        Self::new(self.iter().filter(|d| d.values).cloned().collect())
    }

    /// A table with `definition` tried before everything else.
    pub fn prepend(&self, definition: OperatorDefinition) -> Self {
        let mut definitions = vec![definition];
        definitions.extend(self.iter().cloned());
        Self::new(definitions)
    }

    /// A table with `definition` tried after everything else.
    pub fn push(&self, definition: OperatorDefinition) -> Self {
        let mut definitions: Vec<_> = self.iter().cloned().collect();
        definitions.push(definition);
        Self::new(definitions)
    }

    /// A table with `definition` inserted before the first definition `id`,
    /// or appended if there is none.
    pub fn insert_before(&self, id: &str, definition: OperatorDefinition) -> Self {
        let mut definitions: Vec<_> = self.iter().cloned().collect();
        let at = definitions
            .iter()
            .position(|d| d.id == id)
            .unwrap_or(definitions.len());
        definitions.insert(at, definition);
        Self::new(definitions)
    }

    /// Compile every matcher now, reporting the first bad pattern.
    pub fn warm(&self) -> Result<()> {
        for definition in self.iter() {
            definition.matcher()?;
        }
        Ok(())
    }
}

fn operator(left: &str, symbol: &str, value: impl Into<Value>) -> Document {
    Document::with(left, Document::with(symbol, value))
}

fn require_raw<'a>(operands: &Operands<'a>) -> Result<&'a str> {
    operands.raw.ok_or_else(|| Error::InvalidOperand {
        clause: operands.clause.to_string(),
        reason: format!("operator {:?} needs a right-hand operand", operands.token),
    })
}

fn require_value(operands: &Operands<'_>) -> Result<Value> {
    require_raw(operands)?;
    Ok(operands.value.clone().unwrap_or(Value::Undefined))
}

fn require_number(operands: &Operands<'_>) -> Result<f64> {
    let raw = require_raw(operands)?;
    parse_number(raw).ok_or_else(|| Error::InvalidOperand {
        clause: operands.clause.to_string(),
        reason: format!("{:?} is not a number", raw),
    })
}

fn require_index(operands: &Operands<'_>) -> Result<f64> {
    let n = require_number(operands)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(Error::InvalidOperand {
            clause: operands.clause.to_string(),
            reason: format!("{} is not an array index", format_number(n)),
        });
    }
    Ok(n)
}

fn build_builtin(
    kind: OperatorKind,
    operands: &Operands<'_>,
    settings: &Settings,
) -> Result<Document> {
    use OperatorKind::*;
    let a = operands.left;

    let fragment = match kind {
        NotEqual => operator(a, "$ne", require_value(operands)?),
        IsNull => Document::with(a, Value::Null),
        IsUndefined => Document::with(a, Value::Undefined),
        Equal => Document::with(a, require_value(operands)?),
        RegexContains => operator(a, "$regex", require_raw(operands)?),
        RegexPrefix => operator(a, "$regex", format!("^{}", require_raw(operands)?)),
        RegexSuffix => operator(a, "$regex", format!("{}$", require_raw(operands)?)),
        NotIn => operator(
            a,
            "$nin",
            parse_array(require_raw(operands)?, settings.array_separator),
        ),
        In => operator(
            a,
            "$in",
            parse_array(require_raw(operands)?, settings.array_separator),
        ),
        Size => operator(a, "$size", require_value(operands)?),
        IndexExists => {
            let index = require_index(operands)?;
            operator(&format!("{}.{}", a, format_number(index)), "$exists", true)
        }
        IndexExistsAfter => {
            let index = require_index(operands)? + 1.0;
            operator(&format!("{}.{}", a, format_number(index)), "$exists", true)
        }
        Gte => operator(a, "$gte", require_number(operands)?),
        Lte => operator(a, "$lte", require_number(operands)?),
        Gt => operator(a, "$gt", require_number(operands)?),
        Lt => operator(a, "$lt", require_number(operands)?),
        NotExists => operator(a, "$exists", false),
        Exists => operator(a, "$exists", true),
        False => Document::with(a, false),
        True => Document::with(a, true),
    };
    Ok(fragment)
}
