//! sift-shorthand: compile terse filter strings into query documents.
//!
//! Shorthand like `foo>=5`, `tags[]=a|b` or `!archived` becomes a
//! MongoDB-style filter (`$gte`, `$in`, `$exists`, ...). Objects and
//! JSON-ish strings can be mixed in and are merged into the same result.

pub mod compiler;
pub mod config;
pub mod decode;
pub mod error;
pub mod merge;
pub mod split;
pub mod value;

pub use compiler::{
    compile, compile_clause, compile_values, BuildFn, Compiler, Fragment, Input,
    OperatorDefinition, OperatorKind, OperatorTable, Operands, PatternShape,
};
pub use config::{Options, Settings};
pub use decode::decode_object;
pub use error::{Error, Result};
pub use merge::MergeStrategy;
pub use split::{parse_array, split_fields};
pub use value::{guess_type, Document, Value};

/// Escape text so it can be embedded literally in an operator matcher.
pub fn escape_pattern(text: &str) -> String {
    regex::escape(text)
}
