//! Compiling a single shorthand clause into a fragment.

use crate::config::Settings;
use crate::merge::MergeStrategy;
use crate::value::{guess_type, Document, Value};
use crate::{Error, Result};

use super::operators::{OperatorTable, Operands};

/// The output of one clause, not yet merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub document: Document,
    /// Merge strategy requested by the operator that produced it.
    pub merge: Option<MergeStrategy>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }
}

/// Compile `clause` with the first matching definition of `table`.
///
/// When `settings.throw_on_error` is off, unrecognized clauses and bad
/// operands yield an empty fragment instead of an error.
pub fn compile_clause(
    clause: &str,
    table: &OperatorTable,
    settings: &Settings,
) -> Result<Fragment> {
    match try_compile_clause(clause, table, settings) {
        Err(e) if !settings.throw_on_error && e.is_suppressible() => {
            tracing::debug!(clause, error = %e, "skipping clause");
            Ok(Fragment::default())
        }
        other => other,
    }
}

fn try_compile_clause(
    clause: &str,
    table: &OperatorTable,
    settings: &Settings,
) -> Result<Fragment> {
    for definition in table.iter() {
        let Some(caps) = definition.captures(clause)? else {
            continue;
        };

        let left = caps.name("a").map_or("", |m| m.as_str()).trim();
        let token = caps.name("assigner").map_or(definition.id.as_str(), |m| m.as_str());
        let raw = caps.name("b").map(|m| m.as_str());
        let value = raw.map(|b| {
            if settings.coerce_right_operand {
                guess_type(b)
            } else {
                Value::String(b.to_string())
            }
        });

        tracing::trace!(clause, operator = %definition.id, left, right = ?raw, "matched clause");

        let operands = Operands {
            clause,
            left,
            token,
            raw,
            value,
        };
        let document = definition.build_fragment(&operands, settings)?;
        return Ok(Fragment {
            document,
            merge: definition.merge,
        });
    }

    Err(Error::UnrecognizedClause(clause.to_string()))
}
