//! Compiler configuration.
//!
//! `Settings` is the fully resolved configuration a `Compiler` runs with.
//! `Options` is a partial overlay, loaded from TOML or passed as the
//! trailing compile input.
//!
//! Config file resolution order for [`Options::load`]:
//! 1. SHORTHAND_CONFIG environment variable
//! 2. `shorthand.toml` in the platform config directory
//! 3. No file: default options

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::compiler::OperatorTable;
use crate::decode::DEFAULT_OBJECT_PATTERN;
use crate::merge::MergeStrategy;
use crate::split::{DEFAULT_ARRAY_SEPARATOR, DEFAULT_CLAUSE_SEPARATOR};
use crate::{Error, Result};

/// Environment variable pointing at a shorthand config file.
pub const CONFIG_PATH_VAR: &str = "SHORTHAND_CONFIG";

const CONFIG_FILE_NAME: &str = "shorthand.toml";

/// Resolved compiler settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Raise on decode/compile failures instead of skipping the input.
    pub throw_on_error: bool,

    /// Merge strategy for objects, and the fallback for everything else.
    pub merge: MergeStrategy,

    /// Merge strategy for decoded object/JSON strings.
    pub merge_json: Option<MergeStrategy>,

    /// Merge strategy for shorthand clauses.
    pub merge_clauses: Option<MergeStrategy>,

    /// Decode object-like strings as JSON5 rather than strict JSON.
    pub relaxed_decoder: bool,

    /// Regex deciding whether a string is decoded as an object literal.
    pub object_pattern: String,

    /// Run `guess_type` on clause right-hand operands.
    pub coerce_right_operand: bool,

    /// Ordered operator definitions; the first match wins.
    pub operator_table: OperatorTable,

    /// Separator between array operand elements.
    pub array_separator: char,

    /// Separator between clauses.
    pub clause_separator: char,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            throw_on_error: true,
            merge: MergeStrategy::Dotted,
            merge_json: None,
            merge_clauses: None,
            relaxed_decoder: true,
            object_pattern: DEFAULT_OBJECT_PATTERN.to_string(),
            coerce_right_operand: true,
            operator_table: OperatorTable::default(),
            array_separator: DEFAULT_ARRAY_SEPARATOR,
            clause_separator: DEFAULT_CLAUSE_SEPARATOR,
        }
    }
}

impl Settings {
    /// Overlay `options` onto these settings.
    pub fn with_options(mut self, options: &Options) -> Self {
        if let Some(v) = options.throw_on_error {
            self.throw_on_error = v;
        }
        if let Some(v) = options.merge {
            self.merge = v;
        }
        if options.merge_json.is_some() {
            self.merge_json = options.merge_json;
        }
        if options.merge_clauses.is_some() {
            self.merge_clauses = options.merge_clauses;
        }
        if let Some(v) = options.relaxed_decoder {
            self.relaxed_decoder = v;
        }
        if let Some(v) = &options.object_pattern {
            self.object_pattern = v.clone();
        }
        if let Some(v) = options.coerce_right_operand {
            self.coerce_right_operand = v;
        }
        if let Some(v) = &options.operator_table {
            self.operator_table = v.clone();
        }
        if let Some(v) = options.array_separator {
            self.array_separator = v;
        }
        if let Some(v) = options.clause_separator {
            self.clause_separator = v;
        }
        self
    }

    /// Check settings that would make splitting ambiguous.
    pub fn validate(&self) -> Result<()> {
        for (name, sep) in [
            ("array_separator", self.array_separator),
            ("clause_separator", self.clause_separator),
        ] {
            if sep == '\'' || sep == '\\' || sep.is_whitespace() {
                return Err(Error::Config(format!("{} cannot be {:?}", name, sep)));
            }
        }
        if self.array_separator == self.clause_separator {
            return Err(Error::Config(format!(
                "array_separator and clause_separator are both {:?}",
                self.array_separator
            )));
        }
        Ok(())
    }
}

/// Partial settings overlay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub throw_on_error: Option<bool>,
    pub merge: Option<MergeStrategy>,
    pub merge_json: Option<MergeStrategy>,
    pub merge_clauses: Option<MergeStrategy>,
    pub relaxed_decoder: Option<bool>,
    pub object_pattern: Option<String>,
    pub coerce_right_operand: Option<bool>,
    pub array_separator: Option<char>,
    pub clause_separator: Option<char>,

    /// Operator tables are code, not configuration.
    #[serde(skip)]
    pub operator_table: Option<OperatorTable>,
}

impl Options {
    /// Options that only toggle error suppression.
    pub fn lenient() -> Self {
        Self {
            throw_on_error: Some(false),
            ..Default::default()
        }
    }

    /// Parse options from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load options using the standard resolution order.
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load options from a specific file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize these options as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }

    // 2. Platform config directory (via directories crate)
    ProjectDirs::from("", "", "shorthand").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
