//! Error types for shorthand compilation.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported input shape: {0}")]
    UnsupportedInputShape(String),

    #[error("Failed to decode {input:?}: {message}")]
    Decode { input: String, message: String },

    #[error("Unrecognized clause: {0:?}")]
    UnrecognizedClause(String),

    #[error("Invalid operand in {clause:?}: {reason}")]
    InvalidOperand { clause: String, reason: String },

    #[error("Invalid pattern for operator {id:?}: {source}")]
    Pattern {
        id: String,
        #[source]
        source: regex::Error,
    },
}

impl Error {
    /// Whether `throw_on_error = false` turns this error into a skipped input.
    pub fn is_suppressible(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedInputShape(_)
                | Error::Decode { .. }
                | Error::UnrecognizedClause(_)
                | Error::InvalidOperand { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
