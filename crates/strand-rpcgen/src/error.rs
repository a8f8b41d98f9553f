//! Error types for schema compilation.

use std::fmt;

/// A source location: file path plus 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub line: u32,
}

impl Span {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Error that can occur while compiling a schema file.
///
/// Every variant is fatal to the file it occurred in; sibling files in the
/// same batch are still attempted so the caller gets a complete report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    #[error("{span}: `{text}` is not a valid data type")]
    InvalidDataType { text: String, span: Span },

    #[error("{span}: `{text}` is not a valid map key type")]
    InvalidMapKey { text: String, span: Span },

    #[error("{span}: tuples must have between 2 and 5 items, found {arity}")]
    InvalidTupleArity { arity: usize, span: Span },

    #[error("{span}: {message}")]
    Structural { message: String, span: Span },

    #[error("{file}: {message}")]
    Parse { message: String, file: String },
}

impl CompileError {
    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        Self::Structural {
            message: message.into(),
            span,
        }
    }
}
