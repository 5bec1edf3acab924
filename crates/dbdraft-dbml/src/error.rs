use thiserror::Error;

/// Errors raised while reading DBML.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DbmlError {
    /// The source is not valid DBML. Positions are 1-based.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("DBML source is empty")]
    EmptySource,
}

impl DbmlError {
    pub(crate) fn parse(span: crate::ast::Span, message: impl Into<String>) -> Self {
        DbmlError::Parse {
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }
}

/// Result type for DBML operations.
pub type Result<T> = std::result::Result<T, DbmlError>;
