use thiserror::Error;

/// Core error type shared across dbdraft crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A mutation targeted an id that is not present in the diagram.
    #[error("not found: {0}")]
    NotFound(String),
    /// A relationship or index would point at a table or field that does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    /// The diagram violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A requested feature is not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Convenience alias for results returned by dbdraft crates.
pub type Result<T> = std::result::Result<T, Error>;
