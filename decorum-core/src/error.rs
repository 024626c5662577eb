// Error types for the Decorum metadata engine

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A decorator was declared on the wrong kind of target, or was given
    /// arguments of the wrong shape.
    #[error("Declaration error: {0}")]
    Declaration(String),

    /// No extraction factory is registered for a parameter kind.
    #[error("No extractor registered for kind: {0}")]
    UnresolvedExtraction(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Decorators already applied to instance of {0}")]
    AlreadyDecorated(String),

    #[error("Missing argument at position {0}")]
    MissingArgument(usize),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    // Errors below are never produced by the engine itself; extraction
    // functions and controller methods raise them and they pass through.
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Application error: {0}")]
    Application(String),
}

impl Error {
    /// Build a declaration error from anything printable.
    pub fn declaration(msg: impl Into<String>) -> Self {
        Error::Declaration(msg.into())
    }

    /// Check if this error was raised while declaring a class
    pub fn is_declaration_error(&self) -> bool {
        matches!(self, Error::Declaration(_))
    }

    /// Check if this error reports a missing extraction factory
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Error::UnresolvedExtraction(_))
    }
}
