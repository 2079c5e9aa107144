//! Error types for tablemap

use thiserror::Error;

/// Result type alias for tablemap operations
pub type MapResult<T> = Result<T, MapError>;

/// Errors raised while compiling expressions, building statements or reading
/// delimited files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The statement needs a primary table and none was registered
    #[error("No primary table registered for this statement")]
    NoPrimaryTable,

    /// An expression referenced a type that takes no part in the statement
    #[error("Type '{0}' is not registered in this statement")]
    UnregisteredType(String),

    /// A member name has no column mapping on its type
    #[error("Unknown member '{member}' on '{type_name}'")]
    UnknownMember { type_name: String, member: String },

    /// Expression node, operator or method the compiler cannot translate
    #[error("{0} is not supported")]
    NotSupported(String),

    /// Builder misuse
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value row disagrees with the destination column list
    #[error("Column mismatch in row {row}: expected {expected} columns, found {found}")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A required value (search key, captured field) is missing
    #[error("Missing value: {0}")]
    MissingValue(String),

    /// Delimited input could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Underlying reader failed
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MapError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a not-supported error
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported(message.into())
    }

    /// Create an unknown member error
    pub fn unknown_member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnknownMember {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// Create a parse error for a specific line
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a not-supported error
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
