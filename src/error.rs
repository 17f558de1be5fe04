//! Error types for keep.

use thiserror::Error;

/// The main error type for keep operations.
#[derive(Debug, Error)]
pub enum KeepError {
    /// A column reference matched nothing exposed by the operands.
    #[error("Unresolved column '{name}' while building {relation}")]
    UnresolvedColumn { name: String, relation: String },

    /// A predicate input did not denote exactly one equality.
    #[error("Unsupported predicate shape: expected exactly one equality, got {entries}")]
    UnsupportedPredicate { entries: usize },

    /// A second root table reference was installed on one query.
    #[error("A table ref has already been assigned")]
    TableRefAlreadyAssigned,

    #[error("Cannot wire-represent {0}: only table projections are supported")]
    NotWireRepresentable(String),

    #[error("Cannot infer join columns: {0}")]
    UnsupportedJoinInference(String),

    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// A relation joined to a tree that already holds it as a FROM unit.
    #[error("{0} already appears in this join; wrap one side in a projection or selection")]
    RepeatedJoinOperand(String),

    #[error("Table '{0}' is already defined")]
    DuplicateTable(String),

    #[error("Unknown table: '{0}'")]
    UnknownTable(String),

    /// A subquery was asked for a column its select list does not expose.
    #[error("Column '{0}' is not exposed by its subquery")]
    ColumnNotExposed(String),

    #[error("Invalid wire representation: {0}")]
    Wire(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KeepError {
    /// Create an unresolved column error.
    pub fn unresolved(name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::UnresolvedColumn {
            name: name.into(),
            relation: relation.into(),
        }
    }

    /// Create a wire format error.
    pub fn wire(message: impl Into<String>) -> Self {
        Self::Wire(message.into())
    }
}

/// Result type alias for keep operations.
pub type KeepResult<T> = Result<T, KeepError>;
