//! Error types for the query graph
//!
//! Join planning failures are raised as [`JoinGraphError`]; the crate-level
//! [`ModelError`] is what the statement-building layer of the ORM sees.

use std::fmt;

use crate::graph::TableIdentity;
use crate::joins::JoinType;

/// Result type alias for ORM-facing operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type alias for join planning
pub type JoinResult<T> = Result<T, JoinGraphError>;

/// Error types surfaced to the statement-building layer
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Query building error
    Query(String),
    /// Relationship declaration error
    Relationship(String),
    /// Configuration error
    Configuration(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Relationship(msg) => write!(f, "Relationship error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

/// Failures raised while turning a query graph into a join clause
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JoinGraphError {
    #[error(
        "Cartesian join: tables {} are not connected to '{start}'",
        format_tables(.unreachable)
    )]
    DisconnectedGraph {
        start: TableIdentity,
        unreachable: Vec<TableIdentity>,
    },

    #[error("{join_type} is required but the {dialect} dialect does not support it")]
    UnsupportedJoinType { join_type: JoinType, dialect: String },

    #[error("Join order places '{table}' before any table it can be joined on")]
    OrderingContractViolation { table: TableIdentity },

    #[error("Cannot build a join clause without tables")]
    EmptyGraph,
}

fn format_tables(tables: &[TableIdentity]) -> String {
    tables
        .iter()
        .map(|table| format!("'{}'", table))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<JoinGraphError> for ModelError {
    fn from(err: JoinGraphError) -> Self {
        ModelError::Query(err.to_string())
    }
}

/// Error types for relationship declarations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelationshipError {
    #[error("Relationship must reference at least two tables, got {0}")]
    TooFewSides(usize),

    #[error("Foreign key on '{table}' has {columns} column(s) but references {referenced} column(s)")]
    ColumnCountMismatch {
        table: String,
        columns: usize,
        referenced: usize,
    },

    #[error("Foreign key on '{0}' must have at least one column")]
    EmptyForeignKey(String),
}

impl From<RelationshipError> for ModelError {
    fn from(err: RelationshipError) -> Self {
        ModelError::Relationship(err.to_string())
    }
}
