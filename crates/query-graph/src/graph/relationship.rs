//! Relationships - the predicates that connect tables in a query graph

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::identity::TableIdentity;
use crate::backends::JoinSyntax;
use crate::error::RelationshipError;

/// Comparison operators usable between two columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,
    /// Equality after upper-casing both sides
    EqualIgnoreCase,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
}

impl ComparisonOperator {
    /// Whether swapping the operands keeps the meaning
    pub fn is_symmetric(self) -> bool {
        matches!(self, Self::Equal | Self::EqualIgnoreCase | Self::NotEqual)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOperator::Equal => write!(f, "="),
            ComparisonOperator::EqualIgnoreCase => write!(f, "= (ignore case)"),
            ComparisonOperator::NotEqual => write!(f, "<>"),
            ComparisonOperator::GreaterThan => write!(f, ">"),
            ComparisonOperator::GreaterThanOrEqual => write!(f, ">="),
            ComparisonOperator::LessThan => write!(f, "<"),
            ComparisonOperator::LessThanOrEqual => write!(f, "<="),
            ComparisonOperator::Like => write!(f, "LIKE"),
        }
    }
}

/// A column on a specific table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: TableIdentity,
    pub table_name: String,
    pub column: String,
}

impl ColumnRef {
    /// Column of a table whose identity is its name
    pub fn new(table_name: &str, column: &str) -> Self {
        Self {
            table: TableIdentity::new(table_name),
            table_name: table_name.to_string(),
            column: column.to_string(),
        }
    }

    /// Column of a table with an identity distinct from its SQL name
    pub fn for_table(table: TableIdentity, table_name: &str, column: &str) -> Self {
        Self {
            table,
            table_name: table_name.to_string(),
            column: column.to_string(),
        }
    }

    fn render(&self, syntax: &dyn JoinSyntax) -> String {
        syntax.format_column_name(&self.table_name, &self.column)
    }

    fn key(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// `left <op> right` between two columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnComparison {
    pub left: ColumnRef,
    pub operator: ComparisonOperator,
    pub right: ColumnRef,
}

impl ColumnComparison {
    fn render(&self, syntax: &dyn JoinSyntax) -> String {
        let left = self.left.render(syntax);
        let right = self.right.render(syntax);
        match self.operator {
            ComparisonOperator::EqualIgnoreCase => format!("UPPER({}) = UPPER({})", left, right),
            op => format!("{} {} {}", left, op, right),
        }
    }

    fn key(&self) -> String {
        let (mut left, mut right) = (self.left.key(), self.right.key());
        if self.operator.is_symmetric() && right < left {
            std::mem::swap(&mut left, &mut right);
        }
        format!("{} {:?} {}", left, self.operator, right)
    }
}

/// Renders a caller-built predicate for a dialect
pub type RenderPredicate = Arc<dyn Fn(&dyn JoinSyntax) -> String + Send + Sync>;

/// SQL predicate contributed by a relationship
#[derive(Clone)]
pub enum Predicate {
    Compare(ColumnComparison),
    /// Predicate rendered by the caller; `key` identifies it for deduplication
    Raw { key: String, render: RenderPredicate },
}

impl Predicate {
    pub fn to_sql(&self, syntax: &dyn JoinSyntax) -> String {
        match self {
            Predicate::Compare(comparison) => comparison.render(syntax),
            Predicate::Raw { render, .. } => render(syntax),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare(comparison) => f.debug_tuple("Compare").field(comparison).finish(),
            Predicate::Raw { key, .. } => f.debug_struct("Raw").field("key", key).finish_non_exhaustive(),
        }
    }
}

/// Deduplication key of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipKey(String);

impl fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A predicate connecting two or more tables
#[derive(Debug, Clone)]
pub struct Relationship {
    sides: Vec<TableIdentity>,
    predicate: Predicate,
    key: RelationshipKey,
}

impl Relationship {
    /// Relationship comparing a column of one table with a column of another
    pub fn compare(
        left: ColumnRef,
        operator: ComparisonOperator,
        right: ColumnRef,
    ) -> Result<Self, RelationshipError> {
        let sides = vec![left.table.clone(), right.table.clone()];
        let comparison = ColumnComparison {
            left,
            operator,
            right,
        };
        let key = RelationshipKey(comparison.key());
        Self::build(sides, Predicate::Compare(comparison), key)
    }

    /// Equality between two columns, the shape every foreign key produces
    pub fn equals(left: ColumnRef, right: ColumnRef) -> Result<Self, RelationshipError> {
        Self::compare(left, ComparisonOperator::Equal, right)
    }

    /// Relationship whose SQL is rendered by the caller
    ///
    /// `sides` lists every table the predicate references; it may name more
    /// than two.
    pub fn raw<F>(
        key: impl Into<String>,
        sides: Vec<TableIdentity>,
        render: F,
    ) -> Result<Self, RelationshipError>
    where
        F: Fn(&dyn JoinSyntax) -> String + Send + Sync + 'static,
    {
        let key = key.into();
        let predicate = Predicate::Raw {
            key: key.clone(),
            render: Arc::new(render),
        };
        Self::build(sides, predicate, RelationshipKey(format!("raw:{}", key)))
    }

    fn build(
        sides: Vec<TableIdentity>,
        predicate: Predicate,
        key: RelationshipKey,
    ) -> Result<Self, RelationshipError> {
        let mut unique: Vec<TableIdentity> = Vec::with_capacity(sides.len());
        for side in sides {
            if !unique.contains(&side) {
                unique.push(side);
            }
        }
        if unique.len() < 2 {
            return Err(RelationshipError::TooFewSides(unique.len()));
        }
        Ok(Self {
            sides: unique,
            predicate,
            key,
        })
    }

    /// Tables referenced by the predicate, without duplicates
    pub fn sides(&self) -> &[TableIdentity] {
        &self.sides
    }

    pub fn references(&self, table: &TableIdentity) -> bool {
        self.sides.contains(table)
    }

    /// SQL name a column reference gives `table`, if any
    pub fn table_name(&self, table: &TableIdentity) -> Option<&str> {
        match &self.predicate {
            Predicate::Compare(comparison) => [&comparison.left, &comparison.right]
                .into_iter()
                .find(|column| &column.table == table)
                .map(|column| column.table_name.as_str()),
            Predicate::Raw { .. } => None,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn key(&self) -> &RelationshipKey {
        &self.key
    }

    pub fn to_sql(&self, syntax: &dyn JoinSyntax) -> String {
        self.predicate.to_sql(syntax)
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Relationship {}
