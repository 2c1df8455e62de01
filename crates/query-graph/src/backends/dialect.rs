//! SQL dialects as seen by the join planner

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Join syntax a dialect exposes to the planner
pub trait JoinSyntax {
    /// Name used in error messages and logs
    fn name(&self) -> &str;

    /// Format a table name for the FROM clause
    fn format_table_name(&self, table: &str) -> String;

    /// Format a qualified column reference for an ON clause
    fn format_column_name(&self, table: &str, column: &str) -> String;

    /// Whether FULL OUTER JOIN is accepted by the database
    fn supports_full_outer_join(&self) -> bool;

    fn inner_join_keyword(&self) -> &str {
        "INNER JOIN"
    }

    fn left_outer_join_keyword(&self) -> &str {
        "LEFT OUTER JOIN"
    }

    fn full_outer_join_keyword(&self) -> &str {
        "FULL OUTER JOIN"
    }

    fn cross_join_keyword(&self) -> &str {
        "CROSS JOIN"
    }
}

/// Built-in SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Plain ANSI SQL
    #[default]
    Ansi,
    PostgreSQL,
    MySQL,
    SQLite,
}

impl JoinSyntax for SqlDialect {
    fn name(&self) -> &str {
        match self {
            SqlDialect::Ansi => "ansi",
            SqlDialect::PostgreSQL => "postgresql",
            SqlDialect::MySQL => "mysql",
            SqlDialect::SQLite => "sqlite",
        }
    }

    fn format_table_name(&self, table: &str) -> String {
        table.to_string()
    }

    fn format_column_name(&self, table: &str, column: &str) -> String {
        format!("{}.{}", table.to_uppercase(), column.to_uppercase())
    }

    fn supports_full_outer_join(&self) -> bool {
        match self {
            SqlDialect::Ansi | SqlDialect::PostgreSQL | SqlDialect::SQLite => true,
            SqlDialect::MySQL => false,
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ansi" | "sql" => Ok(SqlDialect::Ansi),
            "postgresql" | "postgres" => Ok(SqlDialect::PostgreSQL),
            "mysql" => Ok(SqlDialect::MySQL),
            "sqlite" => Ok(SqlDialect::SQLite),
            _ => Err(format!("Unsupported SQL dialect: {}", s)),
        }
    }
}
