//! Database Backend Abstractions
//!
//! Only the part of a backend the join planner needs lives here: how tables
//! and columns are written and which join keywords the database accepts.

pub mod dialect;

pub use dialect::{JoinSyntax, SqlDialect};
