//! Join types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backends::JoinSyntax;

/// Join type of one join step
///
/// Ordered from the most to the least restrictive among the keyed joins, so
/// the most permissive type of several edges is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    LeftOuter,
    FullOuter,
    /// Join between disconnected components, only on explicit request
    Cross,
}

impl JoinType {
    /// Join type of an edge between two tables
    pub fn between(left_required: bool, right_required: bool, full_outer_graph: bool) -> Self {
        match (left_required, right_required) {
            (true, true) => JoinType::Inner,
            (false, false) if full_outer_graph => JoinType::FullOuter,
            _ => JoinType::LeftOuter,
        }
    }

    pub fn keyword(self, syntax: &dyn JoinSyntax) -> &str {
        match self {
            JoinType::Inner => syntax.inner_join_keyword(),
            JoinType::LeftOuter => syntax.left_outer_join_keyword(),
            JoinType::FullOuter => syntax.full_outer_join_keyword(),
            JoinType::Cross => syntax.cross_join_keyword(),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::LeftOuter => write!(f, "LEFT OUTER JOIN"),
            JoinType::FullOuter => write!(f, "FULL OUTER JOIN"),
            JoinType::Cross => write!(f, "CROSS JOIN"),
        }
    }
}
