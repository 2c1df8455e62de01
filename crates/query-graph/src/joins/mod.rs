//! Join planning
//!
//! Turns a linearized query graph into a sequence of join steps and renders
//! it as a nested ANSI join clause.

pub mod plan;
pub mod planner;
pub mod types;

pub use plan::{JoinPlan, JoinStep};
pub use planner::{build_join_clause, JoinPlanner};
pub use types::JoinType;
