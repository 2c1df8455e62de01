//! Query Graph Module - tables of a query and the relationships connecting them

pub mod entity;
pub mod identity;
pub mod node;
pub mod query_graph;
pub mod relationship;

pub use entity::{Entity, EntityRef};
pub use identity::TableIdentity;
pub use node::GraphNode;
pub use query_graph::QueryGraph;
pub use relationship::{
    ColumnComparison, ColumnRef, ComparisonOperator, Predicate, Relationship, RelationshipKey,
    RenderPredicate,
};
