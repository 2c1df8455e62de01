//! The entity interface the mapping layer hands to the query graph

use std::fmt;
use std::sync::Arc;

use super::identity::TableIdentity;
use super::relationship::Relationship;
use crate::schema::ForeignKey;

/// A table-like entity taking part in a query
pub trait Entity: fmt::Debug {
    /// Identity of the entity's declared type
    fn table_identity(&self) -> TableIdentity;

    /// Table name as it appears in SQL
    fn table_name(&self) -> &str;

    /// Whether the caller filters on this entity
    fn has_conditions_set(&self) -> bool {
        false
    }

    /// Foreign keys declared on this entity
    fn foreign_keys(&self) -> &[ForeignKey] {
        &[]
    }

    /// Whether a query containing both entities can join them directly
    fn will_join_to(&self, other: &dyn Entity) -> bool {
        !self.relationships_as_predicates(other).is_empty()
    }

    /// Predicates implied by the schema between this entity and `other`
    fn relationships_as_predicates(&self, other: &dyn Entity) -> Vec<Relationship>;
}

/// Shared handle to an entity
pub type EntityRef = Arc<dyn Entity + Send + Sync>;
