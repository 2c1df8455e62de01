//! Table descriptors and foreign keys

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RelationshipError;
use crate::graph::{ColumnRef, Entity, EntityRef, Relationship, TableIdentity};

/// Foreign key declared on a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// The foreign key column name(s)
    pub columns: Vec<String>,

    /// The referenced table
    pub references_table: String,

    /// Referenced column(s), matched to `columns` by position
    pub references_columns: Vec<String>,
}

impl ForeignKey {
    /// Single-column foreign key
    pub fn simple(column: &str, references_table: &str, references_column: &str) -> Self {
        Self {
            columns: vec![column.to_string()],
            references_table: references_table.to_string(),
            references_columns: vec![references_column.to_string()],
        }
    }

    /// Multi-column foreign key
    pub fn composite(columns: &[&str], references_table: &str, references_columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            references_table: references_table.to_string(),
            references_columns: references_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn validate(&self, table: &str) -> Result<(), RelationshipError> {
        if self.columns.is_empty() {
            return Err(RelationshipError::EmptyForeignKey(table.to_string()));
        }
        if self.columns.len() != self.references_columns.len() {
            return Err(RelationshipError::ColumnCountMismatch {
                table: table.to_string(),
                columns: self.columns.len(),
                referenced: self.references_columns.len(),
            });
        }
        Ok(())
    }

    /// `referenced.column = referencing.column` for every column pair
    fn predicates(
        &self,
        referencing: &dyn Entity,
        referenced: &dyn Entity,
    ) -> impl Iterator<Item = Relationship> + '_ {
        let referencing_id = referencing.table_identity();
        let referencing_name = referencing.table_name().to_string();
        let referenced_id = referenced.table_identity();
        let referenced_name = referenced.table_name().to_string();

        self.columns
            .iter()
            .zip(&self.references_columns)
            .filter_map(move |(column, referenced_column)| {
                Relationship::equals(
                    ColumnRef::for_table(referenced_id.clone(), &referenced_name, referenced_column),
                    ColumnRef::for_table(referencing_id.clone(), &referencing_name, column),
                )
                .ok()
            })
    }
}

/// Schema-level description of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    identity: TableIdentity,
    table_name: String,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
    conditions_set: bool,
}

impl TableDescriptor {
    /// Describe a table whose identity is its name
    pub fn new(table_name: &str) -> Self {
        Self {
            identity: TableIdentity::new(table_name),
            table_name: table_name.to_string(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            conditions_set: false,
        }
    }

    /// Describe the table backing the Rust type `T`
    pub fn for_type<T: ?Sized + 'static>(table_name: &str) -> Self {
        Self {
            identity: TableIdentity::of::<T>(),
            ..Self::new(table_name)
        }
    }

    pub fn with_primary_key(mut self, column: &str) -> Self {
        self.primary_key.push(column.to_string());
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Mark the table as filtered by the query
    pub fn with_conditions(mut self, conditions_set: bool) -> Self {
        self.conditions_set = conditions_set;
        self
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn validate(&self) -> Result<(), RelationshipError> {
        self.foreign_keys
            .iter()
            .try_for_each(|fk| fk.validate(&self.table_name))
    }

    pub fn into_ref(self) -> EntityRef {
        Arc::new(self)
    }
}

impl Entity for TableDescriptor {
    fn table_identity(&self) -> TableIdentity {
        self.identity.clone()
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn has_conditions_set(&self) -> bool {
        self.conditions_set
    }

    fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    fn relationships_as_predicates(&self, other: &dyn Entity) -> Vec<Relationship> {
        if other.table_identity() == self.identity {
            return Vec::new();
        }

        let outgoing = self
            .foreign_keys
            .iter()
            .filter(|fk| fk.references_table == other.table_name())
            .flat_map(|fk| fk.predicates(self, other));

        let incoming = other
            .foreign_keys()
            .iter()
            .filter(|fk| fk.references_table == self.table_name)
            .flat_map(|fk| fk.predicates(other, self));

        outgoing.chain(incoming).collect()
    }
}
