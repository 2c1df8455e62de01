//! Graph nodes

use super::identity::TableIdentity;

/// One table in a query graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    id: TableIdentity,
    required: bool,
    /// Kept in connection order so traversals are deterministic
    connected: Vec<TableIdentity>,
}

impl GraphNode {
    pub fn new(id: TableIdentity, required: bool) -> Self {
        Self {
            id,
            required,
            connected: Vec::new(),
        }
    }

    pub fn id(&self) -> &TableIdentity {
        &self.id
    }

    /// Whether the table joins as inner (`true`) or outer (`false`)
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Tables directly connected to this one, in connection order
    pub fn connected(&self) -> &[TableIdentity] {
        &self.connected
    }

    pub fn is_connected_to(&self, other: &TableIdentity) -> bool {
        self.connected.contains(other)
    }

    /// Record a connection; returns false when it already existed
    pub(crate) fn connect(&mut self, other: TableIdentity) -> bool {
        if other == self.id || self.connected.contains(&other) {
            return false;
        }
        self.connected.push(other);
        true
    }
}
