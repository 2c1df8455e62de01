//! Table identities

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable key of a table-entity type
///
/// Two entities of the same declared type share one identity, so every
/// mention of "the same table" lands on a single graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableIdentity(Arc<str>);

impl TableIdentity {
    /// Identity from an explicit registry name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Identity derived from a Rust type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TableIdentity {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}
