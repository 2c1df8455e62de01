//! In-memory schema descriptions
//!
//! A minimal stand-in for the mapping layer: tables described by name,
//! primary key and foreign keys, usable directly as query graph entities.

pub mod descriptor;

pub use descriptor::{ForeignKey, TableDescriptor};
