//! # elif-query-graph: Join planning for elif.rs
//!
//! Builds a graph of the tables taking part in a query and of the
//! relationships (foreign keys and user predicates) connecting them, detects
//! accidental cartesian joins, and renders the nested INNER / LEFT OUTER /
//! FULL OUTER join clause the SQL generator places after `FROM`.
//!
//! ```
//! use elif_query_graph::{ForeignKey, PlannerConfig, QueryGraph, TableDescriptor};
//!
//! let company = TableDescriptor::new("car_company")
//!     .with_primary_key("uid_carcompany")
//!     .into_ref();
//! let marque = TableDescriptor::new("marque")
//!     .with_foreign_key(ForeignKey::simple("fk_carcompany", "car_company", "uid_carcompany"))
//!     .into_ref();
//!
//! let mut graph = QueryGraph::new();
//! graph.add_required(&[company, marque], &[]);
//!
//! let sql = graph.join_clause(&PlannerConfig::default()).unwrap();
//! assert_eq!(
//!     sql,
//!     "car_company INNER JOIN marque ON( CAR_COMPANY.UID_CARCOMPANY = MARQUE.FK_CARCOMPANY )"
//! );
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod graph;
pub mod joins;
pub mod schema;


pub use backends::{JoinSyntax, SqlDialect};
pub use config::{ConfigError, PlannerConfig};
pub use error::*;
pub use graph::*;
pub use joins::*;
pub use schema::{ForeignKey, TableDescriptor};
