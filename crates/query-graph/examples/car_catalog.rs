//! Builds the join clause for a small car catalogue schema.
//!
//! Run with `RUST_LOG=elif_query_graph=debug` to see graph building and the
//! generated clause.

use elif_query_graph::{
    ColumnRef, ComparisonOperator, ForeignKey, ModelResult, PlannerConfig, QueryGraph,
    Relationship, TableDescriptor,
};
use tracing_subscriber::EnvFilter;

fn main() -> ModelResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PlannerConfig::from_env()?.with_log_sql(true);

    let car_company = TableDescriptor::new("car_company").with_primary_key("uid_carcompany");
    let marque = TableDescriptor::new("marque")
        .with_primary_key("uid_marque")
        .with_foreign_key(ForeignKey::simple("fk_carcompany", "car_company", "uid_carcompany"))
        .with_conditions(true);
    let link = TableDescriptor::new("link")
        .with_primary_key("uid_link")
        .with_foreign_key(ForeignKey::simple("fk_carcompany", "car_company", "uid_carcompany"));
    let logo = TableDescriptor::new("logo")
        .with_primary_key("uid_logo")
        .with_foreign_key(ForeignKey::simple("fk_link", "link", "uid_link"));

    for table in [&car_company, &marque, &link, &logo] {
        table.validate()?;
    }

    let same_name = Relationship::compare(
        ColumnRef::new("car_company", "name"),
        ComparisonOperator::EqualIgnoreCase,
        ColumnRef::new("marque", "name"),
    )?;

    let mut graph = QueryGraph::new();
    graph.add_required(&[car_company.into_ref(), marque.into_ref()], &[same_name]);
    graph.add_optional(&[link.into_ref(), logo.into_ref()], &[]);

    if graph.has_cartesian_join() {
        println!("disconnected tables: {:?}", graph.disconnected_tables());
    }

    println!("FROM {}", graph.join_clause(&config)?);
    Ok(())
}
