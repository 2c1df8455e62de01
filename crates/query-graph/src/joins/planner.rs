//! Join planner - walks a table order and emits one join step per table

use std::collections::HashSet;

use super::plan::{JoinPlan, JoinStep};
use super::types::JoinType;
use crate::backends::JoinSyntax;
use crate::config::PlannerConfig;
use crate::error::{JoinGraphError, JoinResult};
use crate::graph::{GraphNode, QueryGraph, Relationship, RelationshipKey, TableIdentity};

/// Builds join plans and clauses for one query graph
pub struct JoinPlanner<'a> {
    graph: &'a QueryGraph,
    syntax: &'a dyn JoinSyntax,
    config: PlannerConfig,
}

impl<'a> JoinPlanner<'a> {
    pub fn new(graph: &'a QueryGraph, syntax: &'a dyn JoinSyntax) -> Self {
        Self {
            graph,
            syntax,
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Plan the joins for `order`
    ///
    /// `order` must come from [`QueryGraph::linearize`]: every table after
    /// the first needs a predicate whose tables are all placed by its step.
    pub fn plan(&self, order: &[TableIdentity]) -> JoinResult<JoinPlan> {
        self.plan_order(order, false)
    }

    /// Render the join clause for `order`
    pub fn build_join_clause(&self, order: &[TableIdentity]) -> JoinResult<String> {
        let plan = self.plan(order)?;
        Ok(self.render(&plan))
    }

    /// Plan the joins for every table of the graph
    ///
    /// Starts from [`QueryGraph::choose_start_table`]. A graph with a
    /// cartesian join is rejected unless the configuration allows it, in
    /// which case the disconnected components are joined with CROSS JOIN.
    pub fn plan_graph(&self) -> JoinResult<JoinPlan> {
        let start = self
            .graph
            .choose_start_table()
            .ok_or(JoinGraphError::EmptyGraph)?;
        let order = self.graph.linearize(&start);

        if order.len() == self.graph.node_count() {
            return self.plan_order(&order, false);
        }

        let unreachable = self.graph.disconnected_tables();
        if !self.config.allow_cartesian {
            tracing::warn!(
                "Refusing cartesian join: {} table(s) not connected to '{}'",
                unreachable.len(),
                start
            );
            return Err(JoinGraphError::DisconnectedGraph { start, unreachable });
        }

        tracing::warn!(
            "Building cartesian join: {:?} not connected to '{}'",
            unreachable,
            start
        );
        self.plan_order(&self.graph.linearize_all(), true)
    }

    /// Render the join clause for every table of the graph
    pub fn build_graph_clause(&self) -> JoinResult<String> {
        let plan = self.plan_graph()?;
        Ok(self.render(&plan))
    }

    fn render(&self, plan: &JoinPlan) -> String {
        let sql = plan.to_sql(self.syntax);
        if self.config.log_sql {
            tracing::debug!("Join clause ({}): {}", self.syntax.name(), sql);
        }
        sql
    }

    fn plan_order(&self, order: &[TableIdentity], allow_cross: bool) -> JoinResult<JoinPlan> {
        let (first, rest) = order.split_first().ok_or(JoinGraphError::EmptyGraph)?;
        if !self.graph.contains(first) {
            return Err(JoinGraphError::OrderingContractViolation {
                table: first.clone(),
            });
        }

        let full_outer_graph = self.graph.is_full_outer_join();
        let mut placed: Vec<TableIdentity> = vec![first.clone()];
        let mut emitted: HashSet<RelationshipKey> = HashSet::new();
        let mut steps = vec![JoinStep {
            table: first.clone(),
            table_name: self.graph.table_name(first),
            join_type: None,
            predicates: Vec::new(),
        }];

        for table in rest {
            if placed.contains(table) {
                tracing::debug!("Table '{}' appears twice in join order; skipping", table);
                continue;
            }
            let node = self
                .graph
                .node(table)
                .ok_or_else(|| JoinGraphError::OrderingContractViolation {
                    table: table.clone(),
                })?;

            let (joined, predicates) = self.step_predicates(node, &placed, &mut emitted);

            // a step without a predicate would be a cartesian product
            let join_type = if predicates.is_empty() {
                if !allow_cross {
                    return Err(JoinGraphError::OrderingContractViolation {
                        table: table.clone(),
                    });
                }
                JoinType::Cross
            } else {
                let join_type = joined
                    .iter()
                    .map(|other| {
                        JoinType::between(
                            self.graph.is_required(other),
                            node.is_required(),
                            full_outer_graph,
                        )
                    })
                    .max()
                    .unwrap_or(JoinType::Inner);
                self.check_supported(join_type)?;
                join_type
            };

            placed.push(table.clone());
            steps.push(JoinStep {
                table: table.clone(),
                table_name: self.graph.table_name(table),
                join_type: Some(join_type),
                predicates,
            });
        }

        Ok(JoinPlan::new(steps))
    }

    fn check_supported(&self, join_type: JoinType) -> JoinResult<()> {
        if join_type == JoinType::FullOuter && !self.syntax.supports_full_outer_join() {
            return Err(JoinGraphError::UnsupportedJoinType {
                join_type,
                dialect: self.syntax.name().to_string(),
            });
        }
        Ok(())
    }

    /// Placed tables `node` can be joined to, and the predicates of its step
    ///
    /// A predicate is emitted once, at the step where the last table it
    /// references is placed. A placed neighbour whose relationships still
    /// wait for an unplaced table does not count as a join partner.
    fn step_predicates(
        &self,
        node: &GraphNode,
        placed: &[TableIdentity],
        emitted: &mut HashSet<RelationshipKey>,
    ) -> (Vec<TableIdentity>, Vec<Relationship>) {
        let table = node.id();
        let mut joined = Vec::new();
        let mut predicates = Vec::new();
        for other in node.connected().iter().filter(|other| placed.contains(*other)) {
            let mut ready = self
                .graph
                .ready_relationships(table, other, |side| placed.contains(side))
                .peekable();
            if ready.peek().is_none() {
                continue;
            }
            joined.push(other.clone());
            for relationship in ready {
                if emitted.insert(relationship.key().clone()) {
                    predicates.push(relationship.clone());
                }
            }
        }
        (joined, predicates)
    }
}

/// Render the nested join clause for `order`
///
/// Fails with [`JoinGraphError::OrderingContractViolation`] when a table has
/// no predicate towards the tables before it, and with
/// [`JoinGraphError::UnsupportedJoinType`] when a FULL OUTER JOIN is needed
/// but the dialect lacks it.
pub fn build_join_clause(
    order: &[TableIdentity],
    graph: &QueryGraph,
    syntax: &dyn JoinSyntax,
) -> JoinResult<String> {
    JoinPlanner::new(graph, syntax).build_join_clause(order)
}
