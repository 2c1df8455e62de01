//! Join plans - the ordered join steps of one query

use serde_json::{json, Value};

use super::types::JoinType;
use crate::backends::JoinSyntax;
use crate::graph::{Relationship, TableIdentity};

/// One table of a join plan
#[derive(Debug, Clone)]
pub struct JoinStep {
    pub table: TableIdentity,
    pub table_name: String,
    /// `None` for the first table
    pub join_type: Option<JoinType>,
    /// Predicates ANDed in the step's ON clause, never empty for a join
    /// other than CROSS JOIN
    pub predicates: Vec<Relationship>,
}

impl JoinStep {
    fn on_clause(&self, syntax: &dyn JoinSyntax) -> String {
        self.predicates
            .iter()
            .map(|predicate| predicate.to_sql(syntax))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// Ordered join steps, regenerated whenever the graph changes
#[derive(Debug, Clone, Default)]
pub struct JoinPlan {
    steps: Vec<JoinStep>,
}

impl JoinPlan {
    pub(crate) fn new(steps: Vec<JoinStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn tables(&self) -> Vec<&TableIdentity> {
        self.steps.iter().map(|step| &step.table).collect()
    }

    /// Render the nested join clause, without the FROM keyword
    ///
    /// Every join after the first wraps what precedes it in parentheses:
    /// `(a INNER JOIN b ON( .. )) LEFT OUTER JOIN c ON( .. )`.
    pub fn to_sql(&self, syntax: &dyn JoinSyntax) -> String {
        let mut sql = String::new();

        for (i, step) in self.steps.iter().enumerate() {
            let table = syntax.format_table_name(&step.table_name);
            let Some(join_type) = step.join_type else {
                sql.push_str(&table);
                continue;
            };

            if i > 1 {
                sql = format!("({})", sql);
            }
            sql.push(' ');
            sql.push_str(join_type.keyword(syntax));
            sql.push(' ');
            sql.push_str(&table);
            if join_type != JoinType::Cross {
                sql.push_str(" ON( ");
                sql.push_str(&step.on_clause(syntax));
                sql.push_str(" )");
            }
        }

        sql
    }

    /// Structured description of the plan for logs and debugging
    pub fn explain(&self, syntax: &dyn JoinSyntax) -> Value {
        let steps: Vec<Value> = self
            .steps
            .iter()
            .map(|step| {
                json!({
                    "table": step.table,
                    "table_name": step.table_name,
                    "join_type": step.join_type,
                    "predicates": step
                        .predicates
                        .iter()
                        .map(|predicate| predicate.to_sql(syntax))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();

        json!({ "dialect": syntax.name(), "steps": steps })
    }
}
