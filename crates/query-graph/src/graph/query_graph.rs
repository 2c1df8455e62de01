//! Query graph - tables of one logical query and the relationships between them

use std::collections::{HashMap, HashSet};

use super::entity::EntityRef;
use super::identity::TableIdentity;
use super::node::GraphNode;
use super::relationship::Relationship;
use crate::config::PlannerConfig;
use crate::error::JoinResult;
use crate::joins::JoinPlanner;

/// Unordered pair of tables, used to key edge predicates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey(TableIdentity, TableIdentity);

impl EdgeKey {
    fn new(a: &TableIdentity, b: &TableIdentity) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

/// Graph of the tables taking part in one query
///
/// Tables are added as required (inner join) or optional (outer join) in any
/// order. The graph answers whether every table can be reached from a start
/// table and produces the table order the join planner emits.
#[derive(Debug, Clone, Default)]
pub struct QueryGraph {
    nodes: HashMap<TableIdentity, GraphNode>,
    /// Node insertion order
    order: Vec<TableIdentity>,
    representatives: HashMap<TableIdentity, EntityRef>,
    /// SQL names of tables that only appeared through a relationship
    names: HashMap<TableIdentity, String>,
    edges: HashMap<EdgeKey, Vec<Relationship>>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entities and explicit relationships to the graph
    ///
    /// New tables get a node with the given `required` flag; tables already
    /// in the graph keep the flag they were first added with. Every added
    /// entity is checked against every entity already present, so tables
    /// added in earlier calls get connected to the new ones.
    pub fn add(&mut self, entities: &[EntityRef], relationships: &[Relationship], required: bool) {
        let mut touched: Vec<TableIdentity> = Vec::new();

        for entity in entities {
            let id = entity.table_identity();
            self.ensure_node(&id, required);
            self.representatives
                .entry(id.clone())
                .or_insert_with(|| entity.clone());
            if !touched.contains(&id) {
                touched.push(id);
            }
        }

        for id in &touched {
            self.connect_implicit(id);
        }

        for relationship in relationships {
            self.add_relationship(relationship, required);
        }
    }

    /// Add entities joined as inner joins
    pub fn add_required(&mut self, entities: &[EntityRef], relationships: &[Relationship]) {
        self.add(entities, relationships, true);
    }

    /// Add entities joined as outer joins
    pub fn add_optional(&mut self, entities: &[EntityRef], relationships: &[Relationship]) {
        self.add(entities, relationships, false);
    }

    /// Reset the graph for reuse
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.representatives.clear();
        self.names.clear();
        self.edges.clear();
    }

    fn ensure_node(&mut self, id: &TableIdentity, required: bool) {
        if self.nodes.contains_key(id) {
            return;
        }
        tracing::debug!(
            "Adding {} table '{}' to query graph",
            if required { "required" } else { "optional" },
            id
        );
        self.nodes.insert(id.clone(), GraphNode::new(id.clone(), required));
        self.order.push(id.clone());
    }

    /// Connect `id` to every other represented table its entity joins to
    fn connect_implicit(&mut self, id: &TableIdentity) {
        let Some(entity) = self.representatives.get(id).cloned() else {
            return;
        };

        let others: Vec<EntityRef> = self
            .order
            .iter()
            .filter(|other| *other != id)
            .filter_map(|other| self.representatives.get(other).cloned())
            .collect();

        for other in others {
            if !entity.will_join_to(other.as_ref()) && !other.will_join_to(entity.as_ref()) {
                continue;
            }
            let other_id = other.table_identity();
            self.connect(id, &other_id);

            let implied: Vec<Relationship> = entity
                .relationships_as_predicates(other.as_ref())
                .into_iter()
                .chain(other.relationships_as_predicates(entity.as_ref()))
                .collect();
            if implied.is_empty() {
                tracing::warn!(
                    "'{}' and '{}' join to each other without any predicate",
                    id,
                    other_id
                );
            }
            for relationship in &implied {
                self.record(id, &other_id, relationship);
            }
        }
    }

    fn add_relationship(&mut self, relationship: &Relationship, required: bool) {
        let sides = relationship.sides();
        for side in sides {
            if !self.nodes.contains_key(side) {
                tracing::warn!(
                    "Relationship '{}' references table '{}' that was not added; adding it",
                    relationship.key(),
                    side
                );
                self.ensure_node(side, required);
            }
            if !self.representatives.contains_key(side) && !self.names.contains_key(side) {
                if let Some(name) = relationship.table_name(side) {
                    self.names.insert(side.clone(), name.to_string());
                }
            }
        }

        for (i, a) in sides.iter().enumerate() {
            for b in &sides[i + 1..] {
                self.connect(a, b);
                self.record(a, b, relationship);
            }
        }
    }

    fn connect(&mut self, a: &TableIdentity, b: &TableIdentity) {
        if a == b {
            return;
        }
        let mut added = false;
        if let Some(node) = self.nodes.get_mut(a) {
            added |= node.connect(b.clone());
        }
        if let Some(node) = self.nodes.get_mut(b) {
            added |= node.connect(a.clone());
        }
        if added {
            tracing::trace!("Connected '{}' and '{}'", a, b);
        }
    }

    fn record(&mut self, a: &TableIdentity, b: &TableIdentity, relationship: &Relationship) {
        let predicates = self.edges.entry(EdgeKey::new(a, b)).or_default();
        if !predicates.iter().any(|known| known.key() == relationship.key()) {
            predicates.push(relationship.clone());
        }
    }

    pub fn node(&self, id: &TableIdentity) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &TableIdentity) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tables in the order they were added
    pub fn tables(&self) -> &[TableIdentity] {
        &self.order
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// The first entity seen for a table
    pub fn representative(&self, id: &TableIdentity) -> Option<&EntityRef> {
        self.representatives.get(id)
    }

    /// Table name used in SQL
    ///
    /// Tables that only appeared through a relationship use the name its
    /// column references carry, or the identity for a raw relationship.
    pub fn table_name(&self, id: &TableIdentity) -> String {
        if let Some(entity) = self.representatives.get(id) {
            return entity.table_name().to_string();
        }
        self.names.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn is_required(&self, id: &TableIdentity) -> bool {
        self.nodes.get(id).is_some_and(GraphNode::is_required)
    }

    /// Every relationship recorded between two tables, in recording order
    pub fn relationships_between(&self, a: &TableIdentity, b: &TableIdentity) -> &[Relationship] {
        self.edges
            .get(&EdgeKey::new(a, b))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Relationships between `table` and `other` that can be rendered once
    /// `table` is joined after every table in `placed`
    pub fn ready_relationships<'g, P>(
        &'g self,
        table: &'g TableIdentity,
        other: &TableIdentity,
        placed: P,
    ) -> impl Iterator<Item = &'g Relationship> + 'g
    where
        P: Fn(&TableIdentity) -> bool + 'g,
    {
        self.relationships_between(table, other)
            .iter()
            .filter(move |relationship| {
                relationship
                    .sides()
                    .iter()
                    .all(|side| side == table || placed(side))
            })
    }

    /// Whether `table` has a predicate towards `seen` it can be joined on
    fn joinable(&self, table: &TableIdentity, seen: &HashSet<TableIdentity>) -> bool {
        self.neighbours(table)
            .iter()
            .filter(|other| seen.contains(*other))
            .any(|other| {
                self.ready_relationships(table, other, |side| seen.contains(side))
                    .next()
                    .is_some()
            })
    }

    /// Table a join plan should start from
    ///
    /// Required tables win over optional ones; among the candidates a table
    /// the caller filters on wins; otherwise the first added candidate.
    pub fn choose_start_table(&self) -> Option<TableIdentity> {
        let any_required = self.nodes.values().any(GraphNode::is_required);
        let candidates: Vec<&TableIdentity> = self
            .order
            .iter()
            .filter(|id| !any_required || self.is_required(id))
            .collect();

        candidates
            .iter()
            .find(|id| {
                self.representatives
                    .get(**id)
                    .is_some_and(|entity| entity.has_conditions_set())
            })
            .or_else(|| candidates.first())
            .map(|id| (*id).clone())
    }

    /// Tables reachable from `start`, in discovery order
    ///
    /// Required neighbours are followed to a fixpoint before any optional
    /// neighbour is admitted, and every admitted optional table re-seeds the
    /// required expansion. A neighbour is only reached once one of its
    /// predicates references nothing but discovered tables, so every table
    /// after the first can be joined with a real ON clause. Tables outside
    /// the component of `start` are never returned.
    pub fn linearize(&self, start: &TableIdentity) -> Vec<TableIdentity> {
        let mut discovered: Vec<TableIdentity> = Vec::new();
        let mut seen: HashSet<TableIdentity> = HashSet::new();
        if !self.nodes.contains_key(start) {
            return discovered;
        }
        seen.insert(start.clone());
        discovered.push(start.clone());

        loop {
            // repeat while a deferred multi-table predicate becomes ready
            while self.expand(&mut discovered, &mut seen, true) {}

            if !self.expand(&mut discovered, &mut seen, false) {
                break;
            }
        }

        tracing::trace!("Linearized from '{}': {:?}", start, discovered);
        discovered
    }

    /// [`linearize`](Self::linearize) read from the last discovered table
    pub fn linearize_reversed(&self, start: &TableIdentity) -> Vec<TableIdentity> {
        let mut order = self.linearize(start);
        order.reverse();
        order
    }

    /// Every table in the graph, one connected component after another
    pub fn linearize_all(&self) -> Vec<TableIdentity> {
        let mut covered: Vec<TableIdentity> = Vec::with_capacity(self.order.len());
        let mut seen: HashSet<TableIdentity> = HashSet::new();

        let starts = self.choose_start_table().into_iter().chain(self.order.iter().cloned());
        for start in starts {
            if seen.contains(&start) {
                continue;
            }
            for table in self.linearize(&start) {
                if seen.insert(table.clone()) {
                    covered.push(table);
                }
            }
        }
        covered
    }

    /// Whether joining every table needs a cartesian product
    pub fn has_cartesian_join(&self) -> bool {
        match self.choose_start_table() {
            Some(start) => self.linearize(&start).len() < self.nodes.len(),
            None => false,
        }
    }

    /// Tables not reachable from the start table
    pub fn disconnected_tables(&self) -> Vec<TableIdentity> {
        let Some(start) = self.choose_start_table() else {
            return Vec::new();
        };
        let reachable: HashSet<TableIdentity> = self.linearize(&start).into_iter().collect();
        self.order
            .iter()
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect()
    }

    /// Whether every table was added as optional
    pub fn is_full_outer_join(&self) -> bool {
        !self.nodes.is_empty() && !self.nodes.values().any(GraphNode::is_required)
    }

    /// Build the join clause for the whole graph
    ///
    /// Fails on a cartesian join unless the configuration allows it.
    pub fn join_clause(&self, config: &PlannerConfig) -> JoinResult<String> {
        JoinPlanner::new(self, &config.dialect)
            .with_config(config.clone())
            .build_graph_clause()
    }

    /// One pass over `discovered`, admitting joinable neighbours
    fn expand(
        &self,
        discovered: &mut Vec<TableIdentity>,
        seen: &mut HashSet<TableIdentity>,
        required_only: bool,
    ) -> bool {
        let before = discovered.len();
        // optional tables only extend the tables found before the pass
        let limit = if required_only { usize::MAX } else { before };
        let mut cursor = 0;
        while cursor < discovered.len().min(limit) {
            let current = discovered[cursor].clone();
            for next in self.neighbours(&current) {
                if seen.contains(next) || (required_only && !self.is_required(next)) {
                    continue;
                }
                if self.joinable(next, seen) {
                    seen.insert(next.clone());
                    discovered.push(next.clone());
                }
            }
            cursor += 1;
        }
        discovered.len() > before
    }

    fn neighbours(&self, id: &TableIdentity) -> &[TableIdentity] {
        self.nodes
            .get(id)
            .map(GraphNode::connected)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ColumnRef;
    use crate::schema::{ForeignKey, TableDescriptor};

    fn table(name: &str) -> EntityRef {
        TableDescriptor::new(name).with_primary_key(&format!("uid_{}", name)).into_ref()
    }

    fn child_of(name: &str, parent: &str) -> EntityRef {
        TableDescriptor::new(name)
            .with_primary_key(&format!("uid_{}", name))
            .with_foreign_key(ForeignKey::simple(
                &format!("fk_{}", parent),
                parent,
                &format!("uid_{}", parent),
            ))
            .into_ref()
    }

    fn id(name: &str) -> TableIdentity {
        TableIdentity::new(name)
    }

    fn assert_symmetric(graph: &QueryGraph) {
        for node in graph.nodes() {
            for other in node.connected() {
                let back = graph.node(other).expect("connected node exists");
                assert!(
                    back.is_connected_to(node.id()),
                    "'{}' -> '{}' is not mirrored",
                    node.id(),
                    other
                );
            }
        }
    }

    #[test]
    fn test_foreign_keys_connect_nodes_symmetrically() {
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company"), child_of("marque", "company")], &[]);

        assert_eq!(graph.node_count(), 2);
        assert!(graph.node(&id("company")).unwrap().is_connected_to(&id("marque")));
        assert_symmetric(&graph);
        assert_eq!(graph.relationships_between(&id("marque"), &id("company")).len(), 1);
    }

    #[test]
    fn test_incremental_add_connects_to_earlier_tables() {
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company")], &[]);
        graph.add_optional(&[child_of("marque", "company")], &[]);

        assert!(graph.node(&id("marque")).unwrap().is_connected_to(&id("company")));
        assert!(!graph.is_required(&id("marque")));
        assert_symmetric(&graph);
    }

    #[test]
    fn test_add_is_idempotent() {
        let entities = [table("company"), child_of("marque", "company")];
        let extra = Relationship::equals(
            ColumnRef::new("company", "name"),
            ColumnRef::new("marque", "name"),
        )
        .unwrap();

        let mut once = QueryGraph::new();
        once.add_required(&entities, &[extra.clone()]);

        let mut twice = QueryGraph::new();
        twice.add_required(&entities, &[extra.clone()]);
        twice.add_required(&entities, &[extra]);

        assert_eq!(once.tables(), twice.tables());
        for table in once.tables() {
            assert_eq!(once.node(table), twice.node(table));
        }
        assert_eq!(
            once.relationships_between(&id("company"), &id("marque")),
            twice.relationships_between(&id("company"), &id("marque"))
        );
        assert_eq!(twice.relationships_between(&id("company"), &id("marque")).len(), 2);
    }

    #[test]
    fn test_required_flag_is_fixed_on_first_add() {
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company")], &[]);
        graph.add_optional(&[table("company")], &[]);
        graph.add_optional(&[table("logo")], &[]);
        graph.add_required(&[table("logo")], &[]);

        assert!(graph.is_required(&id("company")));
        assert!(!graph.is_required(&id("logo")));
    }

    #[test]
    fn test_first_entity_becomes_representative() {
        let filtered = TableDescriptor::new("company").with_conditions(true).into_ref();
        let plain = TableDescriptor::new("company").into_ref();

        let mut graph = QueryGraph::new();
        graph.add_required(&[filtered, plain], &[]);

        assert_eq!(graph.node_count(), 1);
        assert!(graph.representative(&id("company")).unwrap().has_conditions_set());
    }

    #[test]
    fn test_relationship_to_unknown_table_adds_node() {
        let rel = Relationship::equals(
            ColumnRef::new("company", "country"),
            ColumnRef::new("country", "code"),
        )
        .unwrap();

        let mut graph = QueryGraph::new();
        graph.add_optional(&[table("company")], &[rel]);

        assert!(graph.contains(&id("country")));
        assert!(!graph.is_required(&id("country")));
        assert!(graph.representative(&id("country")).is_none());
        assert_eq!(graph.table_name(&id("country")), "country");
        assert!(!graph.has_cartesian_join());
    }

    #[test]
    fn test_relationship_only_table_uses_column_table_name() {
        struct Country;
        let rel = Relationship::equals(
            ColumnRef::new("company", "country"),
            ColumnRef::for_table(TableIdentity::of::<Country>(), "country", "code"),
        )
        .unwrap();

        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company")], &[rel]);

        assert_eq!(graph.table_name(&TableIdentity::of::<Country>()), "country");
        assert_eq!(
            graph.join_clause(&PlannerConfig::default()).unwrap(),
            "company INNER JOIN country ON( COMPANY.COUNTRY = COUNTRY.CODE )"
        );

        graph.clear();
        assert_eq!(
            graph.table_name(&TableIdentity::of::<Country>()),
            TableIdentity::of::<Country>().to_string()
        );
    }

    #[test]
    fn test_multi_table_relationship_connects_every_pair() {
        let rel = Relationship::raw(
            "window",
            vec![id("a"), id("b"), id("c")],
            |syntax: &dyn crate::backends::JoinSyntax| {
                format!("{} < {}", syntax.format_column_name("a", "x"), syntax.format_column_name("c", "x"))
            },
        )
        .unwrap();

        let mut graph = QueryGraph::new();
        graph.add_required(&[table("a"), table("b"), table("c")], &[rel]);

        assert_eq!(graph.node(&id("a")).unwrap().connected(), &[id("b"), id("c")]);
        assert_eq!(graph.node(&id("b")).unwrap().connected(), &[id("a"), id("c")]);
        assert_symmetric(&graph);
    }

    #[test]
    fn test_start_table_prefers_required_then_filtered() {
        let mut graph = QueryGraph::new();
        graph.add_optional(
            &[TableDescriptor::new("logo").with_conditions(true).into_ref()],
            &[],
        );
        graph.add_required(&[table("company"), child_of("marque", "company")], &[]);
        assert_eq!(graph.choose_start_table(), Some(id("company")));

        graph.add_required(
            &[TableDescriptor::new("link").with_conditions(true).into_ref()],
            &[],
        );
        assert_eq!(graph.choose_start_table(), Some(id("link")));
    }

    #[test]
    fn test_start_table_among_optional_tables() {
        let mut graph = QueryGraph::new();
        graph.add_optional(&[table("company"), child_of("marque", "company")], &[]);
        assert_eq!(graph.choose_start_table(), Some(id("company")));
        assert!(graph.is_full_outer_join());

        assert_eq!(QueryGraph::new().choose_start_table(), None);
    }

    #[test]
    fn test_linearize_prefers_required_routes() {
        // company -(opt) marque, company - link (req), link - logo (req)
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company")], &[]);
        graph.add_optional(&[child_of("marque", "company")], &[]);
        graph.add_required(&[child_of("link", "company"), child_of("logo", "link")], &[]);

        assert_eq!(
            graph.linearize(&id("company")),
            vec![id("company"), id("link"), id("logo"), id("marque")]
        );
    }

    #[test]
    fn test_linearize_passes_through_optional_tables() {
        // company (req) - marque (opt) - model (req)
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company")], &[]);
        graph.add_optional(&[child_of("marque", "company")], &[]);
        graph.add_required(&[child_of("model", "marque")], &[]);

        let order = graph.linearize(&id("company"));
        assert_eq!(order, vec![id("company"), id("marque"), id("model")]);
        assert_eq!(graph.linearize_reversed(&id("company")).first(), Some(&id("model")));
    }

    #[test]
    fn test_linearize_defers_table_until_its_predicate_is_ready() {
        let window = Relationship::raw(
            "logo_in_link_window",
            vec![id("company"), id("logo"), id("link")],
            |syntax: &dyn crate::backends::JoinSyntax| {
                format!(
                    "{} > {}",
                    syntax.format_column_name("logo", "created"),
                    syntax.format_column_name("link", "created")
                )
            },
        )
        .unwrap();

        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company"), table("logo")], &[window]);
        assert!(graph.has_cartesian_join());

        graph.add_required(&[child_of("link", "company")], &[]);
        assert_eq!(graph.node(&id("company")).unwrap().connected(), &[id("logo"), id("link")]);
        assert_eq!(
            graph.linearize(&id("company")),
            vec![id("company"), id("link"), id("logo")]
        );
        assert!(!graph.has_cartesian_join());
    }

    #[test]
    fn test_linearize_covers_connected_graph_from_any_start() {
        let mut graph = QueryGraph::new();
        graph.add_required(
            &[
                table("company"),
                child_of("marque", "company"),
                child_of("link", "company"),
                child_of("logo", "link"),
            ],
            &[],
        );

        for start in graph.tables() {
            assert_eq!(graph.linearize(start).len(), graph.node_count());
        }
    }

    #[test]
    fn test_linearize_terminates_on_cycles() {
        let ab = Relationship::equals(ColumnRef::new("a", "x"), ColumnRef::new("b", "x")).unwrap();
        let bc = Relationship::equals(ColumnRef::new("b", "y"), ColumnRef::new("c", "y")).unwrap();
        let ca = Relationship::equals(ColumnRef::new("c", "z"), ColumnRef::new("a", "z")).unwrap();

        let mut graph = QueryGraph::new();
        graph.add_optional(&[table("a"), table("b"), table("c")], &[ab, bc, ca]);

        assert_eq!(graph.linearize(&id("b")), vec![id("b"), id("a"), id("c")]);
        assert_eq!(graph.linearize(&id("missing")), Vec::<TableIdentity>::new());
    }

    #[test]
    fn test_cartesian_join_detection() {
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company"), child_of("marque", "company")], &[]);
        graph.add_required(&[table("logo"), child_of("link", "logo")], &[]);

        assert!(graph.has_cartesian_join());
        assert_eq!(graph.disconnected_tables(), vec![id("logo"), id("link")]);

        let bridge = Relationship::equals(
            ColumnRef::new("marque", "uid_marque"),
            ColumnRef::new("link", "fk_marque"),
        )
        .unwrap();
        graph.add_required(&[], &[bridge]);

        assert!(!graph.has_cartesian_join());
        assert!(graph.disconnected_tables().is_empty());
    }

    #[test]
    fn test_linearize_all_covers_every_component() {
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company"), child_of("marque", "company")], &[]);
        graph.add_optional(&[table("logo"), child_of("link", "logo")], &[]);

        assert_eq!(
            graph.linearize_all(),
            vec![id("company"), id("marque"), id("logo"), id("link")]
        );
    }

    #[test]
    fn test_full_outer_detection() {
        let mut graph = QueryGraph::new();
        assert!(!graph.is_full_outer_join());

        graph.add_optional(&[table("company")], &[]);
        assert!(graph.is_full_outer_join());

        graph.add_required(&[table("marque")], &[]);
        assert!(!graph.is_full_outer_join());
    }

    #[test]
    fn test_clear_resets_graph() {
        let mut graph = QueryGraph::new();
        graph.add_required(&[table("company"), child_of("marque", "company")], &[]);
        graph.clear();

        assert!(graph.is_empty());
        assert!(graph.tables().is_empty());
        assert!(graph.representative(&id("company")).is_none());
        assert!(graph.relationships_between(&id("company"), &id("marque")).is_empty());
        assert!(!graph.has_cartesian_join());
    }
}
