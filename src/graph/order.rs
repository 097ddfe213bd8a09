//! Insert ordering over a dependency graph
//!
//! Kahn-style extraction: repeatedly take the first type (in discovery order) with no
//! remaining dependencies, emit it, and drop it from every other dependency set. Whatever is
//! left when no type is ready is returned as the residual graph instead of being an error.

use super::dependency::DependencyGraph;
use crate::entity::EntityType;

/// Result of ordering a dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertPlan {
    /// Types in insertion order: dependencies first, dependents last
    pub order: Vec<EntityType>,
    /// Entries that could not be ordered (cycles, or types depending on them)
    pub residual: DependencyGraph,
}

impl InsertPlan {
    /// `true` when every type in the graph was ordered
    pub fn is_complete(&self) -> bool {
        self.residual.is_empty()
    }

    /// Position of `entity_type` in the order, if it was ordered
    pub fn position(&self, entity_type: &EntityType) -> Option<usize> {
        self.order.iter().position(|t| t == entity_type)
    }
}

/// Order `graph` for insertion, leaving the input untouched
///
/// # Example
///
/// ```
/// use lifeguard_explorer::graph::{solve, DependencyGraph};
///
/// let mut graph = DependencyGraph::new();
/// graph.add_dependency(&"bank_accounts".into(), &"banks".into());
/// graph.add_dependency(&"bank_transactions".into(), &"bank_accounts".into());
///
/// let plan = solve(&graph);
/// let order: Vec<&str> = plan.order.iter().map(|t| t.as_str()).collect();
/// assert_eq!(order, ["banks", "bank_accounts", "bank_transactions"]);
/// assert!(plan.is_complete());
/// ```
pub fn solve(graph: &DependencyGraph) -> InsertPlan {
    let mut remaining = graph.clone();
    let mut order = Vec::with_capacity(remaining.len());

    while let Some(ready) = remaining.first_ready() {
        remaining.remove(&ready);
        order.push(ready);
    }

    if !remaining.is_empty() {
        log::warn!(
            "Some dependencies could not be ordered: {} type(s) left in residual graph",
            remaining.len()
        );
    }

    InsertPlan {
        order,
        residual: remaining,
    }
}

impl DependencyGraph {
    /// Order this graph for insertion; see [`solve`]
    pub fn solve(&self) -> InsertPlan {
        solve(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> EntityType {
        EntityType::from(name)
    }

    fn names(order: &[EntityType]) -> Vec<&str> {
        order.iter().map(EntityType::as_str).collect()
    }

    #[test]
    fn test_solve_simple_chain() {
        let mut graph = DependencyGraph::new();
        graph.ensure(&t("bank_transactions"));
        graph.add_dependency(&t("bank_transactions"), &t("bank_accounts"));
        graph.add_dependency(&t("bank_accounts"), &t("banks"));

        let plan = solve(&graph);
        assert_eq!(names(&plan.order), ["banks", "bank_accounts", "bank_transactions"]);
        assert!(plan.is_complete());
        // input is not consumed
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.ensure(&t("zebras"));
        graph.ensure(&t("apples"));
        graph.ensure(&t("mangoes"));

        let plan = solve(&graph);
        assert_eq!(names(&plan.order), ["zebras", "apples", "mangoes"]);
    }

    #[test]
    fn test_cycle_is_left_in_residual() {
        let mut graph = DependencyGraph::new();
        graph.ensure(&t("root"));
        graph.add_dependency(&t("a"), &t("b"));
        graph.add_dependency(&t("b"), &t("a"));
        graph.add_dependency(&t("c"), &t("a"));

        let plan = solve(&graph);
        assert_eq!(names(&plan.order), ["root"]);
        assert!(!plan.is_complete());
        assert_eq!(names(plan.residual.types()), ["a", "b", "c"]);
        assert!(plan.residual.depends_on(&t("a"), &t("b")));
        assert!(plan.residual.depends_on(&t("b"), &t("a")));
    }

    #[test]
    fn test_order_respects_every_edge() {
        let mut graph = DependencyGraph::new();
        let edges = [
            ("line_items", "orders"),
            ("orders", "customers"),
            ("line_items", "products"),
            ("products", "vendors"),
            ("shipments", "orders"),
            ("customers", "regions"),
        ];
        for (from, to) in edges {
            graph.add_dependency(&t(from), &t(to));
        }

        let plan = solve(&graph);
        assert!(plan.is_complete());
        assert_eq!(plan.order.len(), graph.len());
        for (from, to) in edges {
            let from_idx = plan.position(&t(from)).unwrap();
            let to_idx = plan.position(&t(to)).unwrap();
            assert!(to_idx < from_idx, "{to} must precede {from}");
        }
    }

    #[test]
    fn test_solving_an_empty_graph_is_idempotent() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(&t("orders"), &t("customers"));
        let first = solve(&graph);
        assert!(first.residual.is_empty());

        let again = solve(&first.residual);
        assert!(again.order.is_empty());
        assert!(again.residual.is_empty());
    }
}
