//! # Graph Metrics
//!
//! Informational counts over a graph. Nothing in the kernel branches on them.

use crate::graph::{Graph, GraphStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary metrics of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Total number of entities.
    pub entity_count: usize,
    /// Total number of relation records, linked or not.
    pub relation_count: usize,
    /// Relation records still listed by at least one endpoint.
    pub linked_relation_count: usize,
    /// Entities carrying a payload.
    pub holder_count: usize,
    /// Largest incident list of any entity.
    pub max_degree: usize,
    /// Entity count per kind tag, in name order.
    pub kinds: BTreeMap<String, usize>,
}

impl GraphMetrics {
    /// Create new metrics with all zeros.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute metrics from a graph.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let mut kinds = BTreeMap::new();
        let mut holder_count = 0usize;
        let mut max_degree = 0usize;

        for entity in graph.entities() {
            *kinds.entry(entity.class_name().to_string()).or_insert(0usize) += 1;
            if entity.is_holder() {
                holder_count = holder_count.saturating_add(1);
            }
            max_degree = max_degree.max(entity.relations().len());
        }

        Self {
            entity_count: graph.entity_count(),
            relation_count: graph.relation_count(),
            linked_relation_count: graph.linked_relation_count(),
            holder_count,
            max_degree,
            kinds,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kind, Payload};

    #[test]
    fn empty_graph_metrics() {
        assert_eq!(GraphMetrics::from_graph(&Graph::new()), GraphMetrics::empty());
    }

    #[test]
    fn metrics_count_holders_and_kinds() {
        let mut graph = Graph::new();
        let gas = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let t = graph
            .insert_holder(Kind::new("Scalar"), Payload::Real(300.0))
            .expect("insert");
        let u = graph
            .insert_holder(Kind::new("Unit"), Payload::Text("K".into()))
            .expect("insert");
        let rels = graph
            .create_relations_to(&Kind::new("hasPart"), gas, &[t, u])
            .expect("link");
        graph.unlink_relation(rels[0]).expect("unlink");

        let metrics = GraphMetrics::from_graph(&graph);
        assert_eq!(metrics.entity_count, 3);
        assert_eq!(metrics.relation_count, 2);
        assert_eq!(metrics.linked_relation_count, 1);
        assert_eq!(metrics.holder_count, 2);
        assert_eq!(metrics.max_degree, 1);
        assert_eq!(metrics.kinds.get("Scalar"), Some(&1));
    }
}
