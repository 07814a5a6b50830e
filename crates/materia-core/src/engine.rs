//! # Query Engine
//!
//! Kind-filtered lookups over an entity's incident relations.
//!
//! - Linear scan over the subject's own incident list, in insertion order
//! - Never follows a relation past its opposite endpoint
//! - Zero matches yield an empty result, never an error
//! - Payloads of the wrong shape are skipped, never reported
//!
//! Kind matching is exact: an entity of kind `Pressure` does not match a
//! query for `ScalarQuantity`. The taxonomy layer offers a separate
//! descendant-inclusive lookup.

use crate::graph::GraphStore;
use crate::query::{Query, QueryResult, QueryType};
use crate::{Entity, EntityId, GraphError, Kind, Relation};

/// The QueryEngine answers kind-filtered questions about one entity.
pub struct QueryEngine;

impl QueryEngine {
    /// Opposite endpoints of every incident relation of kind `relation`.
    pub fn relations<G: GraphStore>(
        graph: &G,
        entity: EntityId,
        relation: &Kind,
    ) -> Result<Vec<EntityId>, GraphError> {
        Ok(incident(graph, entity)?
            .filter(|(r, _)| r.kind() == relation)
            .map(|(_, other)| other)
            .collect())
    }

    /// Opposite endpoint of the last incident relation of kind `relation`.
    ///
    /// "Last" is by incidence order, so re-adding a relation moves it to the end.
    pub fn last_relation<G: GraphStore>(
        graph: &G,
        entity: EntityId,
        relation: &Kind,
    ) -> Result<Option<EntityId>, GraphError> {
        Ok(incident(graph, entity)?
            .filter(|(r, _)| r.kind() == relation)
            .map(|(_, other)| other)
            .last())
    }

    /// Opposite endpoints whose kind is exactly `kind`, over any relation kind.
    pub fn related_objects<G: GraphStore>(
        graph: &G,
        entity: EntityId,
        kind: &Kind,
    ) -> Result<Vec<EntityId>, GraphError> {
        Ok(related_entities(graph, entity, kind)?
            .map(Entity::id)
            .collect())
    }

    /// Real payloads of related holders of kind `kind`.
    pub fn related_scalars<G: GraphStore>(
        graph: &G,
        entity: EntityId,
        kind: &Kind,
    ) -> Result<Vec<f64>, GraphError> {
        Ok(related_entities(graph, entity, kind)?
            .filter_map(|e| e.payload()?.as_real())
            .collect())
    }

    /// Real-sequence payloads of related holders of kind `kind`.
    pub fn related_vectors<G: GraphStore>(
        graph: &G,
        entity: EntityId,
        kind: &Kind,
    ) -> Result<Vec<Vec<f64>>, GraphError> {
        Ok(related_entities(graph, entity, kind)?
            .filter_map(|e| e.payload()?.as_reals().map(<[f64]>::to_vec))
            .collect())
    }

    /// Text payloads of related holders of kind `kind`.
    pub fn related_texts<G: GraphStore>(
        graph: &G,
        entity: EntityId,
        kind: &Kind,
    ) -> Result<Vec<String>, GraphError> {
        Ok(related_entities(graph, entity, kind)?
            .filter_map(|e| e.payload()?.as_text().map(str::to_string))
            .collect())
    }

    /// Execute a structured query.
    pub fn execute<G: GraphStore>(graph: &G, query: &Query) -> Result<QueryResult, GraphError> {
        let subject = query.subject;
        Ok(match &query.query_type {
            QueryType::Relations(k) => QueryResult::Entities(Self::relations(graph, subject, k)?),
            QueryType::LastRelation(k) => {
                QueryResult::Entity(Self::last_relation(graph, subject, k)?)
            }
            QueryType::RelatedObjects(k) => {
                QueryResult::Entities(Self::related_objects(graph, subject, k)?)
            }
            QueryType::Scalars(k) => QueryResult::Scalars(Self::related_scalars(graph, subject, k)?),
            QueryType::Vectors(k) => QueryResult::Vectors(Self::related_vectors(graph, subject, k)?),
            QueryType::Texts(k) => QueryResult::Texts(Self::related_texts(graph, subject, k)?),
        })
    }
}

/// Incident relations of `entity` paired with their opposite endpoint.
pub(crate) fn incident<G: GraphStore>(
    graph: &G,
    entity: EntityId,
) -> Result<impl Iterator<Item = (&Relation, EntityId)>, GraphError> {
    let relations = graph.incident_relations(entity)?;
    Ok(relations.iter().filter_map(move |id| {
        let relation = graph.relation(*id)?;
        let other = relation.opposite(entity)?;
        Some((relation, other))
    }))
}

/// Related entities whose kind is exactly `kind`.
fn related_entities<'g, G: GraphStore>(
    graph: &'g G,
    entity: EntityId,
    kind: &'g Kind,
) -> Result<impl Iterator<Item = &'g Entity>, GraphError> {
    Ok(incident(graph, entity)?
        .filter_map(move |(_, other)| graph.entity(other))
        .filter(move |e| e.kind() == kind))
}

// =============================================================================
// TESTS
// =============================================================================
