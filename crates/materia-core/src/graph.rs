//! # Graph Kernel
//!
//! Entity identity and relation lifecycle for Materia.
//!
//! This module implements the `GraphStore` trait over an in-memory arena.
//! Entities and relations live in `BTreeMap`s keyed by monotonically issued
//! handles and are never freed during a run, so a handle never dangles and
//! cycles are safe to hold. Unregistering a relation from an entity does not
//! destroy the relation record.

use crate::{Entity, EntityId, GraphError, Kind, Payload, Relation, RelationId};
use std::collections::BTreeMap;
use tracing::{debug, trace};

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the kernel's mutation and lookup operations.
///
/// Every operation is synchronous. Mutating an entity's incident list
/// requires `&mut self`, so there is a single mutator at a time.
pub trait GraphStore {
    /// Insert a plain entity of the given kind. Returns its handle.
    fn insert_entity(&mut self, kind: Kind) -> Result<EntityId, GraphError>;

    /// Insert a typed value holder carrying an immutable payload.
    fn insert_holder(&mut self, kind: Kind, payload: Payload) -> Result<EntityId, GraphError>;

    /// Construct one relation `(from, to)` and register it on both endpoints.
    ///
    /// Both endpoints are checked before anything is constructed; a missing
    /// endpoint leaves the graph untouched.
    fn create_relation_to(
        &mut self,
        kind: &Kind,
        from: EntityId,
        to: EntityId,
    ) -> Result<RelationId, GraphError>;

    /// Link `from` to every entity in `targets`, in input order.
    ///
    /// There is no rollback: if one link fails, links already created for
    /// earlier targets remain and the error is returned.
    fn create_relations_to(
        &mut self,
        kind: &Kind,
        from: EntityId,
        targets: &[EntityId],
    ) -> Result<Vec<RelationId>, GraphError> {
        let mut created = Vec::with_capacity(targets.len());
        for &target in targets {
            created.push(self.create_relation_to(kind, from, target)?);
        }
        Ok(created)
    }

    /// Append `relation` to `entity`'s incident list.
    ///
    /// Returns `false` if it was already listed (the list holds each handle
    /// at most once). The opposite endpoint is not touched.
    fn add_relation(&mut self, entity: EntityId, relation: RelationId)
    -> Result<bool, GraphError>;

    /// Remove `relation` from `entity`'s incident list.
    ///
    /// Exactly the matching record is removed and the order of the rest is
    /// preserved. Returns `false` (and changes nothing) if it was not listed.
    fn remove_relation(
        &mut self,
        entity: EntityId,
        relation: RelationId,
    ) -> Result<bool, GraphError>;

    /// Lookup an entity by handle.
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Lookup a relation by handle.
    fn relation(&self, id: RelationId) -> Option<&Relation>;

    /// The ordered incident relations of an entity.
    fn incident_relations(&self, id: EntityId) -> Result<&[RelationId], GraphError> {
        self.entity(id)
            .map(Entity::relations)
            .ok_or(GraphError::EntityNotFound(id))
    }

    /// Get the total number of entities.
    fn entity_count(&self) -> usize;

    /// Get the total number of relation records (linked or not).
    fn relation_count(&self) -> usize;
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The in-memory entity-relation arena.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Entity storage: EntityId -> Entity
    entities: BTreeMap<EntityId, Entity>,

    /// Relation storage: RelationId -> Relation
    relations: BTreeMap<RelationId, Relation>,

    /// Next available EntityId
    next_entity_id: u64,

    /// Next available RelationId
    next_relation_id: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from already-validated parts, preserving handles.
    pub(crate) fn from_parts(
        entities: BTreeMap<EntityId, Entity>,
        relations: BTreeMap<RelationId, Relation>,
        next_entity_id: u64,
        next_relation_id: u64,
    ) -> Self {
        Self {
            entities,
            relations,
            next_entity_id,
            next_relation_id,
        }
    }

    /// Get all entities in handle order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Get all relation records in handle order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// Get the next entity handle that would be issued.
    #[must_use]
    pub fn next_entity_id(&self) -> u64 {
        self.next_entity_id
    }

    /// Get the next relation handle that would be issued.
    #[must_use]
    pub fn next_relation_id(&self) -> u64 {
        self.next_relation_id
    }

    #[must_use]
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// The endpoint of `relation` opposite to `entity`.
    pub fn opposite(&self, relation: RelationId, entity: EntityId) -> Result<EntityId, GraphError> {
        let record = self
            .relations
            .get(&relation)
            .ok_or(GraphError::RelationNotFound(relation))?;
        record
            .opposite(entity)
            .ok_or(GraphError::NotAnEndpoint(entity, relation))
    }

    /// Whether at least one endpoint still lists the relation.
    pub fn is_linked(&self, relation: RelationId) -> Result<bool, GraphError> {
        let record = self
            .relations
            .get(&relation)
            .ok_or(GraphError::RelationNotFound(relation))?;
        Ok([record.first(), record.second()].iter().any(|endpoint| {
            self.entities
                .get(endpoint)
                .is_some_and(|e| e.has_relation(relation))
        }))
    }

    /// Unregister a relation from both of its endpoints.
    ///
    /// Returns the number of incident records removed (0, 1 or 2).
    pub fn unlink_relation(&mut self, relation: RelationId) -> Result<usize, GraphError> {
        let (first, second) = {
            let record = self
                .relations
                .get(&relation)
                .ok_or(GraphError::RelationNotFound(relation))?;
            (record.first(), record.second())
        };

        let mut removed = usize::from(self.remove_relation(first, relation)?);
        if second != first {
            removed += usize::from(self.remove_relation(second, relation)?);
        }
        Ok(removed)
    }

    /// Count relation records still listed by at least one endpoint.
    #[must_use]
    pub fn linked_relation_count(&self) -> usize {
        self.relations
            .keys()
            .filter(|id| self.is_linked(**id).unwrap_or(false))
            .count()
    }

    fn issue_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        id
    }

    fn issue_relation_id(&mut self) -> RelationId {
        let id = RelationId(self.next_relation_id);
        self.next_relation_id = self.next_relation_id.saturating_add(1);
        id
    }

    fn check_kind(kind: &Kind) -> Result<(), GraphError> {
        if kind.is_valid() {
            Ok(())
        } else {
            Err(GraphError::InvalidKind(kind.as_str().to_string()))
        }
    }
}

impl GraphStore for Graph {
    fn insert_entity(&mut self, kind: Kind) -> Result<EntityId, GraphError> {
        Self::check_kind(&kind)?;
        let id = self.issue_entity_id();
        trace!(entity = %id, kind = %kind, "entity inserted");
        self.entities.insert(id, Entity::new(id, kind));
        Ok(id)
    }

    fn insert_holder(&mut self, kind: Kind, payload: Payload) -> Result<EntityId, GraphError> {
        Self::check_kind(&kind)?;
        let id = self.issue_entity_id();
        trace!(entity = %id, kind = %kind, shape = %payload.shape(), "value holder inserted");
        self.entities.insert(id, Entity::holder(id, kind, payload));
        Ok(id)
    }

    fn create_relation_to(
        &mut self,
        kind: &Kind,
        from: EntityId,
        to: EntityId,
    ) -> Result<RelationId, GraphError> {
        Self::check_kind(kind)?;
        // Refuse half-linked edges: both endpoints must exist first.
        for endpoint in [from, to] {
            if !self.entities.contains_key(&endpoint) {
                return Err(GraphError::EntityNotFound(endpoint));
            }
        }

        let id = self.issue_relation_id();
        self.relations
            .insert(id, Relation::new(id, kind.clone(), from, to));

        self.add_relation(from, id)?;
        if to != from {
            self.add_relation(to, id)?;
        }

        trace!(relation = %id, kind = %kind, from = %from, to = %to, "relation created");
        Ok(id)
    }

    fn add_relation(
        &mut self,
        entity: EntityId,
        relation: RelationId,
    ) -> Result<bool, GraphError> {
        let record = self
            .relations
            .get(&relation)
            .ok_or(GraphError::RelationNotFound(relation))?;
        if !record.touches(entity) {
            return Err(GraphError::NotAnEndpoint(entity, relation));
        }
        let target = self
            .entities
            .get_mut(&entity)
            .ok_or(GraphError::EntityNotFound(entity))?;
        Ok(target.push_relation(relation))
    }

    fn remove_relation(
        &mut self,
        entity: EntityId,
        relation: RelationId,
    ) -> Result<bool, GraphError> {
        let target = self
            .entities
            .get_mut(&entity)
            .ok_or(GraphError::EntityNotFound(entity))?;
        let removed = target.erase_relation(relation);
        if removed {
            debug!(entity = %entity, relation = %relation, "relation unregistered");
        }
        Ok(removed)
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn relation_count(&self) -> usize {
        self.relations.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn has_part() -> Kind {
        Kind::new("hasPart")
    }

    #[test]
    fn insert_entities_issue_distinct_handles() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Gas")).expect("insert");

        assert_ne!(a, b);
        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.entity(a).map(Entity::class_name), Some("Gas"));
    }

    #[test]
    fn blank_kind_rejected() {
        let mut graph = Graph::new();
        let result = graph.insert_entity(Kind::new(" "));
        assert!(matches!(result, Err(GraphError::InvalidKind(_))));
        assert_eq!(graph.entity_count(), 0);
    }

    #[test]
    fn create_relation_registers_both_endpoints() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Pressure")).expect("insert");

        let r = graph.create_relation_to(&has_part(), a, b).expect("link");

        assert_eq!(graph.incident_relations(a).expect("a"), &[r]);
        assert_eq!(graph.incident_relations(b).expect("b"), &[r]);
        let record = graph.relation(r).expect("relation");
        assert_eq!(record.first(), a);
        assert_eq!(record.second(), b);
        assert_eq!(record.class_name(), "hasPart");
    }

    #[test]
    fn create_relation_with_missing_endpoint_registers_nothing() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");

        let result = graph.create_relation_to(&has_part(), a, EntityId(99));

        assert!(matches!(result, Err(GraphError::EntityNotFound(EntityId(99)))));
        assert_eq!(graph.relation_count(), 0);
        assert!(graph.incident_relations(a).expect("a").is_empty());
    }

    #[test]
    fn self_relation_listed_once() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("State")).expect("insert");

        let r = graph.create_relation_to(&has_part(), a, a).expect("link");

        assert_eq!(graph.incident_relations(a).expect("a"), &[r]);
        assert_eq!(graph.opposite(r, a).expect("opposite"), a);
    }

    #[test]
    fn batch_link_stops_without_rollback() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Atom")).expect("insert");

        let result = graph.create_relations_to(&has_part(), a, &[b, EntityId(42), b]);

        assert!(result.is_err());
        // The first link survives; nothing after the failure was attempted.
        assert_eq!(graph.incident_relations(a).expect("a").len(), 1);
        assert_eq!(graph.relation_count(), 1);
    }

    #[test]
    fn add_relation_rejects_non_endpoint() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Atom")).expect("insert");
        let c = graph.insert_entity(Kind::new("Atom")).expect("insert");
        let r = graph.create_relation_to(&has_part(), a, b).expect("link");

        let result = graph.add_relation(c, r);
        assert!(matches!(result, Err(GraphError::NotAnEndpoint(_, _))));
    }

    #[test]
    fn add_relation_restores_after_removal() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Atom")).expect("insert");
        let r = graph.create_relation_to(&has_part(), a, b).expect("link");

        assert!(!graph.add_relation(a, r).expect("duplicate add"));
        assert!(graph.remove_relation(a, r).expect("remove"));
        assert!(graph.add_relation(a, r).expect("re-add"));
        assert_eq!(graph.incident_relations(a).expect("a"), &[r]);
    }

    #[test]
    fn remove_relation_preserves_order() {
        let mut graph = Graph::new();
        let hub = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let parts: Vec<_> = (0..3)
            .map(|_| graph.insert_entity(Kind::new("Atom")).expect("insert"))
            .collect();
        let rels = graph
            .create_relations_to(&has_part(), hub, &parts)
            .expect("link");

        assert!(graph.remove_relation(hub, rels[1]).expect("remove"));
        assert_eq!(
            graph.incident_relations(hub).expect("hub"),
            &[rels[0], rels[2]]
        );
    }

    #[test]
    fn remove_absent_relation_is_noop() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Atom")).expect("insert");
        let c = graph.insert_entity(Kind::new("Atom")).expect("insert");
        let ab = graph.create_relation_to(&has_part(), a, b).expect("link");
        let bc = graph.create_relation_to(&has_part(), b, c).expect("link");

        assert!(!graph.remove_relation(a, bc).expect("remove"));
        assert_eq!(graph.incident_relations(a).expect("a"), &[ab]);
    }

    #[test]
    fn relation_liveness_follows_endpoints() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Atom")).expect("insert");
        let r = graph.create_relation_to(&has_part(), a, b).expect("link");

        graph.remove_relation(a, r).expect("remove");
        assert!(graph.is_linked(r).expect("linked"));

        graph.remove_relation(b, r).expect("remove");
        assert!(!graph.is_linked(r).expect("linked"));
        // The record itself survives unregistration.
        assert!(graph.relation(r).is_some());
        assert_eq!(graph.linked_relation_count(), 0);
    }

    #[test]
    fn unlink_relation_clears_both_endpoints() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Atom")).expect("insert");
        let r = graph.create_relation_to(&has_part(), a, b).expect("link");

        assert_eq!(graph.unlink_relation(r).expect("unlink"), 2);
        assert_eq!(graph.unlink_relation(r).expect("unlink"), 0);
        assert!(graph.incident_relations(a).expect("a").is_empty());
        assert!(graph.incident_relations(b).expect("b").is_empty());
    }

    #[test]
    fn cycles_are_permitted() {
        let mut graph = Graph::new();
        let a = graph.insert_entity(Kind::new("Gas")).expect("insert");
        let b = graph.insert_entity(Kind::new("Gas")).expect("insert");

        graph.create_relation_to(&has_part(), a, b).expect("link");
        graph.create_relation_to(&has_part(), b, a).expect("link");

        assert_eq!(graph.incident_relations(a).expect("a").len(), 2);
        assert_eq!(graph.incident_relations(b).expect("b").len(), 2);
    }
}
