//! # Core Type Definitions
//!
//! This module contains the core types of the Materia graph kernel:
//! - Handles (`EntityId`, `RelationId`)
//! - Kind tags (`Kind`)
//! - Leaf payloads (`Payload`, `PayloadShape`)
//! - Graph elements (`Entity`, `Relation`)
//! - Error types (`GraphError`)
//!
//! ## Ordering Guarantees
//!
//! Handles and kind tags implement `Ord` so they can key `BTreeMap`s and
//! every iteration over the graph is deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// HANDLES
// =============================================================================

/// Stable handle of an entity, valid for the lifetime of its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Stable handle of a relation, valid for the lifetime of its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// =============================================================================
// KIND TAG
// =============================================================================

/// Immutable, human-readable name of an entity or relation kind.
///
/// Examples: `"Scalar"`, `"Pressure"`, `"hasPart"`. The kernel compares kinds
/// by exact name and never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(String);

impl Kind {
    /// Create a kind tag from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the kind tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A kind tag must carry a non-blank name.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// The primitive shape a typed value holder carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadShape {
    /// A UTF-8 string.
    Text,
    /// A single 64-bit float.
    Real,
    /// An ordered sequence of 64-bit floats.
    Reals,
}

impl PayloadShape {
    /// Get the shape name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PayloadShape::Text => "text",
            PayloadShape::Real => "real",
            PayloadShape::Reals => "reals",
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// The immutable payload of a typed value holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Text(String),
    Real(f64),
    Reals(Vec<f64>),
}

impl Payload {
    /// The shape of this payload.
    #[must_use]
    pub fn shape(&self) -> PayloadShape {
        match self {
            Payload::Text(_) => PayloadShape::Text,
            Payload::Real(_) => PayloadShape::Real,
            Payload::Reals(_) => PayloadShape::Reals,
        }
    }

    /// Try to get as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a single real number.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Payload::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as a sequence of real numbers.
    #[must_use]
    pub fn as_reals(&self) -> Option<&[f64]> {
        match self {
            Payload::Reals(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// A node of the knowledge graph.
///
/// An entity owns its identity, its kind tag, an optional payload (set only
/// for typed value holders) and the ordered list of relations it takes part
/// in. The incident list is mutated only through the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: Kind,
    payload: Option<Payload>,
    relations: Vec<RelationId>,
}

impl Entity {
    /// Create an entity with no payload and no relations.
    #[must_use]
    pub fn new(id: EntityId, kind: Kind) -> Self {
        Self {
            id,
            kind,
            payload: None,
            relations: Vec::new(),
        }
    }

    /// Create a typed value holder.
    #[must_use]
    pub fn holder(id: EntityId, kind: Kind, payload: Payload) -> Self {
        Self {
            id,
            kind,
            payload: Some(payload),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The reflection name of this entity's kind.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.kind.as_str()
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Whether this entity is a typed value holder.
    #[must_use]
    pub fn is_holder(&self) -> bool {
        self.payload.is_some()
    }

    /// Incident relations in insertion order.
    #[must_use]
    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }

    /// Check if a relation is listed on this entity.
    #[must_use]
    pub fn has_relation(&self, relation: RelationId) -> bool {
        self.relations.contains(&relation)
    }

    /// Append a relation, keeping each handle listed at most once.
    /// Returns `false` if it was already listed.
    pub(crate) fn push_relation(&mut self, relation: RelationId) -> bool {
        if self.has_relation(relation) {
            return false;
        }
        self.relations.push(relation);
        true
    }

    /// Remove the record equal to `relation`, preserving the order of the rest.
    /// Returns `false` if no record matched.
    pub(crate) fn erase_relation(&mut self, relation: RelationId) -> bool {
        match self.relations.iter().position(|r| *r == relation) {
            Some(index) => {
                self.relations.remove(index);
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// RELATION
// =============================================================================

/// A typed edge connecting exactly two entities.
///
/// Endpoints are fixed at construction. A relation is directed from `first`
/// to `second`; queries treat it as associative and follow it from either end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    id: RelationId,
    kind: Kind,
    first: EntityId,
    second: EntityId,
}

impl Relation {
    /// Create a relation record.
    #[must_use]
    pub fn new(id: RelationId, kind: Kind, first: EntityId, second: EntityId) -> Self {
        Self {
            id,
            kind,
            first,
            second,
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The reflection name of this relation's kind.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.kind.as_str()
    }

    #[must_use]
    pub fn first(&self) -> EntityId {
        self.first
    }

    #[must_use]
    pub fn second(&self) -> EntityId {
        self.second
    }

    /// Check whether `entity` is one of the two endpoints.
    #[must_use]
    pub fn touches(&self, entity: EntityId) -> bool {
        self.first == entity || self.second == entity
    }

    /// Whether both endpoints are the same entity.
    #[must_use]
    pub fn is_self_relation(&self) -> bool {
        self.first == self.second
    }

    /// The endpoint opposite to `entity`, or `None` if `entity` is not an endpoint.
    ///
    /// For a self-relation the opposite endpoint is the entity itself.
    #[must_use]
    pub fn opposite(&self, entity: EntityId) -> Option<EntityId> {
        if self.first == entity {
            Some(self.second)
        } else if self.second == entity {
            Some(self.first)
        } else {
            None
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Materia kernel and its adapters.
///
/// Zero query matches and removal of an absent relation are NOT errors.
/// Errors are reserved for unknown handles and structural misuse.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The requested entity does not exist in the graph.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The requested relation does not exist in the graph.
    #[error("Relation not found: {0}")]
    RelationNotFound(RelationId),

    /// The entity is not one of the relation's endpoints.
    #[error("Entity {0} is not an endpoint of relation {1}")]
    NotAnEndpoint(EntityId, RelationId),

    /// A kind tag is blank.
    #[error("Invalid kind tag: {0:?}")]
    InvalidKind(String),

    /// The kind is not registered in the taxonomy.
    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    /// A kind with this name is already registered.
    #[error("Kind already registered: {0}")]
    KindAlreadyRegistered(String),

    /// The payload given to a value holder does not fit its kind.
    #[error("Payload mismatch for {kind}: expected {expected}, found {found}")]
    PayloadMismatch {
        kind: String,
        expected: String,
        found: String,
    },

    /// A wiring rule received the wrong number of arguments.
    #[error("Wiring of {kind} expects {expected} argument(s), found {found}")]
    WiringArity {
        kind: String,
        expected: usize,
        found: usize,
    },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A knowledge document could not be resolved into a graph.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

// =============================================================================
// TESTS
// =============================================================================
