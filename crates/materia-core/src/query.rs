//! # Query Module
//!
//! Structured query types for kernel interaction.
//!
//! - Describe a kind-filtered lookup on one entity as data
//! - Carry the result back in a shape-specific variant
//! - Execution lives in `QueryEngine`

use crate::{EntityId, Kind};
use serde::{Deserialize, Serialize};

/// Query operations supported by the kernel.
///
/// Every operation scans the subject's own incident relations and looks at
/// most one hop away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "kind", rename_all = "snake_case")]
pub enum QueryType {
    /// Opposite endpoints of every incident relation of this relation kind.
    Relations(Kind),

    /// Opposite endpoint of the last incident relation of this relation kind.
    LastRelation(Kind),

    /// Opposite endpoints whose entity kind is exactly this kind.
    RelatedObjects(Kind),

    /// Real payloads of related holders of this kind.
    Scalars(Kind),

    /// Real-sequence payloads of related holders of this kind.
    Vectors(Kind),

    /// Text payloads of related holders of this kind.
    Texts(Kind),
}

impl QueryType {
    /// The kind this query filters on.
    #[must_use]
    pub fn target(&self) -> &Kind {
        match self {
            QueryType::Relations(k)
            | QueryType::LastRelation(k)
            | QueryType::RelatedObjects(k)
            | QueryType::Scalars(k)
            | QueryType::Vectors(k)
            | QueryType::Texts(k) => k,
        }
    }
}

/// A structured query against one subject entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// The entity whose incident relations are scanned.
    pub subject: EntityId,
    /// The type of query operation.
    pub query_type: QueryType,
}

impl Query {
    /// Create a new query.
    #[must_use]
    pub fn new(subject: EntityId, query_type: QueryType) -> Self {
        Self {
            subject,
            query_type,
        }
    }

    /// Relations helper.
    #[must_use]
    pub fn relations(subject: EntityId, relation: impl Into<Kind>) -> Self {
        Self::new(subject, QueryType::Relations(relation.into()))
    }

    /// Last relation helper.
    #[must_use]
    pub fn last_relation(subject: EntityId, relation: impl Into<Kind>) -> Self {
        Self::new(subject, QueryType::LastRelation(relation.into()))
    }

    /// Related objects helper.
    #[must_use]
    pub fn related_objects(subject: EntityId, kind: impl Into<Kind>) -> Self {
        Self::new(subject, QueryType::RelatedObjects(kind.into()))
    }

    /// Scalars helper.
    #[must_use]
    pub fn scalars(subject: EntityId, kind: impl Into<Kind>) -> Self {
        Self::new(subject, QueryType::Scalars(kind.into()))
    }

    /// Vectors helper.
    #[must_use]
    pub fn vectors(subject: EntityId, kind: impl Into<Kind>) -> Self {
        Self::new(subject, QueryType::Vectors(kind.into()))
    }
}

/// The outcome of an executed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
    Entities(Vec<EntityId>),
    Entity(Option<EntityId>),
    Scalars(Vec<f64>),
    Vectors(Vec<Vec<f64>>),
    Texts(Vec<String>),
}

impl QueryResult {
    /// Number of items in the result.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Entities(v) => v.len(),
            QueryResult::Entity(e) => usize::from(e.is_some()),
            QueryResult::Scalars(v) => v.len(),
            QueryResult::Vectors(v) => v.len(),
            QueryResult::Texts(v) => v.len(),
        }
    }

    /// Whether the query matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
