//! # Snapshot Export Module
//!
//! Deterministic, bit-exact snapshots of a graph for verification and for
//! hand-off to formatting or analysis collaborators. This is not a storage
//! engine: there is no incremental write, no transaction, no index.
//!
//! Format:
//! ```text
//! [header_len: u32 LE] [SnapshotHeader (postcard)] [Snapshot (postcard)]
//! ```
//!
//! Entities and relations are sorted by handle. Each entity keeps its
//! incident relations in incidence order, so query results over an imported
//! snapshot match the exported graph exactly.

use crate::graph::{Graph, GraphStore};
use crate::primitives::{
    CHECKSUM_PRIME, CHECKSUM_SEED, MAX_IMPORT_ENTITY_COUNT, MAX_IMPORT_RELATION_COUNT,
    SNAPSHOT_MAGIC, SNAPSHOT_VERSION,
};
use crate::{Entity, EntityId, GraphError, Kind, Payload, Relation, RelationId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// HEADER
// =============================================================================

/// Header for snapshot files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes to identify the format.
    pub magic: [u8; 4],

    /// Format version for compatibility.
    pub version: u8,

    /// Number of entities in the snapshot.
    pub entity_count: u64,

    /// Number of relation records in the snapshot.
    pub relation_count: u64,

    /// Checksum of the body.
    pub checksum: u64,
}

impl SnapshotHeader {
    /// Create a new header with the given counts.
    #[must_use]
    pub fn new(entity_count: u64, relation_count: u64, checksum: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: SNAPSHOT_VERSION,
            entity_count,
            relation_count,
            checksum,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(GraphError::DeserializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(GraphError::DeserializationError(format!(
                "Unsupported snapshot version: {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.entity_count > MAX_IMPORT_ENTITY_COUNT {
            return Err(GraphError::DeserializationError(format!(
                "Entity count {} exceeds maximum allowed {}",
                self.entity_count, MAX_IMPORT_ENTITY_COUNT
            )));
        }
        if self.relation_count > MAX_IMPORT_RELATION_COUNT {
            return Err(GraphError::DeserializationError(format!(
                "Relation count {} exceeds maximum allowed {}",
                self.relation_count, MAX_IMPORT_RELATION_COUNT
            )));
        }
        Ok(())
    }
}

// =============================================================================
// BODY
// =============================================================================

/// An entity in snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotEntity {
    pub id: u64,
    pub kind: String,
    pub payload: Option<Payload>,
    /// Incident relation ids in incidence order.
    pub relations: Vec<u64>,
}

impl From<&Entity> for SnapshotEntity {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id().0,
            kind: entity.class_name().to_string(),
            payload: entity.payload().cloned(),
            relations: entity.relations().iter().map(|r| r.0).collect(),
        }
    }
}

/// A relation in snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotRelation {
    pub id: u64,
    pub kind: String,
    pub first: u64,
    pub second: u64,
}

impl From<&Relation> for SnapshotRelation {
    fn from(relation: &Relation) -> Self {
        Self {
            id: relation.id().0,
            kind: relation.class_name().to_string(),
            first: relation.first().0,
            second: relation.second().0,
        }
    }
}

/// A whole graph in snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Entities sorted by id.
    pub entities: Vec<SnapshotEntity>,

    /// Relation records sorted by id, linked or not.
    pub relations: Vec<SnapshotRelation>,

    pub next_entity_id: u64,
    pub next_relation_id: u64,
}

impl Snapshot {
    /// Capture a graph.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        // Graph iterates its BTreeMaps in handle order already.
        Self {
            entities: graph.entities().map(SnapshotEntity::from).collect(),
            relations: graph.relations().map(SnapshotRelation::from).collect(),
            next_entity_id: graph.next_entity_id(),
            next_relation_id: graph.next_relation_id(),
        }
    }

    /// Rebuild a graph, preserving handles and incidence order.
    ///
    /// Rejects snapshots whose references do not resolve, whose incident
    /// lists name a relation the entity is not an endpoint of, or whose
    /// handles collide with the issue counters.
    pub fn to_graph(&self) -> Result<Graph, GraphError> {
        let mut relations = BTreeMap::new();
        for sr in &self.relations {
            if sr.id >= self.next_relation_id {
                return Err(corrupt(format!("relation r{} beyond id counter", sr.id)));
            }
            let relation = Relation::new(
                RelationId(sr.id),
                checked_kind(&sr.kind)?,
                EntityId(sr.first),
                EntityId(sr.second),
            );
            if relations.insert(relation.id(), relation).is_some() {
                return Err(corrupt(format!("duplicate relation r{}", sr.id)));
            }
        }

        let known: BTreeSet<u64> = self.entities.iter().map(|e| e.id).collect();
        for relation in relations.values() {
            for endpoint in [relation.first(), relation.second()] {
                if !known.contains(&endpoint.0) {
                    return Err(corrupt(format!(
                        "relation {} points at missing entity {}",
                        relation.id(),
                        endpoint
                    )));
                }
            }
        }

        let mut entities = BTreeMap::new();
        for se in &self.entities {
            if se.id >= self.next_entity_id {
                return Err(corrupt(format!("entity e{} beyond id counter", se.id)));
            }
            let id = EntityId(se.id);
            let kind = checked_kind(&se.kind)?;
            let mut entity = match &se.payload {
                Some(payload) => Entity::holder(id, kind, payload.clone()),
                None => Entity::new(id, kind),
            };
            for &rid in &se.relations {
                let rid = RelationId(rid);
                let touches = relations.get(&rid).is_some_and(|r: &Relation| r.touches(id));
                if !touches {
                    return Err(GraphError::NotAnEndpoint(id, rid));
                }
                if !entity.push_relation(rid) {
                    return Err(corrupt(format!("{} lists {} twice", id, rid)));
                }
            }
            if entities.insert(id, entity).is_some() {
                return Err(corrupt(format!("duplicate entity {}", id)));
            }
        }

        Ok(Graph::from_parts(
            entities,
            relations,
            self.next_entity_id,
            self.next_relation_id,
        ))
    }

    /// Compute a deterministic FNV-1a checksum of the body.
    ///
    /// Integer arithmetic only; reals are hashed by their bit pattern.
    ///
    /// # Security Note
    ///
    /// This is **NOT** a cryptographic hash. It detects accidental
    /// corruption. Enable `crypto-hash` for a BLAKE3 digest.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = Fnv::new();

        for entity in &self.entities {
            hasher.u64(entity.id);
            hasher.str(&entity.kind);
            match &entity.payload {
                None => hasher.byte(0),
                Some(Payload::Text(text)) => {
                    hasher.byte(1);
                    hasher.str(text);
                }
                Some(Payload::Real(value)) => {
                    hasher.byte(2);
                    hasher.u64(value.to_bits());
                }
                Some(Payload::Reals(values)) => {
                    hasher.byte(3);
                    hasher.u64(values.len() as u64);
                    for value in values {
                        hasher.u64(value.to_bits());
                    }
                }
            }
            hasher.u64(entity.relations.len() as u64);
            for rid in &entity.relations {
                hasher.u64(*rid);
            }
        }

        for relation in &self.relations {
            hasher.u64(relation.id);
            hasher.str(&relation.kind);
            hasher.u64(relation.first);
            hasher.u64(relation.second);
        }

        hasher.u64(self.next_entity_id);
        hasher.u64(self.next_relation_id);
        hasher.finish()
    }
}

fn corrupt(detail: String) -> GraphError {
    GraphError::DeserializationError(format!("Corrupt snapshot: {}", detail))
}

fn checked_kind(name: &str) -> Result<Kind, GraphError> {
    let kind = Kind::new(name);
    if kind.is_valid() {
        Ok(kind)
    } else {
        Err(GraphError::InvalidKind(name.to_string()))
    }
}

/// FNV-1a accumulator.
struct Fnv(u64);

impl Fnv {
    fn new() -> Self {
        Self(CHECKSUM_SEED)
    }

    fn byte(&mut self, b: u8) {
        self.0 ^= u64::from(b);
        self.0 = self.0.wrapping_mul(CHECKSUM_PRIME);
    }

    fn u64(&mut self, v: u64) {
        for b in v.to_le_bytes() {
            self.byte(b);
        }
    }

    fn str(&mut self, s: &str) {
        self.u64(s.len() as u64);
        for b in s.bytes() {
            self.byte(b);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

// =============================================================================
// EXPORT FUNCTIONS
// =============================================================================

/// Export a graph to snapshot bytes.
pub fn export_snapshot(graph: &Graph) -> Result<Vec<u8>, GraphError> {
    let snapshot = Snapshot::from_graph(graph);
    let header = SnapshotHeader::new(
        snapshot.entities.len() as u64,
        snapshot.relations.len() as u64,
        snapshot.checksum(),
    );

    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| GraphError::SerializationError(format!("Header: {}", e)))?;
    let data_bytes = postcard::to_allocvec(&snapshot)
        .map_err(|e| GraphError::SerializationError(format!("Data: {}", e)))?;

    let mut result = Vec::with_capacity(4 + header_bytes.len() + data_bytes.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&data_bytes);
    Ok(result)
}

/// Import a graph from snapshot bytes.
pub fn import_snapshot(data: &[u8]) -> Result<Graph, GraphError> {
    let (len_bytes, rest) = data
        .split_first_chunk::<4>()
        .ok_or_else(|| GraphError::DeserializationError("Data too short".to_string()))?;
    let header_len = u32::from_le_bytes(*len_bytes) as usize;

    if rest.len() < header_len {
        return Err(GraphError::DeserializationError(
            "Data too short for header".to_string(),
        ));
    }
    let (header_bytes, body) = rest.split_at(header_len);

    let header: SnapshotHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| GraphError::DeserializationError(format!("Header: {}", e)))?;
    // Limits are checked before the body is decoded.
    header.validate()?;

    let snapshot: Snapshot = postcard::from_bytes(body)
        .map_err(|e| GraphError::DeserializationError(format!("Data: {}", e)))?;

    let computed = snapshot.checksum();
    if computed != header.checksum {
        return Err(GraphError::DeserializationError(format!(
            "Checksum mismatch: expected {}, got {}",
            header.checksum, computed
        )));
    }
    if snapshot.entities.len() as u64 != header.entity_count {
        return Err(GraphError::DeserializationError(
            "Entity count mismatch".to_string(),
        ));
    }
    if snapshot.relations.len() as u64 != header.relation_count {
        return Err(GraphError::DeserializationError(
            "Relation count mismatch".to_string(),
        ));
    }

    snapshot.to_graph()
}

/// Check that snapshot bytes describe exactly this graph.
pub fn verify_snapshot(graph: &Graph, data: &[u8]) -> Result<bool, GraphError> {
    let imported = import_snapshot(data)?;
    if graph.entity_count() != imported.entity_count()
        || graph.relation_count() != imported.relation_count()
    {
        return Ok(false);
    }
    Ok(Snapshot::from_graph(graph) == Snapshot::from_graph(&imported))
}

/// Compute the snapshot checksum of a graph.
#[must_use]
pub fn snapshot_checksum(graph: &Graph) -> u64 {
    Snapshot::from_graph(graph).checksum()
}

/// Compute a BLAKE3 hash of the snapshot bytes, as 64 hex characters.
///
/// Only available with the `crypto-hash` feature.
#[cfg(feature = "crypto-hash")]
pub fn snapshot_blake3(graph: &Graph) -> Result<String, GraphError> {
    let data = export_snapshot(graph)?;
    Ok(blake3::hash(&data).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
