//! # materia-core
//!
//! The entity-relation graph kernel for Materia - THE KERNEL.
//!
//! Domain knowledge (physical and chemical entities, quantities, models) is
//! held as a graph of typed entities joined by typed relations. Callers
//! query an entity by relation kind or by related entity kind, and can
//! unwrap the primitive payload of scalar, vector and text value holders.
//!
//! ## Layers
//!
//! - `types` → handles, kind tags, payloads, entities, relations, errors
//! - `graph` → arena, identity and relation lifecycle (`GraphStore`)
//! - `engine` → kind-filtered queries (`QueryEngine`)
//! - `taxonomy` → the domain catalogue as data, with construction wiring
//! - `export` → deterministic snapshots for verification and hand-off
//!
//! ## Constraints
//!
//! - Synchronous and single-mutator: mutation takes `&mut Graph`
//! - No async, no network, no file I/O
//! - The kernel never hard-codes a kind name

// =============================================================================
// MODULES
// =============================================================================

pub mod engine;
pub mod export;
pub mod graph;
pub mod metrics;
pub mod primitives;
pub mod query;
pub mod taxonomy;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Entity, EntityId, GraphError, Kind, Payload, PayloadShape, Relation, RelationId};

// =============================================================================
// RE-EXPORTS: Kernel
// =============================================================================

pub use engine::QueryEngine;
pub use export::{
    Snapshot, SnapshotHeader, export_snapshot, import_snapshot, snapshot_checksum,
    verify_snapshot,
};
pub use graph::{Graph, GraphStore};
pub use metrics::GraphMetrics;
pub use query::{Query, QueryResult, QueryType};
pub use taxonomy::{Blueprint, HAS_PART, HAS_PROPERTY, KindSpec, Taxonomy, WiringRule};

#[cfg(feature = "crypto-hash")]
pub use export::snapshot_blake3;
