//! # Kernel Constants
//!
//! Fixed format and limit constants for Materia.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Magic bytes for the snapshot format.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"MATX";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Maximum number of entities accepted by a snapshot import.
///
/// Checked against the header before the body is decoded.
pub const MAX_IMPORT_ENTITY_COUNT: u64 = 1_000_000;

/// Maximum number of relations accepted by a snapshot import.
pub const MAX_IMPORT_RELATION_COUNT: u64 = 10_000_000;

/// FNV-1a 64-bit offset basis, the seed of the snapshot checksum.
pub const CHECKSUM_SEED: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
pub const CHECKSUM_PRIME: u64 = 0x0000_0100_0000_01b3;
