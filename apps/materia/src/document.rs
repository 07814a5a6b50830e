//! # Knowledge Documents
//!
//! TOML front end for building a graph without writing Rust.
//!
//! A document lists named entities and the relations between them:
//!
//! ```toml
//! [[entity]]
//! name = "kelvin"
//! kind = "Unit"
//! text = "K"
//!
//! [[entity]]
//! name = "t300"
//! kind = "Scalar"
//! real = 300.0
//!
//! [[entity]]
//! name = "temperature"
//! kind = "Temperature"
//! parts = ["kelvin", "t300"]
//!
//! [[relation]]
//! kind = "hasProperty"
//! from = "state"
//! to = ["temperature"]
//! ```
//!
//! Entries are resolved in file order, so a name must be declared before it
//! is referenced. Every entity goes through `Taxonomy::instantiate`, which
//! means its kind must be registered and its wiring arguments must match.
//!
//! A taxonomy extension file appends kinds to the standard catalogue:
//!
//! ```toml
//! [[kind]]
//! name = "Plasma"
//! parent = "Fluid"
//! ```

use materia_core::{
    Blueprint, EntityId, Graph, GraphError, GraphStore, Kind, KindSpec, Payload, Taxonomy,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum size of a knowledge document or taxonomy file (16 MB).
pub const MAX_DOCUMENT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Validate file path and size before reading.
///
/// Canonicalizes the path so ".." and symlinks are resolved, and refuses
/// anything that is not a regular file.
fn validate_input_file(path: &Path) -> Result<PathBuf, GraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        GraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| GraphError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_DOCUMENT_FILE_SIZE {
        return Err(GraphError::InvalidDocument(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_DOCUMENT_FILE_SIZE
        )));
    }

    Ok(canonical)
}

fn read_input_file(path: &Path) -> Result<String, GraphError> {
    let validated = validate_input_file(path)?;
    std::fs::read_to_string(&validated)
        .map_err(|e| GraphError::IoError(format!("Read file: {}", e)))
}

// =============================================================================
// DOCUMENT SCHEMA
// =============================================================================

/// One `[[entity]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityEntry {
    /// Document-local name, referenced by later entries.
    pub name: String,
    /// Registered kind of the entity.
    pub kind: Kind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub real: Option<f64>,
    #[serde(default)]
    pub reals: Option<Vec<f64>>,
    /// Names of part entities, in wiring order.
    #[serde(default)]
    pub parts: Vec<String>,
    /// Expression text for kinds that attach a text holder.
    #[serde(default)]
    pub expression: Option<String>,
}

impl EntityEntry {
    /// The payload this entry declares, if any. At most one may be set.
    fn payload(&self) -> Result<Option<Payload>, GraphError> {
        let declared = [
            self.text.clone().map(Payload::Text),
            self.real.map(Payload::Real),
            self.reals.clone().map(Payload::Reals),
        ];
        let mut payloads = declared.into_iter().flatten();
        let first = payloads.next();
        if payloads.next().is_some() {
            return Err(GraphError::InvalidDocument(format!(
                "entity '{}' declares more than one of text, real, reals",
                self.name
            )));
        }
        Ok(first)
    }
}

/// One `[[relation]]` entry: `from` is linked to every name in `to`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationEntry {
    pub kind: Kind,
    pub from: String,
    pub to: Vec<String>,
}

/// A parsed knowledge document, not yet resolved against a graph.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeDocument {
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityEntry>,
    #[serde(default, rename = "relation")]
    pub relations: Vec<RelationEntry>,
}

/// A taxonomy extension file: `[[kind]]` entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaxonomyFile {
    #[serde(default, rename = "kind")]
    kinds: Vec<KindSpec>,
}

// =============================================================================
// LOADED DOCUMENT
// =============================================================================

/// A document built into a graph, with its name table.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub graph: Graph,
    names: BTreeMap<String, EntityId>,
    labels: BTreeMap<EntityId, String>,
}

impl LoadedDocument {
    /// The handle behind a document name.
    pub fn resolve(&self, name: &str) -> Result<EntityId, GraphError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::InvalidDocument(format!("unknown entity name '{}'", name)))
    }

    /// Document name of an entity, or its handle for unnamed wiring holders.
    #[must_use]
    pub fn label(&self, id: EntityId) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Named entities in name order.
    pub fn names(&self) -> impl Iterator<Item = (&str, EntityId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl KnowledgeDocument {
    /// Parse a document from TOML text.
    pub fn parse(source: &str) -> Result<Self, GraphError> {
        toml::from_str(source).map_err(|e| GraphError::InvalidDocument(e.to_string()))
    }

    /// Resolve every entry, in file order, into a fresh graph.
    ///
    /// Stops at the first failing entry. Relations already created stay,
    /// matching `create_relations_to`.
    pub fn build(&self, taxonomy: &Taxonomy) -> Result<LoadedDocument, GraphError> {
        let mut doc = LoadedDocument {
            graph: Graph::new(),
            names: BTreeMap::new(),
            labels: BTreeMap::new(),
        };

        for entry in &self.entities {
            if doc.names.contains_key(&entry.name) {
                return Err(GraphError::InvalidDocument(format!(
                    "duplicate entity name '{}'",
                    entry.name
                )));
            }

            let parts = entry
                .parts
                .iter()
                .map(|name| doc.resolve(name))
                .collect::<Result<Vec<_>, _>>()?;

            let mut blueprint = Blueprint::new().parts(parts);
            if let Some(payload) = entry.payload()? {
                blueprint = blueprint.payload(payload);
            }
            if let Some(expression) = &entry.expression {
                blueprint = blueprint.text(expression.clone());
            }

            let id = taxonomy.instantiate(&mut doc.graph, &entry.kind, blueprint)?;
            doc.names.insert(entry.name.clone(), id);
            doc.labels.insert(id, entry.name.clone());
        }

        for entry in &self.relations {
            let from = doc.resolve(&entry.from)?;
            let targets = entry
                .to
                .iter()
                .map(|name| doc.resolve(name))
                .collect::<Result<Vec<_>, _>>()?;
            doc.graph.create_relations_to(&entry.kind, from, &targets)?;
        }

        tracing::debug!(
            entities = doc.graph.entity_count(),
            relations = doc.graph.relation_count(),
            "document built"
        );
        Ok(doc)
    }
}

// =============================================================================
// LOADERS
// =============================================================================

/// Read, parse and build a document file.
pub fn load_document(path: &Path, taxonomy: &Taxonomy) -> Result<LoadedDocument, GraphError> {
    tracing::info!("Loading document {:?}", path);
    KnowledgeDocument::parse(&read_input_file(path)?)?.build(taxonomy)
}

/// Parse `[[kind]]` entries from TOML text.
pub fn parse_taxonomy_extension(source: &str) -> Result<Vec<KindSpec>, GraphError> {
    let file: TaxonomyFile =
        toml::from_str(source).map_err(|e| GraphError::InvalidDocument(e.to_string()))?;
    Ok(file.kinds)
}

/// The standard catalogue, extended by `extension` when given.
pub fn load_taxonomy(extension: Option<&Path>) -> Result<Taxonomy, GraphError> {
    let mut taxonomy = Taxonomy::standard()?;
    if let Some(path) = extension {
        tracing::info!("Extending taxonomy from {:?}", path);
        let specs = parse_taxonomy_extension(&read_input_file(path)?)?;
        taxonomy.extend(specs)?;
    }
    Ok(taxonomy)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_parses() {
        let doc = KnowledgeDocument::parse("").expect("parse");
        assert!(doc.entities.is_empty());
        assert!(doc.relations.is_empty());
    }

    #[test]
    fn unknown_field_rejected() {
        let result = KnowledgeDocument::parse(
            r#"
            [[entity]]
            name = "x"
            kind = "Gas"
            colour = "blue"
            "#,
        );
        assert!(matches!(result, Err(GraphError::InvalidDocument(_))));
    }

    #[test]
    fn two_payloads_rejected() {
        let entry = EntityEntry {
            name: "x".into(),
            kind: "Scalar".into(),
            text: Some("1".into()),
            real: Some(1.0),
            reals: None,
            parts: Vec::new(),
            expression: None,
        };
        assert!(matches!(entry.payload(), Err(GraphError::InvalidDocument(_))));
    }

    #[test]
    fn forward_reference_rejected() {
        let taxonomy = Taxonomy::standard().expect("taxonomy");
        let doc = KnowledgeDocument::parse(
            r#"
            [[entity]]
            name = "p"
            kind = "Pressure"
            parts = ["pa", "v"]
            "#,
        )
        .expect("parse");

        assert!(matches!(
            doc.build(&taxonomy),
            Err(GraphError::InvalidDocument(_))
        ));
    }

    #[test]
    fn extension_specs_parse() {
        let specs = parse_taxonomy_extension(
            r#"
            [[kind]]
            name = "Plasma"
            parent = "Fluid"

            [[kind]]
            name = "Rate"
            parent = "ScalarQuantity"
            "#,
        )
        .expect("parse");

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name.as_str(), "Plasma");
        assert_eq!(specs[1].parent.as_ref().map(|k| k.as_str()), Some("ScalarQuantity"));
    }
}
