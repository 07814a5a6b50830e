//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::document::{LoadedDocument, load_document};
use materia_core::{
    Graph, GraphError, GraphMetrics, Kind, Query, QueryEngine, QueryResult, QueryType, Snapshot,
    Taxonomy, export_snapshot, snapshot_blake3, snapshot_checksum,
};
use std::path::{Path, PathBuf};

/// Validate output path for security.
///
/// The parent directory must exist; it is canonicalized to resolve ".." and
/// symlinks.
fn validate_output_path(path: &Path) -> Result<PathBuf, GraphError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let canonical_parent = parent.canonicalize().map_err(|e| {
        GraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(GraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| GraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// KINDS COMMAND
// =============================================================================

/// List the kind catalogue.
pub fn cmd_kinds(taxonomy: &Taxonomy, json_mode: bool) -> Result<(), GraphError> {
    let mut rows = Vec::with_capacity(taxonomy.len());
    for spec in taxonomy.kinds() {
        let shape = taxonomy.holder_shape(&spec.name)?;
        rows.push((spec, shape));
    }

    if json_mode {
        let output: Vec<_> = rows
            .iter()
            .map(|(spec, shape)| {
                serde_json::json!({
                    "name": spec.name,
                    "parent": spec.parent,
                    "holds": shape,
                    "wiring": spec.wiring,
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(output));
        return Ok(());
    }

    println!("Materia Kind Catalogue ({} kinds)", taxonomy.len());
    println!("======================");
    for (spec, shape) in rows {
        let parent = spec.parent.as_ref().map_or("-", |p| p.as_str());
        let holds = shape.map_or("-", |s| s.name());
        println!("  {:<28} parent: {:<20} holds: {}", spec.name, parent, holds);
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show document metrics.
pub fn cmd_status(
    taxonomy: &Taxonomy,
    file: &Path,
    json_mode: bool,
    verbose: bool,
) -> Result<(), GraphError> {
    let doc = load_document(file, taxonomy)?;
    let metrics = GraphMetrics::from_graph(&doc.graph);

    if json_mode {
        let output = serde_json::json!({
            "document": file.to_string_lossy(),
            "entity_count": metrics.entity_count,
            "relation_count": metrics.relation_count,
            "linked_relation_count": metrics.linked_relation_count,
            "holder_count": metrics.holder_count,
            "max_degree": metrics.max_degree,
            "kinds": metrics.kinds,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Materia Graph Status");
    println!("====================");
    println!("Document: {:?}", file);
    println!();
    println!("Entities:         {}", metrics.entity_count);
    println!("Relations:        {}", metrics.relation_count);
    println!("Linked Relations: {}", metrics.linked_relation_count);
    println!("Value Holders:    {}", metrics.holder_count);
    println!("Max Degree:       {}", metrics.max_degree);

    if verbose {
        println!();
        println!("Kinds:");
        for (kind, count) in &metrics.kinds {
            println!("  {:<28} {}", kind, count);
        }
        println!();
        println!("Named Entities:");
        for (name, id) in doc.names() {
            println!("  {:<28} {}", name, id);
        }
    }

    Ok(())
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Run a query named on the command line against a loaded document.
///
/// `family` is the descendant-inclusive related-objects lookup; every other
/// query type goes through `QueryEngine::execute` with exact kind matching.
pub fn run_query(
    taxonomy: &Taxonomy,
    doc: &LoadedDocument,
    entity: &str,
    query_type: &str,
    kind: &str,
) -> Result<QueryResult, GraphError> {
    let subject = doc.resolve(entity)?;
    let kind = Kind::new(kind);
    if !kind.is_valid() {
        return Err(GraphError::InvalidKind(kind.as_str().to_string()));
    }

    let query_type = match query_type {
        "relations" => QueryType::Relations(kind),
        "last" => QueryType::LastRelation(kind),
        "objects" => QueryType::RelatedObjects(kind),
        "scalars" => QueryType::Scalars(kind),
        "vectors" => QueryType::Vectors(kind),
        "texts" => QueryType::Texts(kind),
        "family" => {
            let related = taxonomy.related_objects_in(&doc.graph, subject, &kind)?;
            return Ok(QueryResult::Entities(related));
        }
        other => {
            return Err(GraphError::SerializationError(format!(
                "Unknown query type: {}. Use: relations, last, objects, family, scalars, vectors, texts",
                other
            )));
        }
    };

    QueryEngine::execute(&doc.graph, &Query::new(subject, query_type))
}

/// Execute a query.
pub fn cmd_query(
    taxonomy: &Taxonomy,
    file: &Path,
    json_mode: bool,
    entity: &str,
    query_type: &str,
    kind: &str,
) -> Result<(), GraphError> {
    let doc = load_document(file, taxonomy)?;
    let result = run_query(taxonomy, &doc, entity, query_type, kind)?;

    if json_mode {
        let value = match &result {
            QueryResult::Entities(ids) => {
                serde_json::json!(ids.iter().map(|id| doc.label(*id)).collect::<Vec<_>>())
            }
            QueryResult::Entity(id) => serde_json::json!(id.map(|id| doc.label(id))),
            QueryResult::Scalars(values) => serde_json::json!(values),
            QueryResult::Vectors(values) => serde_json::json!(values),
            QueryResult::Texts(values) => serde_json::json!(values),
        };
        let output = serde_json::json!({
            "entity": entity,
            "query_type": query_type,
            "kind": kind,
            "count": result.len(),
            "result": value,
        });
        print_json(&output);
        return Ok(());
    }

    println!("{} {} {}:", entity, query_type, kind);
    match &result {
        QueryResult::Entities(ids) => {
            for id in ids {
                println!("  {}", doc.label(*id));
            }
        }
        QueryResult::Entity(Some(id)) => println!("  {}", doc.label(*id)),
        QueryResult::Entity(None) => {}
        QueryResult::Scalars(values) => {
            for value in values {
                println!("  {}", value);
            }
        }
        QueryResult::Vectors(values) => {
            for value in values {
                println!("  {:?}", value);
            }
        }
        QueryResult::Texts(values) => {
            for value in values {
                println!("  {}", value);
            }
        }
    }
    if result.is_empty() {
        println!("  (no matches)");
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Encode a graph in the named export format.
pub fn encode_export(graph: &Graph, format: &str) -> Result<Vec<u8>, GraphError> {
    match format {
        "snapshot" => export_snapshot(graph),
        "json" => serde_json::to_vec_pretty(&Snapshot::from_graph(graph))
            .map_err(|e| GraphError::SerializationError(e.to_string())),
        _ => Err(GraphError::SerializationError(format!(
            "Unknown format: {}. Use: snapshot, json",
            format
        ))),
    }
}

/// Export the document graph.
pub fn cmd_export(
    taxonomy: &Taxonomy,
    file: &Path,
    output: &Path,
    format: &str,
) -> Result<(), GraphError> {
    let validated_output = validate_output_path(output)?;
    let doc = load_document(file, taxonomy)?;

    let data = encode_export(&doc.graph, format)?;
    std::fs::write(&validated_output, &data)
        .map_err(|e| GraphError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(
        bytes = data.len(),
        checksum = snapshot_checksum(&doc.graph),
        "snapshot exported"
    );
    println!("Checksum: {}", snapshot_checksum(&doc.graph));
    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute snapshot checksum and BLAKE3 digest.
pub fn cmd_hash(taxonomy: &Taxonomy, file: &Path, json_mode: bool) -> Result<(), GraphError> {
    let doc = load_document(file, taxonomy)?;
    let checksum = snapshot_checksum(&doc.graph);
    let blake3 = snapshot_blake3(&doc.graph)?;

    if json_mode {
        print_json(&serde_json::json!({
            "checksum": checksum,
            "blake3": blake3,
        }));
        return Ok(());
    }

    println!("Checksum: {}", checksum);
    println!("BLAKE3:   {}", blake3);
    Ok(())
}
