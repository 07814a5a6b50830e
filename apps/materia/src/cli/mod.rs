//! # Materia CLI Module
//!
//! This module implements the CLI interface for Materia.
//!
//! ## Available Commands
//!
//! - `kinds` - List the registered kind catalogue
//! - `status` - Show metrics of a knowledge document
//! - `query` - Run a kind-filtered query on one entity
//! - `export` - Export a document's graph as a snapshot
//! - `hash` - Compute snapshot checksum and BLAKE3 digest

mod commands;

use clap::{Parser, Subcommand};
use materia_core::GraphError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Materia - entity-relation knowledge graph
///
/// Loads a TOML knowledge document into the graph kernel and answers
/// kind-filtered queries about its entities.
#[derive(Parser, Debug)]
#[command(name = "materia")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML file of extra `[[kind]]` entries appended to the standard catalogue
    #[arg(short = 'T', long, global = true)]
    pub taxonomy: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered kinds with parent and payload shape
    Kinds,

    /// Show document metrics
    Status {
        /// Knowledge document (TOML)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Execute a kind-filtered query on one entity
    Query {
        /// Knowledge document (TOML)
        #[arg(short, long)]
        file: PathBuf,

        /// Document name of the subject entity
        #[arg(short, long)]
        entity: String,

        /// Query type (relations, last, objects, family, scalars, vectors, texts)
        #[arg(short = 't', long)]
        query_type: String,

        /// Relation kind or entity kind to filter on
        #[arg(short, long)]
        kind: String,
    },

    /// Export the document graph
    Export {
        /// Knowledge document (TOML)
        #[arg(short, long)]
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (snapshot, json)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Compute snapshot checksum and BLAKE3 hash of the document graph
    Hash {
        /// Knowledge document (TOML)
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), GraphError> {
    let taxonomy = crate::document::load_taxonomy(cli.taxonomy.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Status { file }) => cmd_status(&taxonomy, &file, json_mode, cli.verbose),
        Some(Commands::Query {
            file,
            entity,
            query_type,
            kind,
        }) => cmd_query(&taxonomy, &file, json_mode, &entity, &query_type, &kind),
        Some(Commands::Export {
            file,
            output,
            format,
        }) => cmd_export(&taxonomy, &file, &output, &format),
        Some(Commands::Hash { file }) => cmd_hash(&taxonomy, &file, json_mode),
        Some(Commands::Kinds) | None => {
            // No subcommand - list the catalogue by default
            cmd_kinds(&taxonomy, json_mode)
        }
    }
}
