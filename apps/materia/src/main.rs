//! # Materia
//!
//! The command-line front end of the Materia entity-relation graph kernel.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │               apps/materia (THE BINARY)               │
//! │                                                       │
//! │  ┌─────────────┐         ┌──────────────────────┐     │
//! │  │    CLI      │ ──────▶ │  Document Loader     │     │
//! │  │   (clap)    │         │  (toml + serde)      │     │
//! │  └──────┬──────┘         └──────────┬───────────┘     │
//! │         │                           │                 │
//! │         └─────────────┬─────────────┘                 │
//! │                       ▼                               │
//! │               ┌───────────────┐                       │
//! │               │ materia-core  │                       │
//! │               │ (THE KERNEL)  │                       │
//! │               └───────────────┘                       │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! materia kinds
//! materia status -f nitrogen.toml
//! materia query -f nitrogen.toml -e n2 -t objects -k Atom
//! materia export -f nitrogen.toml -o nitrogen.matx
//! ```

use clap::Parser;
use materia::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // MATERIA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("MATERIA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "materia=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Materia startup banner.
fn print_banner() {
    println!(
        r#"
  Materia v{}
  Entities, relations and the quantities between them
"#,
        env!("CARGO_PKG_VERSION")
    );
}
