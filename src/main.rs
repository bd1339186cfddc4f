use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docsearch::config::{load_config, Config};
use docsearch::{ingest, search, snapshot};

#[derive(Parser)]
#[command(name = "docsearch", version, about = "Chunk rendered documentation pages and search them semantically")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "./config/docsearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the docs tree, chunk every page, embed, and rebuild the index.
    Index {
        /// Run the chunking pipeline and report counts without touching
        /// the embedding API or the index.
        #[arg(long)]
        dry_run: bool,
        /// Only process the first N pages.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Semantic search over the indexed chunks.
    Search {
        /// The query text.
        query: String,
        /// Number of results to return.
        #[arg(long, default_value_t = 10)]
        top_k: usize,
        /// Restrict results to these doc types (repeatable).
        #[arg(long = "doc-type")]
        doc_types: Vec<String>,
        /// Restrict results to these chunk kinds: text, code (repeatable).
        #[arg(long = "kind")]
        kinds: Vec<String>,
    },
    /// Export the index to a JSON snapshot.
    Export {
        /// Snapshot file path (defaults to [snapshot] path).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Rebuild the index from a JSON snapshot.
    Import {
        /// Snapshot file path (defaults to [snapshot] path).
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing config file falls back to defaults; a present but
    // invalid one is an error.
    let config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        Config::minimal()
    };

    match cli.command {
        Commands::Index { dry_run, limit } => ingest::run_index(&config, dry_run, limit).await,
        Commands::Search {
            query,
            top_k,
            doc_types,
            kinds,
        } => search::run_search(&config, &query, top_k, doc_types, kinds).await,
        Commands::Export { output } => snapshot::run_export(&config, output.as_deref()).await,
        Commands::Import { input } => snapshot::run_import(&config, input.as_deref()).await,
    }
}
