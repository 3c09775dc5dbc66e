use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use quarry::corpus;
use quarry::{EngineConfig, SearchEngine};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the persisted index artifacts
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the lexical index and titles from an enriched corpus JSON file
    ///
    /// Sparse indexing requires an encoder backend and runs through the
    /// library API; see the `SparseEncoder` trait.
    Index {
        /// Path to the enriched corpus (JSON array of documents)
        corpus: PathBuf,
    },
    /// Run a query against the loaded indices
    Search {
        query: String,

        /// Number of results to return (defaults to the engine's top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = EngineConfig::with_data_dir(&cli.data_dir);

    match cli.command {
        Commands::Index { corpus: corpus_path } => {
            let docs = corpus::load_expanded_corpus(&corpus_path)
                .with_context(|| format!("reading corpus {}", corpus_path.display()))?;

            let mut engine = SearchEngine::new(config);
            engine
                .build_from_corpus(&docs, 32)
                .context("building indices")?;
            engine.save().context("saving index artifacts")?;

            println!(
                "Indexed {} documents into {}",
                docs.len(),
                cli.data_dir.display()
            );
        }
        Commands::Search { query, top_k } => {
            let mut engine = SearchEngine::new(config);
            if !engine.load().context("loading index artifacts")? {
                bail!(
                    "no index artifacts in {}; run `quarry index` first",
                    cli.data_dir.display()
                );
            }

            let k = top_k.unwrap_or(engine.config().top_k);
            let results = engine.hybrid_search(&query, k);
            if results.is_empty() {
                println!("No results.");
            }
            for (rank, (doc_id, score)) in results.iter().enumerate() {
                let title = engine.title(doc_id).unwrap_or("(untitled)");
                println!("{:>3}. {:<16} {:>8.4}  {}", rank + 1, doc_id, score, title);
            }
        }
    }

    Ok(())
}
