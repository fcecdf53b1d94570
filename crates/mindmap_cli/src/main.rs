//! Mind map command line probe.
//!
//! Reads an exported record collection, runs normalize, resolve, build and
//! layout, and prints the result as JSON. Performs no network I/O.
//!
//! # Usage
//!
//! ```bash
//! # Hierarchical layout of a problems export
//! mindmap layout --input problems.json
//!
//! # Objectives roadmap with related problems from a second export
//! mindmap layout --input objectives.json --collection objectives \
//!     --kind temporal --related problems.json
//!
//! # Tree only, rooted at a known record
//! mindmap tree --input problems.json --root 269c2345-ab46-819c-9b6c-e2eda20aba4c
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use mindmap_core::{
    init_logging, open_db, parse_records_json, CollectionKind, InMemoryPageCache, LayoutConfig,
    LayoutKind, MapService, NodeMap, PageCache, ServiceConfig, SqlitePageCache,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mindmap")]
#[command(version)]
#[command(about = "Lay out exported workspace records as a mind map")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// Absolute directory for rolling log files; logging is off when absent
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// SQLite file used as page cache instead of process memory
    #[arg(long, global = true)]
    cache_db: Option<PathBuf>,

    /// Cache entry lifetime in seconds
    #[arg(long, global = true)]
    cache_ttl_secs: Option<u64>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the tree and print it
    Tree(SourceArgs),
    /// Build the tree, lay it out and print positioned nodes and edges
    Layout {
        #[command(flatten)]
        source: SourceArgs,

        /// Layout engine: hierarchical, radial, temporal or quadrant
        #[arg(short, long)]
        kind: Option<LayoutKind>,

        /// Layout config JSON file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Collapsed node ids, comma separated
        #[arg(long, value_delimiter = ',')]
        collapse: Vec<String>,

        /// Problems export whose referenced records join an objectives roadmap
        #[arg(long)]
        related: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Record export: an array of records, a query page or an array of pages
    #[arg(short, long)]
    input: PathBuf,

    /// Source collection: problems, objectives or other
    #[arg(short, long, default_value = "problems")]
    collection: CollectionKind,

    /// Root record id; falls back to root detection when absent or unknown
    #[arg(long)]
    root: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        init_logging(&cli.log_level, log_dir)
            .map_err(|err| anyhow!("failed to start logging: {err}"))?;
    }

    let config = ServiceConfig {
        cache_ttl_secs: cli.cache_ttl_secs,
        ..ServiceConfig::default()
    };

    match &cli.cache_db {
        Some(path) => {
            let conn = open_db(path)
                .with_context(|| format!("failed to open cache database {}", path.display()))?;
            let service = MapService::new(SqlitePageCache::new(&conn), config)?;
            run(&cli, &service)
        }
        None => {
            let service = MapService::new(InMemoryPageCache::new(), config)?;
            run(&cli, &service)
        }
    }
}

fn run<C: PageCache>(cli: &Cli, service: &MapService<C>) -> Result<()> {
    match &cli.command {
        Commands::Tree(source) => {
            let nodes = ingest_file(service, source.collection, &source.input)?;
            let tree = service.tree(source.collection, &nodes, source.root.as_deref());
            print(cli.format, &tree)
        }
        Commands::Layout {
            source,
            kind,
            config,
            collapse,
            related,
        } => {
            let nodes = ingest_file(service, source.collection, &source.input)?;
            let tree = service.tree(source.collection, &nodes, source.root.as_deref());

            let mut layout_config = match config {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    LayoutConfig::from_json(&text)
                        .with_context(|| format!("invalid layout config {}", path.display()))?
                }
                None => LayoutConfig::default(),
            };
            if let Some(kind) = kind {
                layout_config.layout = *kind;
            }
            layout_config = layout_config.with_collapsed(collapse);

            let referenced = related_nodes(service, &nodes, related.as_deref())?;
            let result = service.layout(&tree, layout_config, referenced.as_ref())?;
            info!(
                "event=cli_layout module=cli status=ok nodes={} edges={} diagnostics={}",
                result.nodes.len(),
                result.edges.len(),
                result.diagnostics.len()
            );
            print(cli.format, &result)
        }
    }
}

fn ingest_file<C: PageCache>(
    service: &MapService<C>,
    collection: CollectionKind,
    path: &Path,
) -> Result<NodeMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_records_json(&text)
        .with_context(|| format!("failed to decode records in {}", path.display()))?;
    Ok(service.ingest(collection, &records)?)
}

/// Problems referenced by `primary`, from an explicit export or the cache.
fn related_nodes<C: PageCache>(
    service: &MapService<C>,
    primary: &NodeMap,
    related: Option<&Path>,
) -> Result<Option<NodeMap>> {
    if let Some(path) = related {
        ingest_file(service, CollectionKind::Problems, path)?;
    }
    let nodes = service.related_nodes(primary)?;
    Ok((!nodes.is_empty()).then_some(nodes))
}

fn print<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
    };
    println!("{text}");
    Ok(())
}
