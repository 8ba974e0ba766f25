//! pfbgraph CLI
//!
//! Loads a PFB export (named by a JSON config with a `path` entry) into
//! vertex/edge tables and:
//! - emits the graph-config document for a query layer (`graph`)
//! - summarizes the loaded tables (`tables`)
//! - writes per-table handoff snapshots for a serving layer (`dump`)

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use pfbgraph_ingest::{load_tables, LoadedTables, LoaderConfig, TableKind, TABLE_SEPARATOR};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "pfbgraph")]
#[command(author, version, about = "Load PFB exports into vertex/edge tables")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the graph-config document (vertices/edges) for the loaded tables.
    Graph {
        /// Loader config JSON (must contain `path`)
        config: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print one line per table: kind, row count, join fields.
    Tables {
        /// Loader config JSON (must contain `path`)
        config: PathBuf,
    },

    /// Write every table (rows + join fields) and `graph.json` into a directory.
    Dump {
        /// Loader config JSON (must contain `path`)
        config: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Graph {
            config,
            out,
            pretty,
        } => cmd_graph(&config, out.as_ref(), pretty),
        Commands::Tables { config } => cmd_tables(&config),
        Commands::Dump { config, out } => cmd_dump(&config, &out),
    }
}

fn load(config_path: &Path) -> Result<(LoaderConfig, LoadedTables)> {
    let config = LoaderConfig::from_path(config_path)?;
    eprintln!("{} {}", "Loading".green().bold(), config.path.display());
    let loaded = load_tables(&config)
        .with_context(|| format!("loading tables from {}", config.path.display()))?;
    Ok((config, loaded))
}

fn cmd_graph(config_path: &Path, out: Option<&PathBuf>, pretty: bool) -> Result<()> {
    let (config, loaded) = load(config_path)?;
    let graph = loaded.graph_config(&config.source);
    let json = if pretty {
        graph.to_json_pretty()?
    } else {
        graph.to_json()?
    };

    match out {
        Some(out) => {
            write_file(out, &json)?;
            eprintln!(
                "  {} {} (vertices={}, edges={})",
                "→".cyan(),
                out.display(),
                graph.vertices.len(),
                graph.edges.len()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_tables(config_path: &Path) -> Result<()> {
    let (_, loaded) = load(config_path)?;

    for table in loaded.catalog.tables() {
        let rows = table.store().len();
        match table.kind() {
            TableKind::Vertex => {
                println!("{:<8} {:<40} rows={}", "vertex".blue(), table.name(), rows);
            }
            TableKind::Edge(_) => {
                let fields = loaded
                    .catalog
                    .edge_fields(table.name())
                    .map(|f| f.iter().cloned().collect::<Vec<_>>().join(","))
                    .unwrap_or_default();
                println!(
                    "{:<8} {:<40} rows={} fields=[{}]",
                    "edge".magenta(),
                    table.name(),
                    rows,
                    fields
                );
            }
        }
    }

    let stats = &loaded.stats;
    println!(
        "records={} vertex_rows={} edge_rows={} skipped_records={} dropped_relations={}",
        stats.records,
        stats.vertex_rows,
        stats.edge_rows,
        stats.skipped_records,
        stats.dropped_relations
    );
    if stats.has_drops() {
        eprintln!(
            "{} {} record(s) and {} relation(s) were dropped (run with -vv for details)",
            "warning:".yellow().bold(),
            stats.skipped_records,
            stats.dropped_relations
        );
    }
    Ok(())
}

fn cmd_dump(config_path: &Path, out: &Path) -> Result<()> {
    let (config, loaded) = load(config_path)?;
    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    let handoffs = loaded.catalog.handoffs();
    for handoff in &handoffs {
        let path = out.join(format!("{}.json", sanitize_file_stem(&handoff.name)));
        write_file(&path, &serde_json::to_string_pretty(handoff)?)?;
    }
    let graph = loaded.graph_config(&config.source);
    write_file(&out.join("graph.json"), &graph.to_json_pretty()?)?;

    eprintln!(
        "  {} {} (tables={})",
        "→".cyan(),
        out.display(),
        handoffs.len()
    );
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

/// Table names may contain the edge separator, which is not portable in file names.
fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for c in name.chars() {
        if c == TABLE_SEPARATOR {
            out.push_str("__");
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}
