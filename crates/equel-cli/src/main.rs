//! equel CLI
//!
//! Command-line front end for the equel parser: syntax checking with caret
//! diagnostics, AST inspection as JSON, and canonical formatting.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use equel_core::visit::{NodeRef, Visitor, walk};

/// Entity query language tools.
#[derive(Parser)]
#[command(name = "equel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query and report syntax errors.
    Check {
        /// The query text (omit to read from --file).
        query: Option<String>,

        /// Read the query from a file instead.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the parsed AST as JSON.
    Ast {
        /// The query text (omit to read from --file).
        query: Option<String>,

        /// Read the query from a file instead.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Pretty-print the JSON.
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the canonical form of a query.
    Format {
        /// The query text (omit to read from --file).
        query: Option<String>,

        /// Read the query from a file instead.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Counts nodes per variant tag while walking the tree.
struct NodeCounter {
    total: usize,
    parameters: usize,
}

impl Visitor for NodeCounter {
    fn visit(&mut self, node: &NodeRef<'_>) {
        self.total += 1;
        if node.tag() == "parameter" {
            self.parameters += 1;
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Check { query, file } => {
            let source = load_query(query, file)?;
            match equel_core::parse(&source) {
                Ok(parsed) => {
                    let mut counter = NodeCounter {
                        total: 0,
                        parameters: 0,
                    };
                    walk(NodeRef::Query(&parsed.query), &mut counter);
                    info!(
                        "OK: {} nodes, {} parameters",
                        counter.total, counter.parameters
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => {
                    eprint!("{}", failure.error.render(&source));
                    if let Some(partial) = &failure.partial {
                        debug!("partial tree recovered: {}", partial.span);
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Ast {
            query,
            file,
            pretty,
        } => {
            let source = load_query(query, file)?;
            match equel_core::parse(&source) {
                Ok(parsed) => {
                    let json = if pretty {
                        serde_json::to_string_pretty(&parsed.query)?
                    } else {
                        serde_json::to_string(&parsed.query)?
                    };
                    println!("{json}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => {
                    eprint!("{}", failure.error.render(&source));
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Format { query, file } => {
            let source = load_query(query, file)?;
            match equel_core::parse(&source) {
                Ok(parsed) => {
                    println!("{}", equel_core::canonical(&parsed.query));
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => {
                    eprint!("{}", failure.error.render(&source));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Resolves the query text from the positional argument or --file.
fn load_query(query: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    match (query, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => {
            Ok(fs::read_to_string(&path).map(|s| s.trim().to_string())?)
        }
        (None, None) => anyhow::bail!("provide a query argument or --file <PATH>"),
    }
}
