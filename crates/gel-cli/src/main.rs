//! CLI tool for the gel SQL preprocessor.
//!
//! Expands annotated `.sql` sources into plain SQL and either prints it,
//! writes it to a file, or pipes it into `psql`.

mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gel")]
#[command(about = "SQL preprocessor", long_about = None)]
#[command(version)]
struct Cli {
    /// Log expansion progress (repeat for more detail)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile source files into plain SQL
    #[command(visible_alias = "c")]
    Compile {
        #[command(flatten)]
        expand: ExpandArgs,

        /// Output file (prints to stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Compile source files and pipe the result into psql
    Run {
        #[command(flatten)]
        expand: ExpandArgs,

        /// Database to connect to
        #[arg(long, short, env = "GEL_DATABASE")]
        database: Option<String>,

        /// psql executable
        #[arg(long, env = "GEL_PSQL")]
        psql: Option<String>,

        /// Keep going after a failing statement
        #[arg(long)]
        no_error_stop: bool,
    },
}

/// Flags shared by every command that expands sources.
#[derive(Args, Debug, Clone)]
pub struct ExpandArgs {
    /// Source directory or file (default: current directory)
    pub path: Option<PathBuf>,

    /// Source file extension
    #[arg(long)]
    pub ext: Option<String>,

    /// Per-line expansion trace written to stderr
    #[arg(long, value_enum, default_value = "off")]
    pub trace: TraceFormat,

    /// Only match markers that stand on their own, not inside identifiers
    #[arg(long)]
    pub strict_markers: bool,

    /// Close an open block when the next file starts
    #[arg(long)]
    pub close_at_namespace: bool,
}

/// Available trace outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TraceFormat {
    /// No trace
    Off,
    /// Colored human-readable lines
    Console,
    /// One JSON object per line
    Json,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { expand, output } => commands::compile(&expand, output),
        Commands::Run {
            expand,
            database,
            psql,
            no_error_stop,
        } => commands::run(&expand, database, psql, no_error_stop),
    }
}
