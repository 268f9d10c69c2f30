use anyhow::Context;
use clap::Parser;
use minidb_core::Database;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod command;
mod render;
mod repl;

/// Interactive command-line table manager.
#[derive(Debug, Parser)]
#[command(name = "minidb", version, about)]
struct Cli {
    /// Directory holding the table metadata and row files.
    #[arg(long, default_value = "minidb_data")]
    data_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut db = Database::open(&cli.data_dir)
        .with_context(|| format!("opening database at {}", cli.data_dir.display()))?;

    repl::run(&mut db)
}
