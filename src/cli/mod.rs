//! Command line interface
//!
//! - `ask`: answer one question against the indexed corpus
//! - `index`: fetch, chunk and embed pages into the vector index

pub mod ask;
pub mod index;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Corrective RAG over an indexed corpus with web search fallback
#[derive(Parser)]
#[command(name = "crag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file layered over config/default and config/local
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a question
    Ask(ask::AskArgs),

    /// Build the vector index
    Index(index::IndexArgs),
}

/// Load `.env` and configuration, then install logging
fn bootstrap(config_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load_with(config_path)?;
    logging::init_logging(&config.logging);

    Ok(config)
}
