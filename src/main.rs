use clap::Parser;
use crag_workflow::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Ask(args) => cli::ask::run(args, config_path).await,
        Command::Index(args) => cli::index::run(args, config_path).await,
    }
}
