//! Index command - builds the vector index from web pages

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Page to index; repeat to index several. Defaults to the configured URLs
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Where to write the index. Defaults to `index.path`
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Fetch, chunk and embed the pages, write the index and print the report
pub async fn run(args: IndexArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::bootstrap(config_path)?;

    let mut ingestion = config.ingestion.clone();
    if !args.urls.is_empty() {
        ingestion = ingestion.with_urls(args.urls);
    }

    let output = args.output.unwrap_or_else(|| config.index.path.clone());
    info!(
        urls = ingestion.urls.len(),
        output = %output.display(),
        "Building vector index"
    );

    let pipeline = crate::build_ingestion_pipeline(&config)?;
    let report = pipeline.run(&ingestion, &output).await?;

    for (url, reason) in &report.failures {
        warn!(url = %url, reason = %reason, "Page was not indexed");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
