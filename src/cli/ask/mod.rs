//! Ask command - runs one question through the CRAG pipeline

use std::path::Path;

use clap::Args;
use tracing::info;

use crate::domain::CragRequest;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to answer
    pub question: String,

    /// Pretty-print the JSON response
    #[arg(long)]
    pub pretty: bool,
}

/// Answer the question and print the response as JSON on stdout
pub async fn run(args: AskArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::bootstrap(config_path)?;
    let pipeline = crate::build_pipeline(&config).await?;

    let response = pipeline.run(CragRequest::new(args.question)).await?;
    info!(
        documents = response.documents.len(),
        searched = response.searched(),
        "Answered question"
    );

    let output = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", output);

    Ok(())
}
