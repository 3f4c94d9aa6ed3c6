use anyhow::Result;
use clap::Parser;

use readahead::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.init_tracing();
    cli::run(cli).await
}
