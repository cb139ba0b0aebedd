use clap::Parser;
use radixroute::cli::{run_cli, Cli};
use radixroute::logging::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;
    run_cli(cli).await
}
