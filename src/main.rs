use clap::Parser;
use sheets_refresh::cli::{self, Cli};
use sheets_refresh::utils::init_logging;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli::load_config(&cli)?;
    init_logging(&config.logging.level, config.logging.json)?;
    debug!("Credentials file: {}", config.credentials.file.display());

    cli::run(&cli.command, &config).await?;
    Ok(())
}
