use anyhow::Result;
use clap::Parser;
use pricealert_cli::cli::Cli;
use pricealert_core::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    cli.run(settings).await?;

    Ok(())
}
