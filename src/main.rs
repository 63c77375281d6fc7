use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tidings::app::AppContext;
use tidings::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(&cli.config, cli.jobs)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // RUST_LOG wins over the config file's debug flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.debug {
            "tidings=debug"
        } else {
            "tidings=info"
        })
    });
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let ctx = AppContext::new(config).context("Failed to initialize")?;
            commands::run(&ctx).await?;
        }
        Commands::Once => {
            let ctx = AppContext::new(config).context("Failed to initialize")?;
            commands::once(&ctx).await?;
        }
        Commands::Check => {
            commands::check(&config)?;
        }
    }

    Ok(())
}
