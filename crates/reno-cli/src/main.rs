mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use reno_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();
    let config = Config::load()?;

    match cli.command {
        cli::Commands::Serve { host, port } => commands::serve::handle(&config, host, port).await,
        cli::Commands::Sanitize {
            text,
            revealed,
            json,
        } => commands::sanitize::handle(&config, &text, revealed, json),
        cli::Commands::Check { text } => commands::sanitize::check(&config, &text),
        cli::Commands::Seed => commands::seed::handle(&config).await,
        cli::Commands::Config(cmd) => commands::config::handle(cmd, &config),
    }
}
