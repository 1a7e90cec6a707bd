use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reno")]
#[command(about = "Anonymous renovation marketplace", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the chat sanitizer over a message
    Sanitize {
        /// Message text
        text: String,

        /// Treat the match as revealed (no filtering)
        #[arg(long)]
        revealed: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report whether a message contains personal information
    Check {
        /// Message text
        text: String,
    },

    /// Insert demo users and contractors
    Seed,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}
