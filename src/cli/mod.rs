pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tidings")]
#[command(about = "Watches RSS/Atom feeds and sends a notification for every new article", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Maximum number of concurrent fetches (0-10, overrides the config file)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Poll feeds until interrupted (default)
    Run,
    /// Poll every due feed once and exit
    Once,
    /// Validate the configuration and print a summary
    Check,
}
