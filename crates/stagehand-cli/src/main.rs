//! Stagehand CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Describe deployment topologies and their pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a topology configuration
    Validate {
        /// Path to the configuration file
        #[arg(env = "STAGEHAND_CONFIG", default_value = "stagehand.kdl")]
        path: PathBuf,
    },
    /// Print the assembled topology as a JSON manifest
    Synth {
        /// Path to the configuration file
        #[arg(env = "STAGEHAND_CONFIG", default_value = "stagehand.kdl")]
        path: PathBuf,
        /// Emit single-line JSON
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so manifests on stdout stay parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
        Commands::Synth { path, compact } => {
            commands::synth(&path, compact)?;
        }
    }

    Ok(())
}
