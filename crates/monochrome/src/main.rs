//! Monochrome CLI - hosts grayscale pipeline invocations on the local machine.
//!
//! Objects live under a local directory (one subdirectory per bucket) and
//! image records are JSON documents, so an invocation can be replayed from a
//! saved notification without any cloud services.
//!
//! # Usage
//!
//! ```bash
//! # Handle an object-created notification
//! monochrome handle event.json
//!
//! # Process an object directly
//! monochrome process --bucket uploads --key photos/cat.jpg
//!
//! # Inspect an image record
//! monochrome status photos/cat.jpg
//!
//! # View configuration
//! monochrome config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;
mod logging;

/// Monochrome - grayscale conversion and EXIF extraction for uploaded images.
#[derive(Parser, Debug)]
#[command(name = "monochrome")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "MONOCHROME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one invocation from an object-created notification
    Handle(cli::invoke::HandleArgs),

    /// Run one invocation for an explicit bucket and key
    Process(cli::invoke::ProcessArgs),

    /// Show the stored record of an image
    Status(cli::status::StatusArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => monochrome_core::Config::load_from(path)?,
        None => match monochrome_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `monochrome config path`."
                );
                monochrome_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Monochrome v{}", monochrome_core::VERSION);

    match cli.command {
        Commands::Handle(args) => cli::invoke::execute_handle(args, &config).await,
        Commands::Process(args) => cli::invoke::execute_process(args, &config).await,
        Commands::Status(args) => cli::status::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}
