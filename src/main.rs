//! CLI entry point.
//!
//! `blinkctl run` starts the pipeline and blocks until Ctrl-C;
//! `blinkctl check-config` validates a configuration file without binding
//! any sockets. Startup errors exit non-zero with a diagnostic.

use anyhow::Result;
use blinkctl::app::App;
use blinkctl::config::Config;
use blinkctl::tracing_setup;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "blinkctl")]
#[command(about = "EEG blink-to-command control pipeline", long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config/blinkctl.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pipeline and run until interrupted.
    Run,

    /// Validate the configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config)?;

    match cli.command {
        Commands::Run => {
            tracing_setup::init(&config.application)?;
            let app = App::start(&config).await?;
            app.run_until_signal().await?;
        }
        Commands::CheckConfig => {
            println!("configuration ok: {}", cli.config.display());
        }
    }
    Ok(())
}
