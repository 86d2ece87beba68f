//! TileForge CLI - Command-line interface
//!
//! This binary provides a command-line interface to the TileForge library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "tileforge")]
#[command(version = tileforge::VERSION)]
#[command(about = "Render map tiles through a two-tier cache", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tileforge/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the tiles around a centre tile
    Render(RenderArgs),

    /// Manage the durable tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Render(args) => commands::render::run(args, config_path),
        Commands::Cache { action } => commands::cache::run(action, config_path),
        Commands::Config { command } => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
