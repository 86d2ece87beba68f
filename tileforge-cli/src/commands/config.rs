//! Configuration management CLI commands.

use clap::Subcommand;
use std::path::Path;
use tileforge::config::{ConfigFile, ConfigFileError};

use super::load_config;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(config_path, force),
        ConfigCommands::Show => run_show(config_path),
    }
}

fn run_init(config_path: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = ConfigFile::resolve_path(config_path);

    match ConfigFile::default().write(&path, force) {
        Ok(()) => {
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Err(ConfigFileError::AlreadyExists(path)) => {
            println!("Configuration already exists: {}", path.display());
            println!("Use --force to overwrite it with the defaults.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let source = ConfigFile::resolve_path(config_path);

    println!("Configuration: {}", source.display());
    println!();
    println!("[cache]");
    println!("  memory_capacity = {}", config.cache.memory_capacity);
    println!("  disk_capacity   = {}", config.cache.disk_capacity);
    println!("  directory       = {}", config.cache.directory.display());
    println!("  persistent      = {}", config.cache.persistent);
    println!("[workers]");
    println!("  count           = {}", config.workers.count);
    println!("  idle_wait_ms    = {}", config.workers.idle_wait_ms);
    println!("[render]");
    println!("  theme           = {}", config.render.theme);
    println!("  text_scale      = {}", config.render.text_scale);
    println!("[logging]");
    println!("  file            = {}", config.logging.file.display());
    Ok(())
}
